//! Instance culling: the CPU statement of what the compute pass computes.
//!
//! The GPU writes one command and one id per surviving instance at the slot
//! returned by an atomic counter, so its survivor order is unspecified.
//! Here the loop is sequential and survivors keep instance order.

mod cull;

pub use cull::{cull_instances, task_group_count, CullOutput};
