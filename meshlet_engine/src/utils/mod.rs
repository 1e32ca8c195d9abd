//! Small helpers shared by the core and the backend.

mod alignment;

pub use alignment::{aligned_struct_size, inbetween_alignment_space, FrameRegion, MAX_FRAMES_IN_FLIGHT};
