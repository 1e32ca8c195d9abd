//! Unit tests for vulkan_frame.rs

use super::*;

#[test]
fn test_draw_stride_matches_vulkan_command() {
    // VkDrawMeshTasksIndirectCommandEXT is three u32 group counts
    assert_eq!(DRAW_COMMAND_STRIDE, 12);
}

#[test]
fn test_clear_color_is_opaque_black() {
    assert_eq!(CLEAR_COLOR, [0.0, 0.0, 0.0, 1.0]);
}
