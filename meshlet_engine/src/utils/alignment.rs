/// Per-frame addressing inside persistently mapped buffers.
///
/// Every per-frame region (camera, frustum, transforms, boxes, counter) is
/// stored `MAX_FRAMES_IN_FLIGHT` times back to back in one buffer. Each copy
/// starts on a multiple of the device's minimum buffer-offset alignment, so
/// the stride between copies is the logical size rounded up to that alignment.

/// Number of frames the CPU may prepare while the GPU is still busy.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Round `size` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two (Vulkan guarantees this for every
/// `min*OffsetAlignment` limit). An alignment of 0 leaves `size` untouched.
pub fn aligned_struct_size(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    debug_assert!(alignment.is_power_of_two(), "alignment {} is not a power of two", alignment);
    (size + alignment - 1) & !(alignment - 1)
}

/// Padding inserted after a region of `size` bytes to reach the next aligned offset.
pub fn inbetween_alignment_space(size: u64, alignment: u64) -> u64 {
    aligned_struct_size(size, alignment) - size
}

/// Layout of one logical region replicated once per frame slot.
///
/// # Example
///
/// ```
/// use meshlet_engine::meshlet3d::utils::FrameRegion;
///
/// let region = FrameRegion::new(100, 256, 2);
/// assert_eq!(region.stride(), 256);
/// assert_eq!(region.offset(1), 256);
/// assert_eq!(region.total_size(), 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRegion {
    size: u64,
    stride: u64,
    frames: usize,
}

impl FrameRegion {
    pub fn new(size: u64, alignment: u64, frames: usize) -> Self {
        Self {
            size,
            stride: aligned_struct_size(size, alignment),
            frames,
        }
    }

    /// Logical (unpadded) size of one frame's data
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Distance in bytes between two consecutive frame copies
    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Byte offset of `frame`'s copy from the start of the buffer
    pub fn offset(&self, frame: usize) -> u64 {
        debug_assert!(frame < self.frames, "frame {} out of {}", frame, self.frames);
        self.stride * frame as u64
    }

    /// Bytes the backing buffer must hold for every frame copy
    pub fn total_size(&self) -> u64 {
        self.stride * self.frames as u64
    }

    /// Address of `frame`'s copy given the mapped base address.
    ///
    /// Only computes an address; dereferencing it is the caller's business.
    pub fn slot_ptr(&self, base: *mut u8, frame: usize) -> *mut u8 {
        base.wrapping_add(self.offset(frame) as usize)
    }
}

#[cfg(test)]
#[path = "alignment_tests.rs"]
mod tests;
