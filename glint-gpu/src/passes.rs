use bytemuck::{Pod, Zeroable};
use spirv_std::glam::{uvec2, UVec2};

use crate::Frame;

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GiDispatchSizingPassParams {
    pub flags: u32,
}

impl GiDispatchSizingPassParams {
    const FLAG_CELL_CLEARING: u32 = 1;

    pub fn new(cell_clearing: bool) -> Self {
        Self {
            flags: if cell_clearing {
                Self::FLAG_CELL_CLEARING
            } else {
                0
            },
        }
    }

    pub fn is_cell_clearing(self) -> bool {
        self.flags & Self::FLAG_CELL_CLEARING > 0
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GiValidationPassParams {
    pub frame: Frame,
    pub flags: u32,

    /// Size of the primary (depth) buffer, in pixels.
    pub screen_width: u32,
    pub screen_height: u32,
}

impl GiValidationPassParams {
    const FLAG_VALIDATION: u32 = 1;
    const FLAG_HALF_RES: u32 = 2;

    pub fn new(
        frame: Frame,
        validation: bool,
        half_res: bool,
        screen_size: UVec2,
    ) -> Self {
        let mut flags = 0;

        if validation {
            flags |= Self::FLAG_VALIDATION;
        }

        if half_res {
            flags |= Self::FLAG_HALF_RES;
        }

        Self {
            frame,
            flags,
            screen_width: screen_size.x,
            screen_height: screen_size.y,
        }
    }

    pub fn is_validation_enabled(self) -> bool {
        self.flags & Self::FLAG_VALIDATION > 0
    }

    pub fn is_half_res(self) -> bool {
        self.flags & Self::FLAG_HALF_RES > 0
    }

    /// Returns whether this frame should re-trace cached samples.
    pub fn is_validation_frame(self) -> bool {
        self.is_validation_enabled() && self.frame.is_gi_validation()
    }

    pub fn screen_size(self) -> UVec2 {
        uvec2(self.screen_width, self.screen_height)
    }

    /// Size of the GI buffers (history, invalidity map), in pixels.
    pub fn gi_size(self) -> UVec2 {
        if self.is_half_res() {
            (self.screen_size() + 1) / 2
        } else {
            self.screen_size()
        }
    }

    pub fn gi_to_idx(self, gi_pos: UVec2) -> usize {
        (gi_pos.y * self.gi_size().x + gi_pos.x) as usize
    }

    pub fn screen_to_idx(self, screen_pos: UVec2) -> usize {
        (screen_pos.y * self.screen_width + screen_pos.x) as usize
    }

    /// Returns whether given GI pixel lays inside the GI buffers.
    pub fn contains(self, gi_pos: UVec2) -> bool {
        let gi_size = self.gi_size();

        gi_pos.x < gi_size.x && gi_pos.y < gi_size.y
    }
}
