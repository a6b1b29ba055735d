use spirv_std::glam::UVec2;

use crate::gpu;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GiConfig {
    /// Whether cached GI samples should get periodically re-traced to check
    /// how stale they are.
    pub validation: bool,

    /// Whether the cell-clearing dispatch should get sized; when disabled, its
    /// dispatch-args slot is zeroed every frame.
    pub cell_clearing: bool,

    pub resolution: GiResolution,
}

impl GiConfig {
    /// Returns whether changing config from `self` to `new` requires
    /// reallocating GI buffers.
    pub fn is_invalidated_by(&self, new: &Self) -> bool {
        self.resolution != new.resolution
    }

    pub fn dispatch_sizing_params(&self) -> gpu::GiDispatchSizingPassParams {
        gpu::GiDispatchSizingPassParams::new(self.cell_clearing)
    }

    pub fn validation_params(
        &self,
        frame: gpu::Frame,
        screen_size: UVec2,
    ) -> gpu::GiValidationPassParams {
        gpu::GiValidationPassParams::new(
            frame,
            self.validation,
            self.resolution == GiResolution::Half,
            screen_size,
        )
    }

    pub fn describe(&self) -> String {
        format!(
            "validation={}, cell_clearing={}, resolution={:?}",
            self.validation, self.cell_clearing, self.resolution
        )
    }
}

impl Default for GiConfig {
    fn default() -> Self {
        Self {
            validation: true,
            cell_clearing: false,
            resolution: GiResolution::Half,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GiResolution {
    Full,

    /// GI buffers have half the width and height of the screen; validation
    /// rotates through the four covered pixels frame by frame.
    #[default]
    Half,
}
