use spirv_std::glam::UVec2;

use crate::Frame;

/// PCG-based white noise, seeded per pixel.
#[derive(Copy, Clone)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct WhiteNoise {
    state: u32,
}

impl WhiteNoise {
    pub fn new(seed: u32, id: UVec2) -> Self {
        Self {
            state: seed
                ^ 48619u32.wrapping_mul(id.x)
                ^ 95461u32.wrapping_mul(id.y),
        }
    }

    /// Creates noise used to re-trace the cached sample at given pixel.
    ///
    /// Deterministic for a given `(frame, id)` pair, but different across
    /// frames, so that consecutive validations don't repeat the same pattern.
    pub fn for_validation(frame: Frame, id: UVec2) -> Self {
        Self::new(frame.get().wrapping_mul(0x9e3779b9), id)
    }

    /// Resumes noise from a state saved with [`Self::state()`], e.g. by a
    /// pass that hands the seed over to another pass.
    pub fn from_state(state: u32) -> Self {
        Self { state }
    }

    pub fn state(self) -> u32 {
        self.state
    }

    /// Generates a uniform sample in range `<0, u32::MAX>`.
    pub fn sample_int(&mut self) -> u32 {
        self.state =
            self.state.wrapping_mul(747796405).wrapping_add(2891336453);

        let word = ((self.state >> ((self.state >> 28) + 4)) ^ self.state)
            .wrapping_mul(277803737);

        (word >> 22) ^ word
    }
}
