//! Common structs, algorithms etc. used by Glint's shaders and host.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::manual_range_contains)]

mod counts;
mod dispatch;
mod frame;
mod gi_history;
mod gi_validation;
mod noise;
mod passes;
mod ray;
mod tracer;
mod utils;

pub use self::counts::*;
pub use self::dispatch::*;
pub use self::frame::*;
pub use self::gi_history::*;
pub use self::gi_validation::*;
pub use self::noise::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::tracer::*;
pub use self::utils::*;

pub mod prelude {
    pub use spirv_std::arch::IndexUnchecked;
    pub use spirv_std::glam::*;
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::num_traits::Float;
    pub use spirv_std::spirv;

    pub use crate::*;
}

/// Floor used for divisions whose denominator is a sum of radiances or
/// distances; keeps NaNs and infinities out of the cache.
pub const GLINT_EPSILON: f32 = 0.001;
