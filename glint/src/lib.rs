//! Host side of Glint: loads the compiled shaders, allocates GI buffers and
//! records the dispatch-sizing and validation passes.
//!
//! See [`cpu`] for a reference implementation of both passes that runs on the
//! host machine.

mod buffers;
pub mod cpu;
mod config;
mod error;
mod gi_controller;
mod shaders;

use std::path::Path;

pub use glint_gpu as gpu;
use log::info;
use spirv_std::glam::UVec2;

pub use self::buffers::*;
pub use self::config::*;
pub use self::error::*;
pub use self::gi_controller::*;
pub(crate) use self::shaders::*;

#[derive(Debug)]
pub struct Engine {
    shaders: Shaders,
}

impl Engine {
    /// Features the device must be created with.
    pub const FEATURES: wgpu::Features = wgpu::Features::PUSH_CONSTANTS;

    /// Limits the device must be created with.
    pub fn limits() -> wgpu::Limits {
        wgpu::Limits {
            max_push_constant_size: 128,
            ..Default::default()
        }
    }

    /// Creates the engine, loading shaders compiled by `glint-shader-builder`
    /// from given directory.
    pub fn new(
        device: &wgpu::Device,
        shaders_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let shaders_dir = shaders_dir.as_ref();

        info!("Initializing; shaders_dir={}", shaders_dir.display());

        Ok(Self {
            shaders: Shaders::new(device, shaders_dir)?,
        })
    }

    pub fn create_gi(
        &self,
        device: &wgpu::Device,
        config: GiConfig,
        screen_size: UVec2,
    ) -> GiController {
        GiController::new(self, device, config, screen_size)
    }
}
