mod buffers;
mod pass;
mod passes;

use log::{debug, info, trace};
use spirv_std::glam::UVec2;

pub use self::buffers::*;
pub use self::pass::*;
pub use self::passes::*;
use crate::{gpu, Engine, GiConfig};

/// Owns GI buffers and passes for a single viewport, together with the frame
/// counter that drives validation cadence.
#[derive(Debug)]
pub struct GiController {
    config: GiConfig,
    screen_size: UVec2,
    buffers: GiBuffers,
    passes: GiPasses,
    frame: gpu::Frame,
}

impl GiController {
    pub(crate) fn new(
        engine: &Engine,
        device: &wgpu::Device,
        config: GiConfig,
        screen_size: UVec2,
    ) -> Self {
        info!(
            "Creating GI controller: {}, screen_size={}x{}",
            config.describe(),
            screen_size.x,
            screen_size.y
        );

        let buffers = GiBuffers::new(device, &config, screen_size);
        let passes = GiPasses::new(engine, device, &config, &buffers);

        debug!("GI controller created");

        Self {
            config,
            screen_size,
            buffers,
            passes,
            frame: Default::default(),
        }
    }

    pub fn update(
        &mut self,
        engine: &Engine,
        device: &wgpu::Device,
        config: GiConfig,
        screen_size: UVec2,
    ) {
        let needs_rebuilding = self.config.is_invalidated_by(&config)
            || self.screen_size != screen_size;

        self.config = config;
        self.screen_size = screen_size;

        if needs_rebuilding {
            debug!("Rebuilding GI controller: {}", self.config.describe());

            self.buffers = GiBuffers::new(device, &self.config, screen_size);

            self.passes =
                GiPasses::new(engine, device, &self.config, &self.buffers);
        }
    }

    /// Records this frame's passes (see [`GiStage::schedule()`]) and advances
    /// the frame counter.
    ///
    /// `retracer` gets invoked only on validation frames, after Glint has
    /// written `buffers().gi_retrace_requests` and before it reads
    /// `buffers().gi_retraced`.
    pub fn render<R>(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        retracer: &R,
    ) where
        R: GiRetracer + ?Sized,
    {
        trace!(
            "Rendering GI; frame={}, validation_frame={}",
            self.frame.get(),
            self.frame.is_gi_validation()
        );

        for stage in GiStage::schedule(self.validation_params()) {
            match stage {
                GiStage::DispatchSizing => {
                    self.passes.gi_dispatch_sizing.run(self, encoder);
                }
                GiStage::RetraceRequesting => {
                    self.passes.gi_retrace_requesting.run(self, encoder);
                }
                GiStage::Retracing => {
                    retracer.retrace(self, encoder);
                }
                GiStage::Validation => {
                    self.passes.gi_validation.run(self, encoder);
                }
            }
        }

        self.frame = self.frame.next();
    }

    pub fn config(&self) -> &GiConfig {
        &self.config
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen_size
    }

    pub fn buffers(&self) -> &GiBuffers {
        &self.buffers
    }

    pub fn frame(&self) -> gpu::Frame {
        self.frame
    }

    pub fn validation_params(&self) -> gpu::GiValidationPassParams {
        self.config.validation_params(self.frame, self.screen_size)
    }
}

/// Pass that traces the rays requested by GI validation; implemented by
/// whoever owns the scene's acceleration structures.
///
/// For every GI pixel whose [`gpu::RetraceRequest`] (read from
/// `gi.buffers().gi_retrace_requests`) is active, the pass must trace the
/// request's ray with the request's noise and write the outcome as a
/// [`gpu::TracedPath`] into `gi.buffers().gi_retraced`, at the same index.
pub trait GiRetracer {
    fn retrace(&self, gi: &GiController, encoder: &mut wgpu::CommandEncoder);
}

/// Step of a GI frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GiStage {
    DispatchSizing,
    RetraceRequesting,
    Retracing,
    Validation,
}

impl GiStage {
    /// Returns the stages of a frame, in the order they have to be recorded.
    ///
    /// Re-tracing happens only on validation frames; the validation pass
    /// itself runs every frame, since it's what fills the invalidity map.
    pub fn schedule(params: gpu::GiValidationPassParams) -> &'static [Self] {
        if params.is_validation_frame() {
            &[
                Self::DispatchSizing,
                Self::RetraceRequesting,
                Self::Retracing,
                Self::Validation,
            ]
        } else {
            &[Self::DispatchSizing, Self::Validation]
        }
    }
}

impl Drop for GiController {
    fn drop(&mut self) {
        info!("Deleting GI controller: {}", self.config.describe());
    }
}
