//! Host implementation of the GI passes, running the same algorithms as the
//! shaders over plain slices.
//!
//! Useful as a fallback when a GPU is not around and as a reference that
//! the shaders' outputs can be compared against.

use log::debug;
use rayon::prelude::*;
use spirv_std::glam::{uvec2, Vec4};

use crate::gpu::{
    DispatchArgs, DispatchSizer, DispatchSlot, GiDispatchSizingPassParams,
    GiHistory, GiValidationPassParams, GiValidator, ItemCounts, PathTracer,
    RetraceRequest,
};
use crate::{Error, Result};

/// Returns dispatch arguments for every slot, indexed by
/// [`DispatchSlot::index()`].
pub fn size_dispatches(
    counts: ItemCounts,
    params: GiDispatchSizingPassParams,
) -> [DispatchArgs; DispatchSlot::COUNT] {
    let mut raw_counts = [0; ItemCounts::LEN];
    let mut raw_args = [0; DispatchSlot::COUNT * DispatchArgs::LEN];

    counts.write(&mut raw_counts);
    DispatchSizer::new(params).run(&raw_counts, &mut raw_args);

    [
        DispatchArgs::read(&raw_args, DispatchSlot::CellClearing),
        DispatchArgs::read(&raw_args, DispatchSlot::SurfelBinning),
    ]
}

/// Validates every GI pixel of the viewport, in parallel.
///
/// Buffers are laid out the same way as on the GPU: `prim_depth` has one
/// entry per screen pixel, `history` has [`GiHistory::STRIDE`] entries per
/// GI pixel and `invalidity` has one entry per GI pixel.
pub fn validate<T>(
    params: GiValidationPassParams,
    prim_depth: &[f32],
    history: &mut [Vec4],
    invalidity: &mut [f32],
    tracer: &T,
) -> Result<ValidationStats>
where
    T: PathTracer + Sync,
{
    let screen_size = params.screen_size();
    let gi_size = params.gi_size();
    let gi_pixels = (gi_size.x * gi_size.y) as usize;

    check_len(
        "prim_depth",
        (screen_size.x * screen_size.y) as usize,
        prim_depth.len(),
    )?;

    check_len("history", gi_pixels * GiHistory::STRIDE, history.len())?;
    check_len("invalidity", gi_pixels, invalidity.len())?;

    let validator = GiValidator::new(params);

    let stats = history
        .par_chunks_mut(GiHistory::STRIDE)
        .zip(invalidity.par_iter_mut())
        .enumerate()
        .map(|(gi_idx, (history, invalidity))| {
            let gi_idx = gi_idx as u32;
            let gi_pos = uvec2(gi_idx % gi_size.x, gi_idx / gi_size.x);

            let depth = prim_depth
                [params.screen_to_idx(validator.screen_pos(gi_pos))];

            let validation = validator.eval(
                gi_pos,
                depth,
                GiHistory::read(history, 0),
                tracer,
            );

            if validation.is_corrected {
                GiHistory::write_irradiance(
                    history,
                    0,
                    validation.irradiance,
                );
            }

            *invalidity = validation.invalidity;

            ValidationStats {
                pixels: 1,
                background: (depth == 0.0) as usize,
                retraced: validation.is_retraced as usize,
                corrected: validation.is_corrected as usize,
                invalidity_sum: validation.invalidity as f64,
            }
        })
        .reduce(ValidationStats::default, ValidationStats::merge);

    debug!(
        "Validated GI; frame={}, {}",
        params.frame.get(),
        stats.describe()
    );

    Ok(stats)
}

/// Traces every active request from `requests` (as written by the
/// `gi_retrace_requesting` pass), storing the paths into `retraced`.
///
/// This is what a [`crate::GiRetracer`] does on the GPU; returns the number
/// of traced requests.
pub fn retrace<T>(
    requests: &[Vec4],
    retraced: &mut [Vec4],
    tracer: &T,
) -> Result<usize>
where
    T: PathTracer + Sync,
{
    check_len(
        "requests",
        retraced.len() * RetraceRequest::STRIDE,
        requests.len(),
    )?;

    let traced: usize = retraced
        .par_iter_mut()
        .enumerate()
        .map(|(gi_idx, retraced)| {
            let request = RetraceRequest::read(requests, gi_idx);

            if request.is_active {
                request
                    .trace(tracer)
                    .write(std::slice::from_mut(retraced), 0);

                1
            } else {
                0
            }
        })
        .sum();

    debug!("Re-traced GI paths; traced={traced}");

    Ok(traced)
}

fn check_len(
    name: &'static str,
    expected: usize,
    actual: usize,
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::BufferSizeMismatch {
            name,
            expected,
            actual,
        })
    }
}

/// Summary of a single [`validate()`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ValidationStats {
    pub pixels: usize,

    /// Pixels without any geometry (depth of zero).
    pub background: usize,

    /// Pixels whose cached ray got traced again.
    pub retraced: usize,

    /// Pixels whose cached irradiance got replaced by the re-traced one.
    pub corrected: usize,

    pub invalidity_sum: f64,
}

impl ValidationStats {
    pub fn merge(self, other: Self) -> Self {
        Self {
            pixels: self.pixels + other.pixels,
            background: self.background + other.background,
            retraced: self.retraced + other.retraced,
            corrected: self.corrected + other.corrected,
            invalidity_sum: self.invalidity_sum + other.invalidity_sum,
        }
    }

    pub fn mean_invalidity(&self) -> f64 {
        if self.pixels == 0 {
            0.0
        } else {
            self.invalidity_sum / self.pixels as f64
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "pixels={}, background={}, retraced={}, corrected={}, \
             mean_invalidity={:.3}",
            self.pixels,
            self.background,
            self.retraced,
            self.corrected,
            self.mean_invalidity()
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use spirv_std::glam::{vec3, vec4, UVec2, Vec3};

    use super::*;
    use crate::gpu::{Frame, Ray, TracedPath, WhiteNoise};

    const VALIDATION_FRAME: u32 = 4;
    const TRACING_FRAME: u32 = 2;

    /// Returns the same path for every ray.
    struct ConstTracer(TracedPath);

    impl PathTracer for ConstTracer {
        fn trace(&self, _: Ray, _: &mut WhiteNoise) -> TracedPath {
            self.0
        }
    }

    /// Pretends the scene is a wall hit at given distance, lit according to
    /// the ray's origin - so each pixel gets a different answer.
    struct WallTracer {
        distance: f32,
    }

    impl PathTracer for WallTracer {
        fn trace(&self, ray: Ray, _: &mut WhiteNoise) -> TracedPath {
            TracedPath {
                radiance: ray.origin().abs() + Vec3::ONE,
                hit_distance: self.distance,
            }
        }
    }

    /// Lights the wall according to the noise it's been given, so that
    /// paths traced with different seeds differ.
    struct NoisyTracer;

    impl PathTracer for NoisyTracer {
        fn trace(&self, ray: Ray, wnoise: &mut WhiteNoise) -> TracedPath {
            TracedPath {
                radiance: Vec3::splat((wnoise.sample_int() % 1024) as f32),
                hit_distance: ray.dir().z * 10.0,
            }
        }
    }

    struct Viewport {
        params: GiValidationPassParams,
        prim_depth: Vec<f32>,
        history: Vec<Vec4>,
        invalidity: Vec<f32>,
    }

    impl Viewport {
        fn new(frame: u32, half_res: bool, screen_size: UVec2) -> Self {
            let params = GiValidationPassParams::new(
                Frame::new(frame),
                true,
                half_res,
                screen_size,
            );

            let gi_size = params.gi_size();
            let gi_pixels = (gi_size.x * gi_size.y) as usize;

            let mut history =
                vec![Vec4::ZERO; gi_pixels * GiHistory::STRIDE];

            for idx in 0..gi_pixels {
                GiHistory {
                    ray_origin: vec3(idx as f32, 0.0, 0.0),
                    hit_offset: vec3(0.0, 0.0, 10.0),
                    irradiance: vec4(1.0, 1.0, 1.0, idx as f32),
                }
                .write(&mut history, idx);
            }

            Self {
                params,
                prim_depth: vec![
                    1.0;
                    (screen_size.x * screen_size.y) as usize
                ],
                history,
                invalidity: vec![-1.0; gi_pixels],
            }
        }

        fn validate<T>(&mut self, tracer: &T) -> ValidationStats
        where
            T: PathTracer + Sync,
        {
            validate(
                self.params,
                &self.prim_depth,
                &mut self.history,
                &mut self.invalidity,
                tracer,
            )
            .unwrap()
        }
    }

    #[test]
    fn size_dispatches_with_and_without_cell_clearing() {
        let counts = ItemCounts {
            cell_count: 2048,
            surfel_count: 65,
        };

        let args =
            size_dispatches(counts, GiDispatchSizingPassParams::new(false));

        assert_eq!([0, 0, 0, 0], args[0].as_array());
        assert_eq!([2, 1, 1, 0], args[1].as_array());

        let args =
            size_dispatches(counts, GiDispatchSizingPassParams::new(true));

        assert_eq!([2, 1, 1, 0], args[0].as_array());
        assert_eq!([2, 1, 1, 0], args[1].as_array());
    }

    #[test]
    fn size_dispatches_with_nothing_to_do() {
        let args = size_dispatches(
            ItemCounts::default(),
            GiDispatchSizingPassParams::new(true),
        );

        assert!(args.iter().all(|args| args.is_noop()));
    }

    #[test]
    fn size_mismatch() {
        let mut vp = Viewport::new(VALIDATION_FRAME, true, uvec2(4, 4));

        vp.prim_depth.pop();

        let err = validate(
            vp.params,
            &vp.prim_depth,
            &mut vp.history,
            &mut vp.invalidity,
            &ConstTracer(Default::default()),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::BufferSizeMismatch {
                name: "prim_depth",
                expected: 16,
                actual: 15,
            }
        ));

        let mut vp = Viewport::new(VALIDATION_FRAME, true, uvec2(4, 4));

        vp.history.push(Vec4::ZERO);

        let err = validate(
            vp.params,
            &vp.prim_depth,
            &mut vp.history,
            &mut vp.invalidity,
            &ConstTracer(Default::default()),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::BufferSizeMismatch {
                name: "history",
                ..
            }
        ));
    }

    #[test]
    fn tracing_frame_trusts_everything() {
        let mut vp = Viewport::new(TRACING_FRAME, false, uvec2(8, 8));
        let history = vp.history.clone();

        let stats = vp.validate(&ConstTracer(TracedPath {
            radiance: Vec3::splat(100.0),
            hit_distance: 10.0,
        }));

        assert_eq!(64, stats.pixels);
        assert_eq!(0, stats.retraced);
        assert_eq!(0, stats.corrected);
        assert!(vp.invalidity.iter().all(|&inv| inv == 0.0));
        assert_eq!(history, vp.history);
    }

    #[test]
    fn background_is_always_invalid() {
        for frame in [TRACING_FRAME, VALIDATION_FRAME] {
            let mut vp = Viewport::new(frame, false, uvec2(4, 4));

            vp.prim_depth.iter_mut().for_each(|depth| *depth = 0.0);

            let stats = vp.validate(&ConstTracer(Default::default()));

            assert_eq!(16, stats.background);
            assert_eq!(0, stats.retraced);
            assert!(vp.invalidity.iter().all(|&inv| inv == 1.0));
        }
    }

    #[test]
    fn unchanged_lighting_keeps_cache() {
        let mut vp = Viewport::new(VALIDATION_FRAME, false, uvec2(4, 4));

        let stats = vp.validate(&ConstTracer(TracedPath {
            radiance: Vec3::ONE,
            hit_distance: 10.0,
        }));

        assert_eq!(16, stats.retraced);
        assert_eq!(16, stats.corrected);
        assert_relative_eq!(0.0, stats.mean_invalidity());

        for idx in 0..16 {
            let history = GiHistory::read(&vp.history, idx);

            assert_eq!(vec4(1.0, 1.0, 1.0, idx as f32), history.irradiance);
        }
    }

    #[test]
    fn changed_lighting_on_same_surface_gets_corrected() {
        let mut vp = Viewport::new(VALIDATION_FRAME, false, uvec2(4, 4));

        let stats = vp.validate(&ConstTracer(TracedPath {
            radiance: Vec3::splat(9.0),
            hit_distance: 10.5,
        }));

        assert_eq!(16, stats.corrected);
        assert_relative_eq!(16.0, stats.invalidity_sum);

        for idx in 0..16 {
            let history = GiHistory::read(&vp.history, idx);

            // Irradiance gets replaced, aux channel survives
            assert_eq!(vec4(9.0, 9.0, 9.0, idx as f32), history.irradiance);
            assert_eq!(vec3(idx as f32, 0.0, 0.0), history.ray_origin);
        }
    }

    #[test]
    fn changed_surface_is_not_corrected() {
        let mut vp = Viewport::new(VALIDATION_FRAME, false, uvec2(4, 4));
        let history = vp.history.clone();

        let stats = vp.validate(&ConstTracer(TracedPath {
            radiance: Vec3::splat(9.0),
            hit_distance: 20.0,
        }));

        assert_eq!(16, stats.retraced);
        assert_eq!(0, stats.corrected);
        assert!(vp.invalidity.iter().all(|&inv| inv == 1.0));
        assert_eq!(history, vp.history);
    }

    #[test]
    fn half_res_depth_follows_subpixel_rotation() {
        // Only the bottom-right pixel of each 2x2 quad has geometry, so it
        // must be visited on exactly one frame of the rotation
        let screen_size = uvec2(4, 4);
        let mut seen = Vec::new();

        for frame in 0..4 {
            let mut vp = Viewport::new(frame, true, screen_size);

            vp.prim_depth = (0..16)
                .map(|idx| {
                    let has_geometry = idx % 2 == 1 && (idx / 4) % 2 == 1;

                    if has_geometry {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect();

            let stats = vp.validate(&ConstTracer(Default::default()));

            seen.push(stats.background);
        }

        assert_eq!(vec![4, 0, 4, 4], seen);
    }

    fn assert_matches_per_pixel_validator<T>(tracer: &T)
    where
        T: PathTracer + Sync,
    {
        let mut vp = Viewport::new(VALIDATION_FRAME, true, uvec2(7, 5));

        vp.prim_depth[2] = 0.0;
        vp.prim_depth[18] = 0.0;

        let mut expected_history = vp.history.clone();
        let mut expected_invalidity = vp.invalidity.clone();
        let validator = GiValidator::new(vp.params);
        let gi_size = vp.params.gi_size();
        let gi_pixels = (gi_size.x * gi_size.y) as usize;

        let mut requests =
            vec![Vec4::ONE; gi_pixels * RetraceRequest::STRIDE];

        for y in 0..gi_size.y {
            for x in 0..gi_size.x {
                validator.run_requesting(
                    uvec2(x, y),
                    &vp.prim_depth,
                    &expected_history,
                    &mut requests,
                );
            }
        }

        let mut retraced = vec![Vec4::ZERO; gi_pixels];
        let traced = retrace(&requests, &mut retraced, tracer).unwrap();

        for y in 0..gi_size.y {
            for x in 0..gi_size.x {
                validator.run(
                    uvec2(x, y),
                    &vp.prim_depth,
                    &retraced,
                    &mut expected_history,
                    &mut expected_invalidity,
                );
            }
        }

        let stats = vp.validate(tracer);

        assert_eq!(12, stats.pixels);
        assert_eq!(traced, stats.retraced);
        assert_eq!(expected_history, vp.history);
        assert_eq!(expected_invalidity, vp.invalidity);
    }

    #[test]
    fn matches_per_pixel_validator() {
        assert_matches_per_pixel_validator(&WallTracer { distance: 11.0 });
        assert_matches_per_pixel_validator(&NoisyTracer);
    }

    #[test]
    fn retracing_uses_requested_noise() {
        let vp = Viewport::new(VALIDATION_FRAME, false, uvec2(2, 1));
        let validator = GiValidator::new(vp.params);
        let mut requests = vec![Vec4::ZERO; 2 * RetraceRequest::STRIDE];

        for x in 0..2 {
            validator.run_requesting(
                uvec2(x, 0),
                &vp.prim_depth,
                &vp.history,
                &mut requests,
            );
        }

        let mut retraced = vec![Vec4::ZERO; 2];

        assert_eq!(2, retrace(&requests, &mut retraced, &NoisyTracer).unwrap());

        for x in 0..2 {
            let frame = Frame::new(VALIDATION_FRAME);
            let mut wnoise = WhiteNoise::for_validation(frame, uvec2(x, 0));

            let expected = NoisyTracer.trace(
                GiHistory::read(&vp.history, x as usize).ray(),
                &mut wnoise,
            );

            assert_eq!(expected, TracedPath::read(&retraced, x as usize));
        }
    }

    #[test]
    fn retracing_skips_inactive_requests() {
        let vp = Viewport::new(TRACING_FRAME, false, uvec2(2, 2));
        let validator = GiValidator::new(vp.params);
        let mut requests = vec![Vec4::ONE; 4 * RetraceRequest::STRIDE];

        for y in 0..2 {
            for x in 0..2 {
                validator.run_requesting(
                    uvec2(x, y),
                    &vp.prim_depth,
                    &vp.history,
                    &mut requests,
                );
            }
        }

        let mut retraced = vec![Vec4::splat(-1.0); 4];

        assert_eq!(0, retrace(&requests, &mut retraced, &NoisyTracer).unwrap());
        assert!(retraced.iter().all(|&path| path == Vec4::splat(-1.0)));

        let err = retrace(&requests[1..], &mut retraced, &NoisyTracer)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::BufferSizeMismatch {
                name: "requests",
                expected: 8,
                actual: 7,
            }
        ));
    }
}
