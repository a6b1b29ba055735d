use spirv_std::arch::IndexUnchecked;
use spirv_std::glam::{UVec2, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    resolve_subpixel, smoothstep, GiHistory, GiValidationPassParams,
    PathTracer, RetraceRequest, TracedPath, WhiteNoise, GLINT_EPSILON,
};

/// Re-traces previous frame's GI rays and measures how stale their cached
/// irradiance has become.
///
/// Runs once per GI pixel per frame:
///
/// - background pixels get invalidity of `1.0` (nothing to keep),
/// - outside of validation frames everything gets invalidity of `0.0` (cache
///   is trusted),
/// - otherwise the cached ray gets re-traced and the relative radiance
///   difference is mapped into invalidity; if the new hit lands more or less
///   where the old one did, the cached irradiance is refreshed in place.
///
/// On the GPU the re-trace is split in two: [`Self::run_requesting()`] asks
/// for the rays to be traced and [`Self::run()`] consumes the traced paths.
#[derive(Clone, Copy)]
pub struct GiValidator {
    params: GiValidationPassParams,
}

impl GiValidator {
    /// Normalized radiance difference below which a sample is considered
    /// valid.
    pub const DRIFT_MIN: f32 = 0.1;

    /// Normalized radiance difference above which a sample is considered
    /// completely invalid.
    pub const DRIFT_MAX: f32 = 0.5;

    /// Maximum relative difference between the old and the new hit distance
    /// for both hits to be considered the same surface.
    pub const HIT_TOLERANCE: f32 = 0.2;

    pub fn new(params: GiValidationPassParams) -> Self {
        Self { params }
    }

    /// Returns the full-resolution pixel inspected on behalf of given GI
    /// pixel.
    pub fn screen_pos(self, gi_pos: UVec2) -> UVec2 {
        resolve_subpixel(
            gi_pos,
            self.params.frame.get(),
            self.params.is_half_res(),
            self.params.screen_size(),
        )
    }

    /// Returns whether a pixel of given depth gets re-traced in this frame.
    pub fn needs_retrace(self, depth: f32) -> bool {
        depth != 0.0 && self.params.is_validation_frame()
    }

    /// Returns the ray (and noise) the pixel needs to have traced again, or
    /// an inactive request if it doesn't need re-tracing at all.
    pub fn request(
        self,
        gi_pos: UVec2,
        depth: f32,
        history: GiHistory,
    ) -> RetraceRequest {
        if self.needs_retrace(depth) {
            RetraceRequest::new(
                history.ray(),
                WhiteNoise::for_validation(self.params.frame, gi_pos),
            )
        } else {
            RetraceRequest::inactive()
        }
    }

    /// Validates a single GI pixel, tracing its ray with given tracer.
    pub fn eval<T>(
        self,
        gi_pos: UVec2,
        depth: f32,
        history: GiHistory,
        tracer: &T,
    ) -> GiValidation
    where
        T: PathTracer,
    {
        if !self.needs_retrace(depth) {
            return Self::skip(depth);
        }

        let path = self.request(gi_pos, depth, history).trace(tracer);

        Self::compare(history, path)
    }

    /// Validates a single GI pixel, given the path traced for its
    /// [`Self::request()`].
    pub fn eval_retraced(
        self,
        depth: f32,
        history: GiHistory,
        path: TracedPath,
    ) -> GiValidation {
        if !self.needs_retrace(depth) {
            return Self::skip(depth);
        }

        Self::compare(history, path)
    }

    fn skip(depth: f32) -> GiValidation {
        if depth == 0.0 {
            GiValidation::background()
        } else {
            GiValidation::trusted()
        }
    }

    fn compare(history: GiHistory, path: TracedPath) -> GiValidation {
        let invalidity = Self::invalidity(history.radiance(), path.radiance);

        // Radiance that went off to infinity is not something to cache,
        // even if the surface matches
        let is_finite = path
            .radiance
            .max(Vec3::ZERO)
            .cmplt(Vec3::splat(f32::INFINITY))
            .all();

        if is_finite
            && Self::is_same_hit(history.hit_distance(), path.hit_distance)
        {
            GiValidation {
                invalidity,
                irradiance: Self::sanitize(path.radiance)
                    .extend(history.aux()),
                is_corrected: true,
                is_retraced: true,
            }
        } else {
            GiValidation {
                invalidity,
                irradiance: history.irradiance,
                is_corrected: false,
                is_retraced: true,
            }
        }
    }

    fn depth(self, gi_pos: UVec2, prim_depth: &[f32]) -> f32 {
        unsafe {
            *prim_depth.index_unchecked(
                self.params.screen_to_idx(self.screen_pos(gi_pos)),
            )
        }
    }

    /// Writes the re-trace request of a single GI pixel; inactive requests
    /// are written too, so that no stale request survives into this frame.
    pub fn run_requesting(
        self,
        gi_pos: UVec2,
        prim_depth: &[f32],
        history: &[Vec4],
        requests: &mut [Vec4],
    ) {
        let gi_idx = self.params.gi_to_idx(gi_pos);

        self.request(
            gi_pos,
            self.depth(gi_pos, prim_depth),
            GiHistory::read(history, gi_idx),
        )
        .write(requests, gi_idx);
    }

    /// Validates a single GI pixel using the path traced for its request,
    /// writing its invalidity and (if needed) the corrected irradiance back.
    pub fn run(
        self,
        gi_pos: UVec2,
        prim_depth: &[f32],
        retraced: &[Vec4],
        history: &mut [Vec4],
        invalidity: &mut [f32],
    ) {
        let gi_idx = self.params.gi_to_idx(gi_pos);

        let validation = self.eval_retraced(
            self.depth(gi_pos, prim_depth),
            GiHistory::read(history, gi_idx),
            TracedPath::read(retraced, gi_idx),
        );

        if validation.is_corrected {
            GiHistory::write_irradiance(
                history,
                gi_idx,
                validation.irradiance,
            );
        }

        unsafe {
            *invalidity.index_unchecked_mut(gi_idx) = validation.invalidity;
        }
    }

    /// Clamps radiance into `<0.0, f32::MAX>`; NaNs become zeros.
    pub fn sanitize(radiance: Vec3) -> Vec3 {
        radiance.max(Vec3::ZERO).min(Vec3::splat(f32::MAX))
    }

    /// Returns the relative difference between two radiances, normalized so
    /// that `1.0` means "completely different in every channel".
    ///
    /// Both radiances are sanitized first; the sum is taken in halves so
    /// that it doesn't overflow for radiances close to `f32::MAX`.
    pub fn radiance_drift(prev: Vec3, new: Vec3) -> f32 {
        let prev = Self::sanitize(prev);
        let new = Self::sanitize(new);

        let half_diff = (prev - new).abs() * 0.5;
        let half_sum = prev * 0.5 + new * 0.5;

        let diff =
            half_diff / half_sum.max(Vec3::splat(0.5 * GLINT_EPSILON));

        diff.length() / Vec3::ONE.length()
    }

    pub fn invalidity(prev: Vec3, new: Vec3) -> f32 {
        smoothstep(
            Self::DRIFT_MIN,
            Self::DRIFT_MAX,
            Self::radiance_drift(prev, new),
        )
    }

    pub fn is_same_hit(prev_distance: f32, new_distance: f32) -> bool {
        let diff = (new_distance - prev_distance).abs()
            / (prev_distance + new_distance).max(GLINT_EPSILON);

        diff < Self::HIT_TOLERANCE
    }
}

#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GiValidation {
    pub invalidity: f32,

    /// Irradiance the history should hold from now on; meaningful only when
    /// `is_corrected` is set.
    pub irradiance: Vec4,
    pub is_corrected: bool,

    /// Whether the pixel's ray got traced again.
    pub is_retraced: bool,
}

impl GiValidation {
    pub fn background() -> Self {
        Self {
            invalidity: 1.0,
            ..Default::default()
        }
    }

    pub fn trusted() -> Self {
        Self::default()
    }
}
