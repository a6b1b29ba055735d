use spirv_std::arch::IndexUnchecked;
use spirv_std::glam::{Vec3, Vec4, Vec4Swizzles};

use crate::{Ray, WhiteNoise};

/// Outcome of tracing a single GI path.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct TracedPath {
    pub radiance: Vec3,
    pub hit_distance: f32,
}

impl TracedPath {
    pub fn read(buffer: &[Vec4], id: usize) -> Self {
        let d0 = unsafe { *buffer.index_unchecked(id) };

        Self {
            radiance: d0.xyz(),
            hit_distance: d0.w,
        }
    }

    pub fn write(self, buffer: &mut [Vec4], id: usize) {
        unsafe {
            *buffer.index_unchecked_mut(id) =
                self.radiance.extend(self.hit_distance);
        }
    }
}

/// Something that can trace a GI path - given the ray and a source of
/// randomness, returns the radiance brought back and the hit distance.
pub trait PathTracer {
    fn trace(&self, ray: Ray, wnoise: &mut WhiteNoise) -> TracedPath;
}

/// Ray that has to be traced again on behalf of a single GI pixel, together
/// with the noise it has to be traced with.
///
/// On the GPU requests are written by the `gi_retrace_requesting` pass and
/// handed over to the tracing pass, which answers each active request with
/// a [`TracedPath`] at the same index.
///
/// Stored as two `Vec4`s per pixel:
///
/// - `d0.xyz` = ray origin, `d0.w` = noise state (as bits),
/// - `d1.xyz` = ray direction, `d1.w` = `1.0` if the request is active.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct RetraceRequest {
    pub ray: Ray,
    pub seed: u32,
    pub is_active: bool,
}

impl RetraceRequest {
    /// Number of `Vec4`s occupied by a single pixel.
    pub const STRIDE: usize = 2;

    pub fn new(ray: Ray, wnoise: WhiteNoise) -> Self {
        Self {
            ray,
            seed: wnoise.state(),
            is_active: true,
        }
    }

    /// Returns a request that mustn't be traced.
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn read(buffer: &[Vec4], id: usize) -> Self {
        let d0 = unsafe { *buffer.index_unchecked(Self::STRIDE * id) };
        let d1 = unsafe { *buffer.index_unchecked(Self::STRIDE * id + 1) };

        Self {
            ray: Ray::new(d0.xyz(), d1.xyz()),
            seed: d0.w.to_bits(),
            is_active: d1.w > 0.5,
        }
    }

    pub fn write(self, buffer: &mut [Vec4], id: usize) {
        unsafe {
            *buffer.index_unchecked_mut(Self::STRIDE * id) =
                self.ray.origin().extend(f32::from_bits(self.seed));

            *buffer.index_unchecked_mut(Self::STRIDE * id + 1) = self
                .ray
                .dir()
                .extend(if self.is_active { 1.0 } else { 0.0 });
        }
    }

    pub fn noise(self) -> WhiteNoise {
        WhiteNoise::from_state(self.seed)
    }

    pub fn trace<T>(self, tracer: &T) -> TracedPath
    where
        T: PathTracer,
    {
        tracer.trace(self.ray, &mut self.noise())
    }
}

#[cfg(test)]
mod tests {
    use spirv_std::glam::{uvec2, vec3};

    use super::*;
    use crate::Frame;

    /// Returns the ray's direction as radiance and the first noise sample as
    /// the hit distance.
    struct EchoTracer;

    impl PathTracer for EchoTracer {
        fn trace(&self, ray: Ray, wnoise: &mut WhiteNoise) -> TracedPath {
            TracedPath {
                radiance: ray.dir(),
                hit_distance: wnoise.sample_int() as f32,
            }
        }
    }

    #[test]
    fn traced_path_serialization() {
        let mut buffer = vec![Vec4::ZERO; 4];

        let path = TracedPath {
            radiance: vec3(1.0, 2.0, 3.0),
            hit_distance: 12.5,
        };

        path.write(&mut buffer, 2);

        assert_eq!(TracedPath::default(), TracedPath::read(&buffer, 1));
        assert_eq!(path, TracedPath::read(&buffer, 2));
    }

    #[test]
    fn request_serialization() {
        let mut buffer = vec![Vec4::ZERO; 2 * RetraceRequest::STRIDE];

        // Seeds are carried as raw bits, so ones that form NaNs or
        // denormals must survive too
        for seed in [0, 1, 0x7fc0_0001, 0xffff_ffff, 0x0000_0010] {
            let request = RetraceRequest {
                ray: Ray::new(vec3(1.0, 2.0, 3.0), vec3(0.0, 1.0, 0.0)),
                seed,
                is_active: true,
            };

            request.write(&mut buffer, 1);

            assert_eq!(request, RetraceRequest::read(&buffer, 1));
        }

        RetraceRequest::inactive().write(&mut buffer, 0);

        assert!(!RetraceRequest::read(&buffer, 0).is_active);
    }

    #[test]
    fn request_carries_ray_and_noise() {
        let ray = Ray::new(vec3(1.0, 2.0, 3.0), vec3(0.0, 0.0, 1.0));
        let wnoise = WhiteNoise::for_validation(Frame::new(4), uvec2(3, 7));
        let mut buffer = vec![Vec4::ZERO; RetraceRequest::STRIDE];

        RetraceRequest::new(ray, wnoise).write(&mut buffer, 0);

        let actual = RetraceRequest::read(&buffer, 0).trace(&EchoTracer);
        let mut expected_noise = wnoise;
        let expected = EchoTracer.trace(ray, &mut expected_noise);

        assert_eq!(expected, actual);
        assert_eq!(vec3(0.0, 0.0, 1.0), actual.radiance);
    }
}
