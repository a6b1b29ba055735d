use spirv_std::arch::IndexUnchecked;
use spirv_std::glam::{Vec3, Vec4, Vec4Swizzles};

use crate::Ray;

/// Previous frame's GI ray of a single pixel, together with the irradiance
/// it has brought back.
///
/// Stored as three `Vec4`s per pixel:
///
/// - `d0.xyz` = ray origin,
/// - `d1.xyz` = hit point, relative to the origin,
/// - `d2` = cached irradiance; `.w` is an auxiliary channel owned by the
///   temporal accumulation and carried through untouched.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GiHistory {
    pub ray_origin: Vec3,
    pub hit_offset: Vec3,
    pub irradiance: Vec4,
}

impl GiHistory {
    /// Number of `Vec4`s occupied by a single pixel.
    pub const STRIDE: usize = 3;

    pub fn read(buffer: &[Vec4], id: usize) -> Self {
        let d0 = unsafe { *buffer.index_unchecked(Self::STRIDE * id) };
        let d1 = unsafe { *buffer.index_unchecked(Self::STRIDE * id + 1) };
        let d2 = unsafe { *buffer.index_unchecked(Self::STRIDE * id + 2) };

        Self {
            ray_origin: d0.xyz(),
            hit_offset: d1.xyz(),
            irradiance: d2,
        }
    }

    pub fn write(self, buffer: &mut [Vec4], id: usize) {
        unsafe {
            *buffer.index_unchecked_mut(Self::STRIDE * id) =
                self.ray_origin.extend(0.0);

            *buffer.index_unchecked_mut(Self::STRIDE * id + 1) =
                self.hit_offset.extend(0.0);
        }

        Self::write_irradiance(buffer, id, self.irradiance);
    }

    /// Overwrites just the cached irradiance, leaving the ray as-is.
    pub fn write_irradiance(buffer: &mut [Vec4], id: usize, irradiance: Vec4) {
        unsafe {
            *buffer.index_unchecked_mut(Self::STRIDE * id + 2) = irradiance;
        }
    }

    pub fn hit_point(self) -> Vec3 {
        self.ray_origin + self.hit_offset
    }

    pub fn hit_distance(self) -> f32 {
        self.hit_offset.length()
    }

    pub fn radiance(self) -> Vec3 {
        self.irradiance.xyz()
    }

    pub fn aux(self) -> f32 {
        self.irradiance.w
    }

    /// Reconstructs the ray traced in the previous frame.
    pub fn ray(self) -> Ray {
        Ray::towards(self.ray_origin, self.hit_point())
    }
}
