mod f32_ext;

use spirv_std::glam::{uvec2, UVec2};

pub use self::f32_ext::*;

/// Hermite interpolation between `0.0` (for `x <= edge0`) and `1.0` (for
/// `x >= edge1`).
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).saturate();

    t * t * (3.0 - 2.0 * t)
}

/// Sub-pixel offsets visited by half-resolution passes, one per frame.
pub const SUBPIXEL_OFFSETS: [UVec2; 4] =
    [uvec2(0, 0), uvec2(1, 1), uvec2(1, 0), uvec2(0, 1)];

/// Returns which of the four full-resolution pixels covered by a
/// half-resolution pixel gets inspected during given frame.
pub fn subpixel_offset(frame: u32) -> UVec2 {
    match frame % 4 {
        0 => SUBPIXEL_OFFSETS[0],
        1 => SUBPIXEL_OFFSETS[1],
        2 => SUBPIXEL_OFFSETS[2],
        _ => SUBPIXEL_OFFSETS[3],
    }
}

/// Maps a GI pixel into the full-resolution pixel it stands for during given
/// frame.
///
/// At half resolution this rotates through [`SUBPIXEL_OFFSETS`], so that over
/// four consecutive frames every full-resolution pixel gets visited once; the
/// result is clamped to the screen, for odd screen sizes.
pub fn resolve_subpixel(
    gi_pos: UVec2,
    frame: u32,
    half_res: bool,
    screen_size: UVec2,
) -> UVec2 {
    if half_res {
        (gi_pos * 2 + subpixel_offset(frame)).min(screen_size - 1)
    } else {
        gi_pos
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn smoothstep_edges() {
        assert_eq!(0.0, smoothstep(0.1, 0.5, 0.0));
        assert_eq!(0.0, smoothstep(0.1, 0.5, 0.1));
        assert_relative_eq!(0.5, smoothstep(0.1, 0.5, 0.3));
        assert_eq!(1.0, smoothstep(0.1, 0.5, 0.5));
        assert_eq!(1.0, smoothstep(0.1, 0.5, 3.0));
    }

    #[test]
    fn subpixel_rotation_covers_every_offset() {
        let screen_size = uvec2(64, 64);

        let mut visited: Vec<_> = (17..21)
            .map(|frame| {
                resolve_subpixel(uvec2(5, 9), frame, true, screen_size)
            })
            .collect();

        visited.sort_by_key(|pos| (pos.x, pos.y));

        assert_eq!(
            vec![uvec2(10, 18), uvec2(10, 19), uvec2(11, 18), uvec2(11, 19)],
            visited
        );
    }

    #[test]
    fn subpixel_rotation_order() {
        let offsets: Vec<_> = (0..8).map(subpixel_offset).collect();

        assert_eq!(&SUBPIXEL_OFFSETS[..], &offsets[0..4]);
        assert_eq!(&SUBPIXEL_OFFSETS[..], &offsets[4..8]);
    }

    #[test]
    fn subpixel_is_clamped_to_screen() {
        let pos = resolve_subpixel(uvec2(2, 2), 1, true, uvec2(5, 5));

        assert_eq!(uvec2(4, 4), pos);
    }

    #[test]
    fn full_res_has_no_offset() {
        for frame in 0..4 {
            assert_eq!(
                uvec2(5, 9),
                resolve_subpixel(uvec2(5, 9), frame, false, uvec2(64, 64))
            );
        }
    }
}
