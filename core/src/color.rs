//! Packed color helpers.
//!
//! Colors are handled as linear `[f32; 4]` RGBA arrays everywhere in the
//! engine. Callers coming from packed `0xAARRGGBB` integers (the layout used
//! by most platform color pickers) convert through these helpers.

/// Convert a packed `0xAARRGGBB` color to normalized `[r, g, b, a]`.
pub fn argb_to_rgba(color: u32) -> [f32; 4] {
    let a = (color >> 24) & 0xff;
    let r = (color >> 16) & 0xff;
    let g = (color >> 8) & 0xff;
    let b = color & 0xff;
    [
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ]
}

/// Convert a packed `0x??RRGGBB` color to normalized `[r, g, b]`, ignoring alpha.
pub fn argb_to_rgb(color: u32) -> [f32; 3] {
    let [r, g, b, _] = argb_to_rgba(color);
    [r, g, b]
}

/// Pack normalized `[r, g, b, a]` into `0xAARRGGBB`.
///
/// Components are clamped to `[0, 1]` and truncated, matching the
/// conversion used when reading colors back from a material.
pub fn rgba_to_argb(color: [f32; 4]) -> u32 {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u32;
    (to_byte(color[3]) << 24) | (to_byte(color[0]) << 16) | (to_byte(color[1]) << 8) | to_byte(color[2])
}

/// Opaque white.
pub const WHITE: u32 = 0xffff_ffff;

/// Opaque black.
pub const BLACK: u32 = 0xff00_0000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_opaque_red() {
        assert_eq!(argb_to_rgba(0xffff0000), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn unpack_ignores_alpha_for_rgb() {
        assert_eq!(argb_to_rgb(0x0000ff00), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn pack_clamps_out_of_range() {
        assert_eq!(rgba_to_argb([2.0, -1.0, 0.0, 1.0]), 0xffff0000);
    }

    #[test]
    fn pack_unpack_white() {
        assert_eq!(rgba_to_argb(argb_to_rgba(WHITE)), WHITE);
    }
}
