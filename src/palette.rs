//! Procedural HSL ramps and the fixed dye palette
//!
//! Colors are packed `0xRRGGBB` throughout the crate.

/// The sixteen dye colors, indexed by data nibble (white .. black)
pub const STANDARD_COLORS: [u32; 16] = [
    0xDDDDDD, 0xDB7D3E, 0xB350BC, 0x6B8AC9, 0xB1A627, 0x41AE38, 0xD08499, 0x404040,
    0x9AA1A1, 0x2E6E89, 0x7E3DB5, 0x2E388D, 0x4F321F, 0x35461B, 0x963430, 0x191616,
];

/// Height entry that separates the two halves of the height ramp (sea level)
pub const SEA_LEVEL_COLOR: u32 = 0x303030;

/// Color for heights outside the 0..128 world
pub const OUT_OF_RANGE_COLOR: u32 = 0xff00ff;

pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

pub fn to_bytes(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

pub fn gray(v: u8) -> u32 {
    rgb(v, v, v)
}

fn hue_to_rgb(m1: f64, m2: f64, h: f64) -> f64 {
    let h = h.rem_euclid(1.0);
    if h * 6.0 < 1.0 {
        m1 + (m2 - m1) * h * 6.0
    } else if h * 2.0 < 1.0 {
        m2
    } else if h * 3.0 < 2.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
    } else {
        m1
    }
}

fn channel(v: f64) -> u8 {
    ((v * 255.0) as i32).clamp(0, 255) as u8
}

/// Convert hue/saturation/lightness (all 0..1) to packed RGB
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> u32 {
    let m2 = if l <= 0.5 { l * (s + 1.0) } else { l + s - l * s };
    let m1 = l * 2.0 - m2;
    rgb(
        channel(hue_to_rgb(m1, m2, h + 1.0 / 3.0)),
        channel(hue_to_rgb(m1, m2, h)),
        channel(hue_to_rgb(m1, m2, h - 1.0 / 3.0)),
    )
}

/// HSL endpoints for a ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }
}

/// Fill `pal[start..=stop]` with a linear ramp from `from` towards `to`
///
/// The step is `(to - from) / count`, so the final entry stops one step
/// short of `to`.
pub fn hsl_ramp(pal: &mut [u32], start: usize, stop: usize, from: Hsl, to: Hsl) {
    if stop < start || stop >= pal.len() {
        return;
    }
    let steps = (stop - start + 1) as f64;
    let dh = (to.h - from.h) / steps;
    let ds = (to.s - from.s) / steps;
    let dl = (to.l - from.l) / steps;
    for (i, slot) in pal[start..=stop].iter_mut().enumerate() {
        let i = i as f64;
        *slot = hsl_to_rgb(from.h + dh * i, from.s + ds * i, from.l + dl * i);
    }
}

/// 256-entry lookup keyed by the column height byte
#[derive(Debug, Clone)]
pub struct HeightPalette {
    colors: [u32; 256],
}

impl HeightPalette {
    /// Red below sea level darkening towards it, green above brightening away from it
    pub fn red_black_green() -> Self {
        Self::build(0.9)
    }

    /// Same ramp with saturation removed
    pub fn gray() -> Self {
        Self::build(0.0)
    }

    fn build(saturation: f64) -> Self {
        let mut colors = [OUT_OF_RANGE_COLOR; 256];
        hsl_ramp(
            &mut colors,
            0,
            61,
            Hsl::new(0.0, saturation, 0.8),
            Hsl::new(0.0, saturation, 0.1),
        );
        colors[62] = SEA_LEVEL_COLOR;
        hsl_ramp(
            &mut colors,
            63,
            127,
            Hsl::new(0.4, saturation, 0.1),
            Hsl::new(0.4, saturation, 0.8),
        );
        Self { colors }
    }

    pub fn color(&self, height: u8) -> u32 {
        self.colors[height as usize]
    }
}
