//! Map rasterization
//!
//! Architecture:
//! 1. `compositor` - One pixel per column from the chunk summaries
//! 2. `slices` - One image per layer, re-reading raw terrain
//! 3. `encode` - PNG output and movie assembly

pub mod compositor;
pub mod encode;
pub mod slices;

use std::fmt;
use std::str::FromStr;

use crate::codec::CHUNK_WIDTH;
use crate::error::Error;
use crate::palette::to_bytes;

pub use compositor::Compositor;
pub use encode::{encode_png, write_png, VideoEncoder};
pub use slices::{slice_path, slice_pattern, CropRect, SliceRenderer};

/// Chunk border lines
pub const GRID_COLOR: u32 = 0xc1ffc4;
/// First pixel of chunk (0, 0)
pub const ORIGIN_COLOR: u32 = 0xeb3333;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    Terrain,
    Biome,
    Grass,
    HeightColor,
    HeightGray,
    BlockLight,
    SkyLight,
}

impl RenderMode {
    pub const ALL: [RenderMode; 7] = [
        RenderMode::Terrain,
        RenderMode::Biome,
        RenderMode::Grass,
        RenderMode::HeightColor,
        RenderMode::HeightGray,
        RenderMode::BlockLight,
        RenderMode::SkyLight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Terrain => "terrain",
            RenderMode::Biome => "biome",
            RenderMode::Grass => "grass",
            RenderMode::HeightColor => "height-color",
            RenderMode::HeightGray => "height-gray",
            RenderMode::BlockLight => "block-light",
            RenderMode::SkyLight => "sky-light",
        }
    }

    /// Appended to `<base>.<dimension>` to name the output image
    pub fn file_suffix(self) -> &'static str {
        match self {
            RenderMode::Terrain => "",
            RenderMode::Biome => ".biome",
            RenderMode::Grass => ".grass",
            RenderMode::HeightColor => ".height_col",
            RenderMode::HeightGray => ".height_col_grayscale",
            RenderMode::BlockLight => ".light_block",
            RenderMode::SkyLight => ".light_sky",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RenderMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown render mode '{s}'")))
    }
}

/// Grid override for a pixel, if it lies on a chunk border
pub fn grid_color(chunk_x: i32, chunk_z: i32, x: usize, z: usize) -> Option<u32> {
    if x != 0 && z != 0 {
        return None;
    }
    if chunk_x == 0 && chunk_z == 0 && x == 0 && z == 0 {
        Some(ORIGIN_COLOR)
    } else {
        Some(GRID_COLOR)
    }
}

/// Packed RGB8 image, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Black image
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![0; width as usize * height as usize * 3] }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y as usize * self.width as usize + x as usize) * 3)
    }

    /// Out-of-range writes are dropped
    pub fn put(&mut self, x: u32, y: u32, color: u32) {
        if let Some(off) = self.offset(x, y) {
            self.pixels[off..off + 3].copy_from_slice(&to_bytes(color));
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        let off = self.offset(x, y)?;
        let p = &self.pixels[off..off + 3];
        Some(((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Pixel of column `(x, z)` of chunk `(chunk_x, chunk_z)` relative to the
/// chunk-space origin `(min_x, min_z)`
pub(crate) fn column_pixel(chunk_x: i32, chunk_z: i32, min_x: i32, min_z: i32, x: usize, z: usize) -> (i64, i64) {
    (
        (chunk_x - min_x) as i64 * CHUNK_WIDTH as i64 + x as i64,
        (chunk_z - min_z) as i64 * CHUNK_WIDTH as i64 + z as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names() {
        for mode in RenderMode::ALL {
            assert_eq!(mode.name().parse::<RenderMode>().unwrap(), mode);
        }
        assert!("night-vision".parse::<RenderMode>().is_err());
    }

    #[test]
    fn test_grid_colors() {
        assert_eq!(grid_color(0, 0, 0, 0), Some(ORIGIN_COLOR));
        assert_eq!(grid_color(0, 0, 3, 0), Some(GRID_COLOR));
        assert_eq!(grid_color(1, 0, 0, 0), Some(GRID_COLOR));
        assert_eq!(grid_color(0, 0, 0, 9), Some(GRID_COLOR));
        assert_eq!(grid_color(0, 0, 1, 1), None);
    }

    #[test]
    fn test_raster_put_get() {
        let mut r = Raster::new(4, 2);
        r.put(3, 1, 0x123456);
        assert_eq!(r.get(3, 1), Some(0x123456));
        assert_eq!(&r.pixels()[(4 + 3) * 3..], &[0x12, 0x34, 0x56]);
        r.put(4, 0, 0xffffff);
        assert_eq!(r.get(4, 0), None);
        assert_eq!(r.get(0, 0), Some(0));
    }
}
