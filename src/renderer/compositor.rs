use crate::codec::Column;
use crate::palette::{gray, HeightPalette};
use crate::schema::Schema;
use crate::world::{Dimension, WorldBounds, WorldIndex};

use super::{column_pixel, grid_color, Raster, RenderMode};

/// Renders one pixel per map column for a dimension
pub struct Compositor<'a> {
    schema: &'a Schema,
    grid: bool,
    height_color: HeightPalette,
    height_gray: HeightPalette,
}

impl<'a> Compositor<'a> {
    pub fn new(schema: &'a Schema, grid: bool) -> Self {
        Self {
            schema,
            grid,
            height_color: HeightPalette::red_black_green(),
            height_gray: HeightPalette::gray(),
        }
    }

    fn color(&self, mode: RenderMode, column: &Column) -> u32 {
        match mode {
            RenderMode::Terrain => self.schema.block_color(column.block_id, column.block_data).0,
            RenderMode::Biome => self.schema.biome_color(column.biome_id()),
            RenderMode::Grass => column.grass_rgb(),
            RenderMode::HeightColor => self.height_color.color(column.height),
            RenderMode::HeightGray => self.height_gray.color(column.height),
            RenderMode::BlockLight => gray(column.block_light() << 4),
            RenderMode::SkyLight => gray(column.sky_light() << 4),
        }
    }

    /// `None` when the dimension has no terrain
    pub fn render(&self, index: &WorldIndex, bounds: &WorldBounds, dim: Dimension, mode: RenderMode) -> Option<Raster> {
        let b = bounds.get(dim)?;
        let mut raster = Raster::new(b.image_width(), b.image_height());

        for chunk in index.dimension(dim).chunks() {
            if !b.contains(chunk.chunk_x, chunk.chunk_z) {
                continue;
            }
            for (x, z, column) in chunk.columns() {
                let mut color = self.color(mode, column);
                if self.grid {
                    if let Some(c) = grid_color(chunk.chunk_x, chunk.chunk_z, x, z) {
                        color = c;
                    }
                }
                let (ix, iy) = column_pixel(chunk.chunk_x, chunk.chunk_z, b.min_x, b.min_z, x, z);
                raster.put(ix as u32, iy as u32, color);
            }
        }

        if mode == RenderMode::Terrain {
            for (id, n) in self.needs_color(index, dim) {
                tracing::warn!("Need pixel color for: {id:x} '{}' ({n})", self.schema.block(id).name);
            }
        }

        tracing::debug!(dimension = %dim, mode = %mode, width = raster.width(), height = raster.height(), "Rendered");
        Some(raster)
    }

    /// Top blocks the tables have no color for, with their column counts
    pub fn needs_color(&self, index: &WorldIndex, dim: Dimension) -> Vec<(u8, u32)> {
        let mut counts = [0u32; 256];
        for chunk in index.dimension(dim).chunks() {
            for (_, _, column) in chunk.columns() {
                if !self.schema.block_color(column.block_id, column.block_data).1 {
                    counts[column.block_id as usize] += 1;
                }
            }
        }
        counts
            .iter()
            .enumerate()
            .filter(|(_, n)| **n > 0)
            .map(|(id, n)| (id as u8, *n))
            .collect()
    }
}
