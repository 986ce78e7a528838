//! Per-layer images of raw terrain, for assembling into a movie

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::codec::{ChunkKey, TerrainPayload, CHUNK_HEIGHT, CHUNK_TERRAIN, CHUNK_WIDTH};
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::world::{Dimension, WorldBounds, WorldIndex, WorldStore};

use super::{column_pixel, encode::write_png, grid_color, Raster};

/// `<base>.mcpe_viz_slice.<dim>.<NNN>.png`
pub fn slice_path(base: &str, dim: Dimension, y: usize) -> PathBuf {
    PathBuf::from(format!("{base}.mcpe_viz_slice.{dim}.{y:03}.png"))
}

/// printf-style input pattern matching every [`slice_path`] of a dimension
pub fn slice_pattern(base: &str, dim: Dimension) -> String {
    format!("{base}.mcpe_viz_slice.{dim}.%03d.png")
}

/// Image-space rectangle, in overworld pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl CropRect {
    /// Parse `x,y,w,h`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("crop '{s}': expected x,y,w,h"));
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        let [x, y, w, h] = parts[..] else { return Err(invalid()) };
        if w <= 0 || h <= 0 {
            return Err(Error::InvalidArgument(format!("crop '{s}': empty rectangle")));
        }
        Ok(Self { x, y, w, h })
    }

    /// The same rectangle in a dimension drawn at `1/divisor` scale
    pub fn scaled(self, divisor: i32) -> Self {
        Self {
            x: self.x / divisor,
            y: self.y / divisor,
            w: self.w / divisor,
            h: self.h / divisor,
        }
    }

    pub fn contains(&self, ix: i64, iy: i64) -> bool {
        ix >= self.x as i64
            && ix < self.x as i64 + self.w as i64
            && iy >= self.y as i64
            && iy < self.y as i64 + self.h as i64
    }
}

impl FromStr for CropRect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

/// Draws every Y layer of a dimension into one persistent raster
pub struct SliceRenderer<'a> {
    schema: &'a Schema,
    grid: bool,
}

impl<'a> SliceRenderer<'a> {
    pub fn new(schema: &'a Schema, grid: bool) -> Self {
        Self { schema, grid }
    }

    /// Render layers 0..128, handing each finished layer to `sink`
    ///
    /// `crop` is given in overworld pixels and defaults to the whole
    /// dimension. Returns the number of layers rendered; zero when the
    /// dimension has no terrain.
    pub fn render<F>(
        &self,
        store: &dyn WorldStore,
        index: &WorldIndex,
        bounds: &WorldBounds,
        dim: Dimension,
        crop: Option<CropRect>,
        mut sink: F,
    ) -> Result<usize>
    where
        F: FnMut(usize, &Raster) -> Result<()>,
    {
        let Some(b) = bounds.get(dim) else {
            tracing::info!(dimension = %dim, "No terrain, skipping slices");
            return Ok(0);
        };
        let crop = match crop {
            Some(c) => c.scaled(dim.divisor()),
            None => CropRect { x: 0, y: 0, w: b.image_width() as i32, h: b.image_height() as i32 },
        };
        if crop.w <= 0 || crop.h <= 0 {
            return Err(Error::InvalidArgument(format!("crop {crop} is empty in the {dim}")));
        }

        let chunks = index.dimension(dim);
        let overworld = dim == Dimension::Overworld;
        let mut raster = Raster::new(crop.w as u32, crop.h as u32);

        for y in 0..CHUNK_HEIGHT {
            tracing::debug!(dimension = %dim, "Layer {y}");
            for summary in chunks.chunks() {
                let (cx, cz) = (summary.chunk_x, summary.chunk_z);
                let key = ChunkKey::new(cx, cz, dim.id(), CHUNK_TERRAIN).encode();
                let Some(payload) = store.get(&key)? else {
                    tracing::warn!(chunk_x = cx, chunk_z = cz, "Terrain vanished from store");
                    continue;
                };
                let terrain = match TerrainPayload::new(&payload) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(chunk_x = cx, chunk_z = cz, "{e}");
                        continue;
                    }
                };

                for x in 0..CHUNK_WIDTH {
                    for z in 0..CHUNK_WIDTH {
                        let (ix, iz) = column_pixel(cx, cz, b.min_x, b.min_z, x, z);
                        if !crop.contains(ix, iz) {
                            continue;
                        }
                        let id = terrain.block_id(x, z, y);
                        // keep what a lower layer drew rather than blanking the sky
                        if overworld && id == 0 && y > summary.column(x, z).top_y as usize {
                            continue;
                        }
                        let mut color = self.schema.block_color(id, terrain.block_data(x, z, y)).0;
                        if self.grid {
                            if let Some(c) = grid_color(cx, cz, x, z) {
                                color = c;
                            }
                        }
                        raster.put((ix - crop.x as i64) as u32, (iz - crop.y as i64) as u32, color);
                    }
                }
            }
            sink(y, &raster)?;
        }
        Ok(CHUNK_HEIGHT)
    }

    /// Render and write every layer next to `base`, returning the files written
    pub fn write_slices(
        &self,
        store: &dyn WorldStore,
        index: &WorldIndex,
        bounds: &WorldBounds,
        dim: Dimension,
        crop: Option<CropRect>,
        base: &str,
    ) -> Result<Vec<PathBuf>> {
        let mut files = Vec::with_capacity(CHUNK_HEIGHT);
        self.render(store, index, bounds, dim, crop, |y, raster| {
            let path = slice_path(base, dim, y);
            write_png(raster, &path)?;
            files.push(path);
            Ok(())
        })?;
        tracing::info!(dimension = %dim, layers = files.len(), "Wrote slices");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::chunk::tests::TerrainBuilder;
    use crate::codec::{BlockFilter, TerrainDecoder};
    use crate::world::MemoryStore;

    struct Fixture {
        schema: Schema,
        store: MemoryStore,
        index: WorldIndex,
        bounds: WorldBounds,
    }

    fn fixture(dim: Dimension, chunks: Vec<(i32, i32, Vec<u8>)>) -> Fixture {
        let schema = Schema::builtin().unwrap();
        let mut store = MemoryStore::new();
        for (x, z, payload) in &chunks {
            store.insert(ChunkKey::new(*x, *z, dim.id(), CHUNK_TERRAIN).encode(), payload.clone());
        }
        let mut index = WorldIndex::new(Default::default());
        let bounds = index.calc_chunk_bounds(&store, None).unwrap().clone();
        let decoder = TerrainDecoder::new(&schema);
        for (x, z, payload) in &chunks {
            let summary = decoder.decode(*x, *z, payload, &BlockFilter::default()).unwrap();
            index.dimension_mut(dim).put_chunk(summary);
        }
        Fixture { schema, store, index, bounds }
    }

    /// Pixel (0, 0) of every layer
    fn first_pixels(f: &Fixture, dim: Dimension, crop: Option<CropRect>) -> Vec<u32> {
        let mut seen = Vec::new();
        let n = SliceRenderer::new(&f.schema, false)
            .render(&f.store, &f.index, &f.bounds, dim, crop, |_, r| {
                seen.push(r.get(0, 0).unwrap());
                Ok(())
            })
            .unwrap();
        assert_eq!(n, CHUNK_HEIGHT);
        seen
    }

    fn stone_pillar() -> Vec<u8> {
        TerrainBuilder::new().block(0, 0, 0, 7, 0).block(0, 0, 1, 1, 0).build()
    }

    #[test]
    fn test_overworld_keeps_top_block_above_surface() {
        let f = fixture(Dimension::Overworld, vec![(0, 0, stone_pillar())]);
        let stone = f.schema.block(1).color;
        let pixels = first_pixels(&f, Dimension::Overworld, None);
        assert_eq!(pixels[0], f.schema.block(7).color);
        assert_eq!(pixels[1], stone);
        assert!(pixels[2..].iter().all(|&p| p == stone));
    }

    #[test]
    fn test_nether_draws_air() {
        let f = fixture(Dimension::Nether, vec![(0, 0, stone_pillar())]);
        let pixels = first_pixels(&f, Dimension::Nether, None);
        assert_eq!(pixels[1], f.schema.block(1).color);
        assert_eq!(pixels[2], f.schema.block(0).color);
        assert_eq!(pixels[127], f.schema.block(0).color);
    }

    #[test]
    fn test_underground_air_is_drawn() {
        let payload = TerrainBuilder::new()
            .block(0, 0, 0, 1, 0)
            .block(0, 0, 2, 1, 0)
            .build();
        let f = fixture(Dimension::Overworld, vec![(0, 0, payload)]);
        let pixels = first_pixels(&f, Dimension::Overworld, None);
        // y=1 is a cave below the top block at y=2
        assert_eq!(pixels[1], f.schema.block(0).color);
        assert_eq!(pixels[3], f.schema.block(1).color);
    }

    #[test]
    fn test_variant_color_uses_layer_data() {
        let payload = TerrainBuilder::new()
            .block(0, 0, 0, 0x23, 3)
            .block(0, 0, 1, 0x23, 9)
            .build();
        let f = fixture(Dimension::Overworld, vec![(0, 0, payload)]);
        let pixels = first_pixels(&f, Dimension::Overworld, None);
        assert_eq!(pixels[0], f.schema.block_color(0x23, 3).0);
        assert_eq!(pixels[1], f.schema.block_color(0x23, 9).0);
    }

    #[test]
    fn test_crop_window() {
        let payload = TerrainBuilder::new().block(5, 6, 0, 1, 0).build();
        let f = fixture(Dimension::Overworld, vec![(0, 0, payload), (1, 1, TerrainBuilder::new().build())]);
        let crop = CropRect { x: 5, y: 6, w: 4, h: 3 };
        let mut sizes = Vec::new();
        SliceRenderer::new(&f.schema, false)
            .render(&f.store, &f.index, &f.bounds, Dimension::Overworld, Some(crop), |y, r| {
                if y == 0 {
                    assert_eq!(r.get(0, 0), Some(f.schema.block(1).color));
                }
                sizes.push((r.width(), r.height()));
                Ok(())
            })
            .unwrap();
        assert!(sizes.iter().all(|&s| s == (4, 3)));
    }

    #[test]
    fn test_nether_crop_is_scaled() {
        let f = fixture(Dimension::Nether, vec![(0, 0, stone_pillar())]);
        let crop = CropRect::parse("0,0,80,40").unwrap();
        SliceRenderer::new(&f.schema, false)
            .render(&f.store, &f.index, &f.bounds, Dimension::Nether, Some(crop), |_, r| {
                assert_eq!((r.width(), r.height()), (10, 5));
                Ok(())
            })
            .unwrap();

        let tiny = CropRect::parse("0,0,4,4").unwrap();
        let err = SliceRenderer::new(&f.schema, false)
            .render(&f.store, &f.index, &f.bounds, Dimension::Nether, Some(tiny), |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_no_terrain() {
        let f = fixture(Dimension::Overworld, vec![(0, 0, stone_pillar())]);
        let n = SliceRenderer::new(&f.schema, false)
            .render(&f.store, &f.index, &f.bounds, Dimension::Nether, None, |_, _| Ok(()))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_crop_parse() {
        assert_eq!(CropRect::parse("1, -2,30,40").unwrap(), CropRect { x: 1, y: -2, w: 30, h: 40 });
        assert_eq!(CropRect { x: 17, y: -16, w: 100, h: 9 }.scaled(8), CropRect { x: 2, y: -2, w: 12, h: 1 });
        assert!(CropRect::parse("1,2,3").is_err());
        assert!(CropRect::parse("1,2,3,x").is_err());
        assert!(CropRect::parse("1,2,0,4").is_err());
        assert_eq!("8,8,16,16".parse::<CropRect>().unwrap().to_string(), "8,8,16,16");
    }

    #[test]
    fn test_slice_names() {
        assert_eq!(
            slice_path("out/world", Dimension::Nether, 7),
            PathBuf::from("out/world.mcpe_viz_slice.nether.007.png")
        );
        assert_eq!(slice_pattern("w", Dimension::Overworld), "w.mcpe_viz_slice.overworld.%03d.png");
    }

    #[test]
    fn test_write_slices() {
        let f = fixture(Dimension::Overworld, vec![(0, 0, stone_pillar())]);
        let base = std::env::temp_dir()
            .join(format!("mcpe-viz-{}-slices", std::process::id()))
            .to_string_lossy()
            .into_owned();
        let files = SliceRenderer::new(&f.schema, true)
            .write_slices(&f.store, &f.index, &f.bounds, Dimension::Overworld, None, &base)
            .unwrap();
        assert_eq!(files.len(), CHUNK_HEIGHT);
        let ok = files.iter().all(|p| std::fs::read(p).map(|b| b.starts_with(b"\x89PNG")).unwrap_or(false));
        for p in &files {
            std::fs::remove_file(p).ok();
        }
        assert!(ok);
    }
}
