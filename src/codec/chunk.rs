use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::schema::Schema;

pub const CHUNK_WIDTH: usize = 16;
pub const CHUNK_HEIGHT: usize = 128;
pub const COLUMNS: usize = CHUNK_WIDTH * CHUNK_WIDTH;

const BLOCKS: usize = COLUMNS * CHUNK_HEIGHT;
const DATA_OFFSET: usize = BLOCKS;
const SKY_LIGHT_OFFSET: usize = DATA_OFFSET + BLOCKS / 2;
const BLOCK_LIGHT_OFFSET: usize = SKY_LIGHT_OFFSET + BLOCKS / 2;
const HEIGHT_OFFSET: usize = BLOCK_LIGHT_OFFSET + BLOCKS / 2;
const GRASS_OFFSET: usize = HEIGHT_OFFSET + COLUMNS;

/// Size of a complete terrain record
pub const TERRAIN_LEN: usize = GRASS_OFFSET + COLUMNS * 4;

/// Read-only view over a terrain record
///
/// Planes are column-major with x outermost: `(x*16 + z)*128 + y`.
#[derive(Debug, Clone, Copy)]
pub struct TerrainPayload<'a> {
    data: &'a [u8],
}

impl<'a> TerrainPayload<'a> {
    /// Wrap a payload; shorter than [`TERRAIN_LEN`] is an error, trailing bytes are ignored
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < TERRAIN_LEN {
            return Err(Error::ShortTerrain { len: data.len(), need: TERRAIN_LEN });
        }
        Ok(Self { data })
    }

    #[inline]
    fn offset(x: usize, z: usize, y: usize) -> usize {
        (x * CHUNK_WIDTH + z) * CHUNK_HEIGHT + y
    }

    #[inline]
    fn nibble(&self, base: usize, x: usize, z: usize, y: usize) -> u8 {
        let off = Self::offset(x, z, y);
        let v = self.data[base + off / 2];
        if off % 2 == 0 { v & 0x0f } else { v >> 4 }
    }

    pub fn block_id(&self, x: usize, z: usize, y: usize) -> u8 {
        self.data[Self::offset(x, z, y)]
    }

    pub fn block_data(&self, x: usize, z: usize, y: usize) -> u8 {
        self.nibble(DATA_OFFSET, x, z, y)
    }

    pub fn sky_light(&self, x: usize, z: usize, y: usize) -> u8 {
        self.nibble(SKY_LIGHT_OFFSET, x, z, y)
    }

    pub fn block_light(&self, x: usize, z: usize, y: usize) -> u8 {
        self.nibble(BLOCK_LIGHT_OFFSET, x, z, y)
    }

    pub fn height(&self, x: usize, z: usize) -> u8 {
        self.data[HEIGHT_OFFSET + x * CHUNK_WIDTH + z]
    }

    pub fn grass_biome(&self, x: usize, z: usize) -> u32 {
        let off = GRASS_OFFSET + (x * CHUNK_WIDTH + z) * 4;
        LittleEndian::read_u32(&self.data[off..off + 4])
    }
}

/// Summary of one map column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Column {
    pub block_id: u8,
    pub block_data: u8,
    /// `(sky << 4) | block`
    pub light: u8,
    pub top_y: u8,
    pub height: u8,
    /// Low byte biome id, upper 24 bits grass RGB
    pub grass_biome: u32,
}

impl Column {
    pub fn biome_id(&self) -> u8 {
        (self.grass_biome & 0xff) as u8
    }

    pub fn grass_rgb(&self) -> u32 {
        self.grass_biome >> 8
    }

    pub fn sky_light(&self) -> u8 {
        self.light >> 4
    }

    pub fn block_light(&self) -> u8 {
        self.light & 0x0f
    }
}

/// Top-layer summary of a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    pub chunk_x: i32,
    pub chunk_z: i32,
    columns: Vec<Column>,
}

impl ChunkSummary {
    pub fn new(chunk_x: i32, chunk_z: i32) -> Self {
        Self { chunk_x, chunk_z, columns: vec![Column::default(); COLUMNS] }
    }

    pub fn column(&self, x: usize, z: usize) -> &Column {
        &self.columns[z * CHUNK_WIDTH + x]
    }

    fn column_mut(&mut self, x: usize, z: usize) -> &mut Column {
        &mut self.columns[z * CHUNK_WIDTH + x]
    }

    pub fn columns(&self) -> impl Iterator<Item = (usize, usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (i % CHUNK_WIDTH, i / CHUNK_WIDTH, c))
    }
}

/// Per-dimension top-block visibility overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFilter {
    /// Never chosen as the top block while something else is below
    pub hide: Vec<u8>,
    /// Always chosen as the top block, even under another candidate
    pub force: Vec<u8>,
}

impl BlockFilter {
    /// Bedrock, netherrack and lava hide the interesting parts of the nether
    pub fn nether_default() -> Self {
        Self { hide: vec![0x07, 0x57, 0x0a, 0x0b], force: Vec::new() }
    }

    pub fn is_hidden(&self, id: u8) -> bool {
        self.hide.contains(&id)
    }

    pub fn is_forced(&self, id: u8) -> bool {
        self.force.contains(&id)
    }

    pub fn extend(&mut self, hide: &[u8], force: &[u8]) {
        self.hide.extend_from_slice(hide);
        self.force.extend_from_slice(force);
    }
}

/// Turns raw terrain records into [`ChunkSummary`] values
pub struct TerrainDecoder<'a> {
    schema: &'a Schema,
}

impl<'a> TerrainDecoder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn decode(&self, chunk_x: i32, chunk_z: i32, payload: &[u8], filter: &BlockFilter) -> Result<ChunkSummary> {
        let terrain = TerrainPayload::new(payload)?;
        let mut summary = ChunkSummary::new(chunk_x, chunk_z);

        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                let column = summary.column_mut(x, z);
                if let Some(y) = top_block_y(&terrain, x, z, filter) {
                    let id = terrain.block_id(x, z, y);
                    let light_y = if self.schema.is_solid(id) { (y + 1).min(CHUNK_HEIGHT - 1) } else { y };
                    column.block_id = id;
                    column.block_data = terrain.block_data(x, z, y);
                    column.light = (terrain.sky_light(x, z, light_y) << 4) | terrain.block_light(x, z, light_y);
                    column.top_y = y as u8;
                }
                column.height = terrain.height(x, z);
                column.grass_biome = terrain.grass_biome(x, z);
            }
        }

        Ok(summary)
    }

    /// Count of every block id in the chunk
    pub fn block_histogram(&self, payload: &[u8]) -> Result<[u32; 256]> {
        TerrainPayload::new(payload)?;
        let mut histo = [0u32; 256];
        for &id in &payload[..BLOCKS] {
            histo[id as usize] += 1;
        }
        Ok(histo)
    }
}

/// Y of the visible top block of a column, scanning down from the sky
///
/// Air never becomes the top block. A hidden candidate is replaced by the
/// next non-air block below it; a forced block replaces any candidate.
fn top_block_y(terrain: &TerrainPayload, x: usize, z: usize, filter: &BlockFilter) -> Option<usize> {
    let mut top: Option<(usize, u8)> = None;
    for y in (0..CHUNK_HEIGHT).rev() {
        let id = terrain.block_id(x, z, y);
        if id == 0 {
            continue;
        }
        let replace = match top {
            None => true,
            Some((_, current)) => filter.is_forced(id) || (filter.is_hidden(current) && !filter.is_forced(current)),
        };
        if replace {
            top = Some((y, id));
        }
    }
    top.map(|(y, _)| y)
}
