use std::fmt;
use std::str::FromStr;

use ahash::RandomState;
use indexmap::IndexMap;

use crate::codec::{BlockFilter, ChunkSummary, RecordKey, CHUNK_TERRAIN, CHUNK_WIDTH};
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::world::store::WorldStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Overworld,
    Nether,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Overworld, Dimension::Nether];

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Dimension::Overworld),
            1 => Some(Dimension::Nether),
            _ => None,
        }
    }

    /// Unknown and negative ids (pre-0.12 players) are treated as the overworld
    pub fn from_id_or_overworld(id: i32) -> Self {
        Self::from_id(id).unwrap_or(Dimension::Overworld)
    }

    pub fn id(self) -> i32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => 1,
        }
    }

    pub fn index(self) -> usize {
        self.id() as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Overworld => "overworld",
            Dimension::Nether => "nether",
        }
    }

    /// Horizontal scale relative to the overworld
    pub fn divisor(self) -> i32 {
        match self {
            Dimension::Overworld => 1,
            Dimension::Nether => 8,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the numeric id or the name
impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Dimension::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .or_else(|| s.parse().ok().and_then(Dimension::from_id))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown dimension '{s}'")))
    }
}

/// Inclusive chunk coordinate range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl ChunkBounds {
    pub fn at(x: i32, z: i32) -> Self {
        Self { min_x: x, max_x: x, min_z: z, max_z: z }
    }

    pub fn include(&mut self, x: i32, z: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }

    pub fn width_chunks(&self) -> u32 {
        span(self.min_x, self.max_x)
    }

    pub fn height_chunks(&self) -> u32 {
        span(self.min_z, self.max_z)
    }

    pub fn image_width(&self) -> u32 {
        self.width_chunks().saturating_mul(CHUNK_WIDTH as u32)
    }

    pub fn image_height(&self) -> u32 {
        self.height_chunks().saturating_mul(CHUNK_WIDTH as u32)
    }

    /// Image sides must fit an `i32` pixel coordinate
    fn check_size(&self, dim: Dimension) -> Result<()> {
        let limit = i32::MAX as u32 / CHUNK_WIDTH as u32;
        if self.width_chunks() > limit || self.height_chunks() > limit {
            return Err(Error::InvalidArgument(format!(
                "{dim} spans {}x{} chunks, too large for an image",
                self.width_chunks(),
                self.height_chunks()
            )));
        }
        Ok(())
    }
}

fn span(min: i32, max: i32) -> u32 {
    (i64::from(max) - i64::from(min) + 1).clamp(0, i64::from(u32::MAX)) as u32
}

/// Chunk bounds of every dimension, as found by the pre-scan
///
/// Only [`WorldBounds::scan`] builds one, so anything that takes a
/// `&WorldBounds` runs after the pre-scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldBounds {
    dims: [Option<ChunkBounds>; 2],
}

impl WorldBounds {
    /// Visit the terrain keys of the first `limit` records (all when `None`)
    pub fn scan(store: &dyn WorldStore, limit: Option<usize>) -> Result<Self> {
        let mut dims: [Option<ChunkBounds>; 2] = [None, None];
        let mut visited = 0usize;
        for record in store.records().take(limit.unwrap_or(usize::MAX)) {
            let record = record?;
            visited += 1;
            let RecordKey::Chunk(key) = RecordKey::classify(&record.key) else { continue };
            if key.chunk_type != CHUNK_TERRAIN {
                continue;
            }
            let Some(dim) = Dimension::from_id(key.dimension_id) else { continue };
            dims[dim.index()]
                .get_or_insert(ChunkBounds::at(key.x, key.z))
                .include(key.x, key.z);
        }
        tracing::debug!(records = visited, "Chunk bounds pre-scan complete");
        for dim in Dimension::ALL {
            if let Some(b) = &dims[dim.index()] {
                b.check_size(dim)?;
            }
        }
        Ok(Self { dims })
    }

    pub fn get(&self, dim: Dimension) -> Option<&ChunkBounds> {
        self.dims[dim.index()].as_ref()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(overworld: Option<ChunkBounds>, nether: Option<ChunkBounds>) -> Self {
        Self { dims: [overworld, nether] }
    }
}

/// Per-dimension accumulators filled by the scan
#[derive(Debug, Clone)]
pub struct DimensionIndex {
    pub dimension: Dimension,
    pub filter: BlockFilter,
    pub chunk_types: [u32; 256],
    pub biomes: [u32; 256],
    chunks: IndexMap<(i32, i32), ChunkSummary, RandomState>,
}

impl DimensionIndex {
    pub fn new(dimension: Dimension, filter: BlockFilter) -> Self {
        Self {
            dimension,
            filter,
            chunk_types: [0; 256],
            biomes: [0; 256],
            chunks: IndexMap::with_hasher(RandomState::new()),
        }
    }

    /// Store a summary; an existing one for the same chunk is replaced in
    /// place and its biome counts are taken back out
    pub fn put_chunk(&mut self, summary: ChunkSummary) {
        for (_, _, column) in summary.columns() {
            self.biomes[column.biome_id() as usize] += 1;
        }
        if let Some(old) = self.chunks.insert((summary.chunk_x, summary.chunk_z), summary) {
            for (_, _, column) in old.columns() {
                self.biomes[column.biome_id() as usize] -= 1;
            }
        }
    }

    pub fn chunk(&self, x: i32, z: i32) -> Option<&ChunkSummary> {
        self.chunks.get(&(x, z))
    }

    pub fn chunks(&self) -> impl Iterator<Item = &ChunkSummary> {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn count_chunk_type(&mut self, chunk_type: u8) {
        self.chunk_types[chunk_type as usize] += 1;
    }
}

/// Everything the scan accumulates, per dimension
#[derive(Debug, Clone)]
pub struct WorldIndex {
    dims: [DimensionIndex; 2],
    bounds: Option<WorldBounds>,
}

impl WorldIndex {
    /// Index with the default nether hide list plus the given extra overrides
    pub fn new(extra: [BlockFilter; 2]) -> Self {
        let [mut overworld, mut nether] = [BlockFilter::default(), BlockFilter::nether_default()];
        let [extra_overworld, extra_nether] = extra;
        overworld.extend(&extra_overworld.hide, &extra_overworld.force);
        nether.extend(&extra_nether.hide, &extra_nether.force);
        Self {
            dims: [
                DimensionIndex::new(Dimension::Overworld, overworld),
                DimensionIndex::new(Dimension::Nether, nether),
            ],
            bounds: None,
        }
    }

    pub fn dimension(&self, dim: Dimension) -> &DimensionIndex {
        &self.dims[dim.index()]
    }

    pub fn dimension_mut(&mut self, dim: Dimension) -> &mut DimensionIndex {
        &mut self.dims[dim.index()]
    }

    /// Pre-scan bounds, computed on first use and cached until [`reset_bounds`](Self::reset_bounds)
    pub fn calc_chunk_bounds(&mut self, store: &dyn WorldStore, limit: Option<usize>) -> Result<&WorldBounds> {
        let bounds = match self.bounds.take() {
            Some(bounds) => bounds,
            None => WorldBounds::scan(store, limit)?,
        };
        Ok(self.bounds.insert(bounds))
    }

    pub fn bounds(&self) -> Option<&WorldBounds> {
        self.bounds.as_ref()
    }

    pub fn reset_bounds(&mut self) {
        self.bounds = None;
    }

    pub fn report<'a>(&'a self, dim: Dimension, schema: &'a Schema) -> DimensionReport<'a> {
        DimensionReport {
            index: self.dimension(dim),
            bounds: self.bounds.as_ref().and_then(|b| b.get(dim)),
            schema,
        }
    }
}

/// Human-readable statistics for one dimension
pub struct DimensionReport<'a> {
    index: &'a DimensionIndex,
    bounds: Option<&'a ChunkBounds>,
    schema: &'a Schema,
}

impl fmt::Display for DimensionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics ({}):", self.index.dimension)?;
        writeln!(f, "chunk-count: {}", self.index.chunk_count())?;
        match self.bounds {
            Some(b) => {
                writeln!(f, "Min-dim:  {} {}", b.min_x, b.min_z)?;
                writeln!(f, "Max-dim:  {} {}", b.max_x, b.max_z)?;
                writeln!(f, "diff-dim: {} {}", b.width_chunks(), b.height_chunks())?;
                writeln!(f, "pixels:   {} {}", b.image_width(), b.image_height())?;
            }
            None => writeln!(f, "no terrain")?,
        }

        writeln!(f, "Chunk Type Histogram:")?;
        for (i, n) in self.index.chunk_types.iter().enumerate().filter(|(_, n)| **n > 0) {
            writeln!(f, "hg-chunktype: {i:02x} {n:6}")?;
        }

        writeln!(f, "Biome Histogram:")?;
        for (i, n) in self.index.biomes.iter().enumerate().filter(|(_, n)| **n > 0) {
            let name = self.schema.biome_name(i as u8).unwrap_or("(unknown)");
            writeln!(f, "hg-biome: {i:02x} {n:6} ({name})")?;
        }
        Ok(())
    }
}
