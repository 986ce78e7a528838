//! Single ordered pass over the store, routing each record by key shape

use mcpe_nbt::{NamedTag, Tag};
use tracing::Level;

use crate::codec::{
    hex_dump, ChunkKey, RecordKey, TerrainDecoder, CHUNK_ENTITIES, CHUNK_TERRAIN, CHUNK_TICK_LIST,
    CHUNK_TILE_ENTITIES, CHUNK_VERSION,
};
use crate::error::Result;
use crate::features::FeatureCollector;
use crate::model::{Entity, EntityOrigin, Portal, TileEntity, TileEntityKind};
use crate::schema::Schema;
use crate::world::index::{Dimension, WorldIndex};
use crate::world::store::{Record, WorldStore};

const PROGRESS_EVERY: usize = 10_000;

/// World format version this reader understands
pub const KNOWN_FORMAT_VERSION: u8 = 2;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Stop after this many records (pre-scan and main pass alike)
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub records: usize,
    pub terrain_chunks: usize,
    pub entities: usize,
    pub tile_entities: usize,
    pub portals: usize,
    pub unknown_keys: usize,
    pub skipped: usize,
}

/// Per-chunk world format version record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionMarker(pub Option<u8>);

impl VersionMarker {
    pub fn parse(value: &[u8]) -> Self {
        Self(value.first().copied())
    }

    /// The expected version is only interesting in verbose runs
    pub fn log_level(self) -> Level {
        match self.0 {
            Some(KNOWN_FORMAT_VERSION) => Level::DEBUG,
            _ => Level::WARN,
        }
    }
}

/// Routes records into the index and the feature list
pub struct RecordRouter<'a> {
    schema: &'a Schema,
    decoder: TerrainDecoder<'a>,
    index: &'a mut WorldIndex,
    features: &'a mut FeatureCollector,
    stats: ScanStats,
}

impl<'a> RecordRouter<'a> {
    pub fn new(schema: &'a Schema, index: &'a mut WorldIndex, features: &'a mut FeatureCollector) -> Self {
        Self {
            schema,
            decoder: TerrainDecoder::new(schema),
            index,
            features,
            stats: ScanStats::default(),
        }
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn into_stats(self) -> ScanStats {
        self.stats
    }

    pub fn route(&mut self, record: &Record) {
        self.stats.records += 1;
        match RecordKey::classify(&record.key) {
            RecordKey::Dumped(name) => {
                let tags = decode_logged(name, &record.value);
                tracing::debug!("{name} value:\n{}", mcpe_nbt::dump_with_prefix(&tags, &format!("{name}: ")));
            }
            RecordKey::LocalPlayer => self.route_entities(&record.value, 0, EntityOrigin::LocalPlayer),
            RecordKey::RemotePlayer(name) => {
                tracing::debug!(player = %name, "Remote player record");
                self.route_entities(&record.value, 0, EntityOrigin::RemotePlayer);
            }
            RecordKey::Portals => self.route_portals(&record.value),
            RecordKey::Chunk(key) => self.route_chunk(key, &record.value),
            RecordKey::Unknown => {
                self.stats.unknown_keys += 1;
                tracing::warn!(
                    "Unknown key size ({}):\nkey:\n{}value:\n{}",
                    record.key.len(),
                    hex_dump(&record.key),
                    hex_dump(&record.value)
                );
                let tags = decode_logged("unknown key", &record.value);
                tracing::debug!("Attempted tag decode:\n{}", mcpe_nbt::dump(&tags));
            }
        }
    }

    fn route_chunk(&mut self, key: ChunkKey, value: &[u8]) {
        let Some(dim) = Dimension::from_id(key.dimension_id) else {
            tracing::info!(dimension_id = key.dimension_id, "Found new dimension id; record skipped");
            self.stats.skipped += 1;
            return;
        };
        self.index.dimension_mut(dim).count_chunk_type(key.chunk_type);
        tracing::trace!(dimension = %dim, x = key.x, z = key.z, "chunk type 0x{:x}", key.chunk_type);

        match key.chunk_type {
            CHUNK_TERRAIN => self.route_terrain(dim, key, value),
            CHUNK_TILE_ENTITIES => self.route_tile_entities(dim, value),
            CHUNK_ENTITIES => self.route_entities(value, dim.id(), EntityOrigin::Mob),
            CHUNK_TICK_LIST => {
                let tags = decode_logged("tick list", value);
                tracing::debug!("{dim} tick list:\n{}", mcpe_nbt::dump_with_prefix(&tags, "0x33-tick: "));
            }
            CHUNK_VERSION => {
                let marker = VersionMarker::parse(value);
                let v = marker.0.map(i32::from).unwrap_or(-1);
                if marker.log_level() == Level::DEBUG {
                    tracing::debug!("{dim} chunk {} {} world format version: v={v}", key.x, key.z);
                } else {
                    tracing::warn!("{dim} chunk {} {} unexpected world format version: v={v}", key.x, key.z);
                }
            }
            other => {
                tracing::info!(
                    "{dim} unknown chunk type 0x{other:x} length={}:\n{}",
                    value.len(),
                    hex_dump(value)
                );
            }
        }
    }

    fn route_terrain(&mut self, dim: Dimension, key: ChunkKey, value: &[u8]) {
        let filter = &self.index.dimension(dim).filter;
        let summary = match self.decoder.decode(key.x, key.z, value, filter) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(dimension = %dim, x = key.x, z = key.z, "Skipping terrain: {e}");
                self.stats.skipped += 1;
                return;
            }
        };

        if tracing::enabled!(Level::TRACE) {
            if let Ok(histo) = self.decoder.block_histogram(value) {
                for (id, n) in histo.iter().enumerate().filter(|(_, n)| **n > 0) {
                    tracing::trace!("{dim}-hg: {id:02x}: {n:6} ({})", self.schema.block(id as u8).name);
                }
            }
        }

        self.index.dimension_mut(dim).put_chunk(summary);
        self.stats.terrain_chunks += 1;
    }

    fn route_entities(&mut self, value: &[u8], record_dimension: i32, origin: EntityOrigin) {
        for (name, tag) in decode_logged("entity", value) {
            let Tag::Compound(c) = &tag else {
                tracing::warn!(name = %name, kind = tag.kind().name(), "Entity record holds a non-compound tag");
                continue;
            };
            let entity = Entity::from_compound(c, origin);
            self.features.add_entity(&entity, record_dimension, self.schema);
            self.stats.entities += 1;
        }
    }

    fn route_tile_entities(&mut self, dim: Dimension, value: &[u8]) {
        for (name, tag) in decode_logged("tile entity", value) {
            let Tag::Compound(c) = &tag else {
                tracing::warn!(name = %name, kind = tag.kind().name(), "Tile entity record holds a non-compound tag");
                continue;
            };
            match TileEntity::from_compound(c) {
                tile if tile.is_reportable() => {
                    self.features.add_tile_entity(&tile, dim.id(), self.schema);
                    self.stats.tile_entities += 1;
                }
                TileEntity { kind: TileEntityKind::Unrecognized(id), .. } => {
                    tracing::info!("Unknown tile entity id=({id})");
                }
                tile => tracing::debug!(kind = ?tile.kind, "Tile entity without details"),
            }
        }
    }

    fn route_portals(&mut self, value: &[u8]) {
        let tags = decode_logged("portals", value);
        tracing::debug!("portals value:\n{}", mcpe_nbt::dump_with_prefix(&tags, "portals: "));
        let Some(root) = tags.iter().find_map(|(_, t)| t.as_compound()) else {
            tracing::warn!("Portal record has no root compound");
            return;
        };
        for portal in Portal::list_from_root(root) {
            match portal {
                Ok(portal) => {
                    self.features.add_portal(&portal);
                    self.stats.portals += 1;
                }
                Err(e) => tracing::warn!("Skipping portal: {e}"),
            }
        }
    }
}

/// Decode a value, logging malformed data; truncation stays silent
fn decode_logged(what: &str, value: &[u8]) -> Vec<NamedTag> {
    let decoded = mcpe_nbt::decode(value);
    if let Some(e) = &decoded.error {
        tracing::warn!(record = what, consumed = decoded.consumed, "Malformed tag data: {e}");
    }
    decoded.tags
}

/// Main pass: every record in key order, up to the configured limit
pub fn scan(
    store: &dyn WorldStore,
    schema: &Schema,
    index: &mut WorldIndex,
    features: &mut FeatureCollector,
    options: &ScanOptions,
) -> Result<ScanStats> {
    tracing::info!("Parse all records");
    let mut router = RecordRouter::new(schema, index, features);
    for record in store.records().take(options.limit.unwrap_or(usize::MAX)) {
        let record = record?;
        router.route(&record);
        let n = router.stats().records;
        if n % PROGRESS_EVERY == 0 {
            tracing::info!("Reading records: {n}");
        }
    }
    let stats = router.into_stats();
    tracing::info!(
        records = stats.records,
        terrain = stats.terrain_chunks,
        entities = stats.entities,
        tile_entities = stats.tile_entities,
        portals = stats.portals,
        "Read all records"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::chunk::tests::TerrainBuilder;
    use crate::codec::BlockFilter;
    use crate::features::Projection;
    use crate::world::store::MemoryStore;
    use mcpe_nbt::{Compound, TagList};

    fn encode(c: Compound) -> Vec<u8> {
        mcpe_nbt::encode_tag("", &Tag::Compound(c)).unwrap()
    }

    fn run(store: &MemoryStore, extra: [BlockFilter; 2]) -> (WorldIndex, FeatureCollector, ScanStats) {
        let schema = Schema::builtin().unwrap();
        let mut index = WorldIndex::new(extra);
        let bounds = index.calc_chunk_bounds(store, None).unwrap().clone();
        let mut features = FeatureCollector::new(Projection::new(&bounds));
        let stats = scan(store, &schema, &mut index, &mut features, &ScanOptions::default()).unwrap();
        (index, features, stats)
    }

    fn sign(x: i32, z: i32) -> Compound {
        Compound::new()
            .with("id", Tag::String("Sign".into()))
            .with("x", Tag::Int(x))
            .with("y", Tag::Int(64))
            .with("z", Tag::Int(z))
            .with("Text1", Tag::String("a".into()))
            .with("Text2", Tag::String("b".into()))
            .with("Text3", Tag::String("c".into()))
            .with("Text4", Tag::String("d".into()))
    }

    #[test]
    fn test_version_marker_levels() {
        assert_eq!(VersionMarker::parse(&[2]).log_level(), Level::DEBUG);
        assert_eq!(VersionMarker::parse(&[3]).log_level(), Level::WARN);
        assert_eq!(VersionMarker::parse(&[]).log_level(), Level::WARN);
    }

    #[test]
    fn test_routes_terrain_and_features() {
        let mut store = MemoryStore::new();
        let terrain = TerrainBuilder::new().block(0, 0, 5, 2, 0).column(0, 0, 6, 0x1f953e_01).build();
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TERRAIN).encode(), terrain.clone());
        store.insert(ChunkKey::new(3, 1, 1, CHUNK_TERRAIN).encode(), terrain);
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TILE_ENTITIES).encode(), encode(sign(1, 2)));
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_VERSION).encode(), vec![2]);

        let (index, features, stats) = run(&store, Default::default());
        assert_eq!(stats.records, 4);
        assert_eq!(stats.terrain_chunks, 2);
        assert_eq!(stats.tile_entities, 1);

        let ow = index.dimension(Dimension::Overworld);
        assert_eq!(ow.chunk(0, 0).unwrap().column(0, 0).block_id, 2);
        assert_eq!(ow.chunk_types[CHUNK_TERRAIN as usize], 1);
        assert_eq!(ow.chunk_types[CHUNK_VERSION as usize], 1);
        assert_eq!(ow.biomes[1], 1);
        assert_eq!(ow.biomes[0], 255);
        assert_eq!(index.dimension(Dimension::Nether).chunk_count(), 1);

        assert_eq!(features.len(), 1);
        assert_eq!(features.features()[0].properties["Name"], serde_json::json!("Sign"));
    }

    #[test]
    fn test_tile_entity_without_position_is_kept() {
        let mut store = MemoryStore::new();
        let terrain = TerrainBuilder::new().block(0, 0, 5, 2, 0).build();
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TERRAIN).encode(), terrain);
        let no_pos = Compound::new()
            .with("id", Tag::String("Sign".into()))
            .with("Text1", Tag::String("lost".into()));
        let mut value = encode(sign(1, 2));
        value.extend(encode(no_pos));
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TILE_ENTITIES).encode(), value);
        // nine bytes ending in 0x30; a player, not terrain
        store.insert(b"player_10".to_vec(), encode(Compound::new()));

        let (index, features, stats) = run(&store, Default::default());
        assert_eq!(stats.tile_entities, 2);
        assert_eq!(features.len(), 1);
        assert_eq!(index.bounds().unwrap().get(Dimension::Overworld).unwrap().width_chunks(), 1);
    }

    #[test]
    fn test_hide_list_override() {
        // grass over stone, grass hidden in the overworld
        let mut store = MemoryStore::new();
        let terrain = TerrainBuilder::new().block(0, 0, 10, 2, 0).block(0, 0, 4, 1, 0).build();
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TERRAIN).encode(), terrain);
        let extra = [BlockFilter { hide: vec![2], force: vec![] }, BlockFilter::default()];
        let (index, _, _) = run(&store, extra);
        let col = *index.dimension(Dimension::Overworld).chunk(0, 0).unwrap().column(0, 0);
        assert_eq!(col.block_id, 1);
        assert_eq!(col.top_y, 4);
    }

    #[test]
    fn test_string_keys_before_lengths() {
        let mut store = MemoryStore::new();
        // nine bytes long, but not a chunk key
        store.insert(b"Overworld".to_vec(), encode(Compound::new().with("a", Tag::Int(1))));
        store.insert(b"BiomeData".to_vec(), vec![]);
        let (index, _, stats) = run(&store, Default::default());
        assert_eq!(stats.records, 2);
        assert_eq!(stats.unknown_keys, 0);
        assert!(index.dimension(Dimension::Overworld).chunk_types.iter().all(|n| *n == 0));
    }

    #[test]
    fn test_local_player_and_portals() {
        let pos = TagList::from_items(vec![Tag::Float(1.0), Tag::Float(64.0), Tag::Float(1.0)]).unwrap();
        let player = Compound::new().with("Pos", Tag::List(pos)).with("id", Tag::Int(63));
        let portal = Compound::new()
            .with("DimId", Tag::Int(0))
            .with("Span", Tag::Byte(2))
            .with("TpX", Tag::Int(3))
            .with("TpY", Tag::Int(64))
            .with("TpZ", Tag::Int(3))
            .with("Xa", Tag::Byte(1))
            .with("Za", Tag::Byte(0));
        let records = TagList::from_items(vec![Tag::Compound(portal)]).unwrap();
        let portals = Compound::new().with("data", Tag::Compound(Compound::new().with("PortalRecords", Tag::List(records))));

        let mut store = MemoryStore::new();
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TERRAIN).encode(), TerrainBuilder::new().build());
        store.insert(b"~local_player".to_vec(), encode(player));
        store.insert(b"portals".to_vec(), encode(portals));

        let (_, features, stats) = run(&store, Default::default());
        assert_eq!(stats.entities, 1);
        assert_eq!(stats.portals, 1);
        assert_eq!(features.player_position(), Some((1, 14)));
        // "portals" sorts before "~local_player"
        assert_eq!(features.features()[0].properties["Name"], serde_json::json!("NetherPortal"));
        assert_eq!(features.features()[1].properties["player"], serde_json::json!("true"));
    }

    #[test]
    fn test_unknown_records_do_not_abort() {
        let mut store = MemoryStore::new();
        store.insert(vec![1, 2, 3], vec![0xff, 0x00]);
        store.insert(ChunkKey::new(0, 0, 7, CHUNK_TERRAIN).encode(), vec![]);
        store.insert(ChunkKey::new(0, 0, 0, CHUNK_TERRAIN).encode(), vec![0; 100]);
        store.insert(ChunkKey::new(0, 0, 0, 0x35).encode(), vec![1, 2, 3]);
        let (index, _, stats) = run(&store, Default::default());
        assert_eq!(stats.records, 4);
        assert_eq!(stats.unknown_keys, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(index.dimension(Dimension::Overworld).chunk_count(), 0);
    }

    #[test]
    fn test_limit_applies_to_main_pass() {
        let mut store = MemoryStore::new();
        for x in 0..4 {
            store.insert(ChunkKey::new(x, 0, 0, CHUNK_TERRAIN).encode(), TerrainBuilder::new().build());
        }
        let schema = Schema::builtin().unwrap();
        let mut index = WorldIndex::new(Default::default());
        let options = ScanOptions { limit: Some(3) };
        let bounds = index.calc_chunk_bounds(&store, options.limit).unwrap().clone();
        let mut features = FeatureCollector::new(Projection::new(&bounds));
        let stats = scan(&store, &schema, &mut index, &mut features, &options).unwrap();
        assert_eq!(stats.terrain_chunks, 3);
    }
}
