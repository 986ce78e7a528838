pub mod chunk;
pub mod key;

pub use chunk::{
    BlockFilter, ChunkSummary, Column, TerrainDecoder, TerrainPayload,
    CHUNK_HEIGHT, CHUNK_WIDTH, TERRAIN_LEN,
};
pub use key::{
    hex_dump, ChunkKey, RecordKey,
    CHUNK_ENTITIES, CHUNK_TERRAIN, CHUNK_TICK_LIST, CHUNK_TILE_ENTITIES, CHUNK_VERSION,
};
