use std::fmt::Write;

use byteorder::{ByteOrder, LittleEndian};

/// Chunk record types (last byte of a chunk key)
pub const CHUNK_TERRAIN: u8 = 0x30;
pub const CHUNK_TILE_ENTITIES: u8 = 0x31;
pub const CHUNK_ENTITIES: u8 = 0x32;
pub const CHUNK_TICK_LIST: u8 = 0x33;
pub const CHUNK_VERSION: u8 = 0x76;

/// String keys holding single tag trees that are only dumped
pub const DUMPED_KEYS: [&str; 6] = [
    "BiomeData",
    "Overworld",
    "Nether",
    "villages",
    "mVillages",
    "AutonomousEntities",
];

pub const LOCAL_PLAYER_KEY: &str = "~local_player";
pub const REMOTE_PLAYER_PREFIX: &str = "player_";
pub const PORTALS_KEY: &str = "portals";

/// Binary chunk key: `x, z [, dimension], type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
    pub dimension_id: i32,
    pub chunk_type: u8,
}

impl ChunkKey {
    pub fn new(x: i32, z: i32, dimension_id: i32, chunk_type: u8) -> Self {
        Self { x, z, dimension_id, chunk_type }
    }

    /// Parse a 9-byte (overworld) or 13-byte key
    pub fn parse(key: &[u8]) -> Option<Self> {
        match key.len() {
            9 => Some(Self {
                x: LittleEndian::read_i32(&key[0..4]),
                z: LittleEndian::read_i32(&key[4..8]),
                dimension_id: 0,
                chunk_type: key[8],
            }),
            13 => Some(Self {
                x: LittleEndian::read_i32(&key[0..4]),
                z: LittleEndian::read_i32(&key[4..8]),
                dimension_id: LittleEndian::read_i32(&key[8..12]),
                chunk_type: key[12],
            }),
            _ => None,
        }
    }

    /// Store key for this chunk; the overworld omits the dimension field
    pub fn encode(&self) -> Vec<u8> {
        let len = if self.dimension_id == 0 { 9 } else { 13 };
        let mut key = vec![0u8; len];
        LittleEndian::write_i32(&mut key[0..4], self.x);
        LittleEndian::write_i32(&mut key[4..8], self.z);
        if self.dimension_id != 0 {
            LittleEndian::write_i32(&mut key[8..12], self.dimension_id);
        }
        key[len - 1] = self.chunk_type;
        key
    }
}

/// What a store key refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Dumped(&'static str),
    LocalPlayer,
    RemotePlayer(String),
    Portals,
    Chunk(ChunkKey),
    Unknown,
}

impl RecordKey {
    /// Classify a key; string keys are matched before key lengths since some
    /// of them are nine bytes long
    pub fn classify(key: &[u8]) -> Self {
        if let Some(name) = DUMPED_KEYS.iter().find(|k| k.as_bytes() == key) {
            return RecordKey::Dumped(name);
        }
        if key == LOCAL_PLAYER_KEY.as_bytes() {
            return RecordKey::LocalPlayer;
        }
        if let Some(rest) = key.strip_prefix(REMOTE_PLAYER_PREFIX.as_bytes()) {
            return RecordKey::RemotePlayer(String::from_utf8_lossy(rest).into_owned());
        }
        if key == PORTALS_KEY.as_bytes() {
            return RecordKey::Portals;
        }
        match ChunkKey::parse(key) {
            Some(chunk) => RecordKey::Chunk(chunk),
            None => RecordKey::Unknown,
        }
    }
}

/// Hex plus printable-ASCII dump, sixteen bytes per line
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:04x}:", line * 16);
        for b in chunk {
            let _ = write!(out, " {b:02x}");
        }
        for _ in chunk.len()..16 {
            out.push_str("   ");
        }
        out.push_str("  ");
        out.extend(chunk.iter().map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' }));
        out.push('\n');
    }
    out
}
