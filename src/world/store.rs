//! Ordered key/value access to a world save
//!
//! Worlds on disk are opened through [`LevelDbStore`](super::LevelDbStore).
//! [`MemoryStore`] also reads a flat dump of records:
//! `u32 LE key length, key, u32 LE value length, value`, repeated,
//! optionally gzip-compressed.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::GzDecoder;

use crate::error::{Error, Result};

/// One raw record from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Read-only ordered key/value store
pub trait WorldStore {
    /// Every record in ascending key order
    fn records(&self) -> Box<dyn Iterator<Item = Result<Record>> + '_>;

    /// Point lookup
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

/// Store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<Vec<u8>, Vec<u8>>,
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.records.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a dump file, transparently decompressing gzip
    pub fn load_dump(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::Store(format!("{}: {e}", path.display())))?;
        let mut bytes = Vec::new();
        BufReader::new(file).read_to_end(&mut bytes)?;

        let store = if bytes.starts_with(&GZIP_MAGIC) {
            let mut raw = Vec::new();
            GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut raw)
                .map_err(|e| Error::Store(format!("{}: gzip: {e}", path.display())))?;
            Self::from_dump_bytes(&raw)?
        } else {
            Self::from_dump_bytes(&bytes)?
        };

        tracing::info!(path = %path.display(), records = store.len(), "Loaded world store");
        Ok(store)
    }

    pub fn from_dump_bytes(bytes: &[u8]) -> Result<Self> {
        let mut store = Self::new();
        let mut cursor = bytes;
        while !cursor.is_empty() {
            let key = read_block(&mut cursor, "key")?;
            let value = read_block(&mut cursor, "value")?;
            store.records.insert(key, value);
        }
        Ok(store)
    }
}

fn read_block(cursor: &mut &[u8], what: &str) -> Result<Vec<u8>> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::Store(format!("truncated {what} length")))? as usize;
    if cursor.len() < len {
        return Err(Error::Store(format!("truncated {what}: need {len} bytes, have {}", cursor.len())));
    }
    let (block, rest) = cursor.split_at(len);
    *cursor = rest;
    Ok(block.to_vec())
}

impl WorldStore for MemoryStore {
    fn records(&self) -> Box<dyn Iterator<Item = Result<Record>> + '_> {
        Box::new(self.records.iter().map(|(k, v)| Ok(Record { key: k.clone(), value: v.clone() })))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.records.get(key).cloned())
    }
}
