pub mod index;
pub mod level;
pub mod leveldb;
pub mod router;
pub mod store;

pub use index::{ChunkBounds, Dimension, DimensionIndex, DimensionReport, WorldBounds, WorldIndex};
pub use level::LevelInfo;
pub use router::{scan, RecordRouter, ScanOptions, ScanStats, VersionMarker};
pub use leveldb::LevelDbStore;
pub use store::{MemoryStore, Record, WorldStore};

use std::path::{Path, PathBuf};

use crate::error::Result;

/// A world directory opens as LevelDB; a plain file is read as a record dump
pub fn open_store(path: &Path) -> Result<Box<dyn WorldStore>> {
    if path.is_dir() {
        Ok(Box::new(LevelDbStore::open(path)?))
    } else {
        Ok(Box::new(MemoryStore::load_dump(path)?))
    }
}

/// `level.dat` beside the database, when the store is a world directory
pub fn default_level_path(store: &Path) -> Option<PathBuf> {
    let path = store.join("level.dat");
    path.is_file().then_some(path)
}
