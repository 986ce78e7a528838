//! World database as written by the game: LevelDB with zlib-compressed blocks
//!
//! Mojang's fork tags blocks with compressor id 2 (zlib stream) or 4 (raw
//! deflate). Both are registered alongside the stock codecs.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use rusty_leveldb::{Compressor, CompressorList, LdbIterator, Options, Status, StatusCode, DB};

use crate::error::{Error, Result};
use crate::world::store::{Record, WorldStore};

pub const ZLIB_COMPRESSOR_ID: u8 = 2;
pub const RAW_ZLIB_COMPRESSOR_ID: u8 = 4;

fn compression_error(e: std::io::Error) -> Status {
    Status::new(StatusCode::CompressionError, &e.to_string())
}

/// zlib stream with header and checksum
pub struct ZlibCompressor;

impl Compressor for ZlibCompressor {
    fn encode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&block).map_err(compression_error)?;
        enc.finish().map_err(compression_error)
    }

    fn decode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut out = Vec::new();
        ZlibDecoder::new(block.as_slice())
            .read_to_end(&mut out)
            .map_err(compression_error)?;
        Ok(out)
    }
}

/// Bare deflate, no header
pub struct RawZlibCompressor;

impl Compressor for RawZlibCompressor {
    fn encode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&block).map_err(compression_error)?;
        enc.finish().map_err(compression_error)
    }

    fn decode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut out = Vec::new();
        DeflateDecoder::new(block.as_slice())
            .read_to_end(&mut out)
            .map_err(compression_error)?;
        Ok(out)
    }
}

/// Add the game's compressors to a set of options
pub fn with_mcpe_compressors(mut opts: Options) -> Options {
    let mut list = CompressorList::new();
    list.set_with_id(ZLIB_COMPRESSOR_ID, ZlibCompressor);
    list.set_with_id(RAW_ZLIB_COMPRESSOR_ID, RawZlibCompressor);
    opts.compressor_list = Rc::new(list);
    opts
}

/// Read access to a world's `db/` directory
pub struct LevelDbStore {
    db: RefCell<DB>,
}

impl LevelDbStore {
    /// Open a world directory, or its `db` subdirectory directly
    pub fn open(path: &Path) -> Result<Self> {
        let db_path = db_dir(path);
        let opts = with_mcpe_compressors(Options { create_if_missing: false, ..Options::default() });
        let db = DB::open(&db_path, opts)
            .map_err(|e| Error::Store(format!("{}: {e}", db_path.display())))?;
        tracing::info!(path = %db_path.display(), "Opened world database");
        Ok(Self::from_db(db))
    }

    pub fn from_db(db: DB) -> Self {
        Self { db: RefCell::new(db) }
    }
}

/// `<world>/db` when it exists, else the path itself
pub fn db_dir(path: &Path) -> PathBuf {
    let nested = path.join("db");
    if nested.is_dir() {
        nested
    } else {
        path.to_path_buf()
    }
}

impl WorldStore for LevelDbStore {
    fn records(&self) -> Box<dyn Iterator<Item = Result<Record>> + '_> {
        let mut iter = match self.db.borrow_mut().new_iter() {
            Ok(iter) => iter,
            Err(e) => return Box::new(std::iter::once(Err(Error::Store(e.to_string())))),
        };
        Box::new(std::iter::from_fn(move || {
            iter.next().map(|(key, value)| Ok(Record { key: key.to_vec(), value: value.to_vec() }))
        }))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.borrow_mut().get(key).map(|v| v.to_vec()))
    }
}
