//! Little-endian NBT ("tag format") support for MCPE world saves
//!
//! Architecture:
//! 1. `reader` / `writer` - Little-endian byte cursors
//! 2. `tag` - Closed tag enum, typed lists and ordered compounds
//! 3. `decode` - Lenient recursive-descent decoder for a stream of named tags
//! 4. `encode` - Exact inverse of the decoder
//! 5. `dump` - Indented text rendering for logs

mod error;
mod reader;
mod writer;
mod tag;
mod decode;
mod encode;
mod dump;

pub use error::{NbtError, Result};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use tag::{Compound, NamedTag, Tag, TagKind, TagList};
pub use decode::{decode, Decoded, MAX_DEPTH};
pub use encode::{encode, encode_tag};
pub use dump::{dump, dump_with_prefix};
