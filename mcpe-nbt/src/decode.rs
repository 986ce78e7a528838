use crate::error::{NbtError, Result};
use crate::reader::BinaryReader;
use crate::tag::{Compound, NamedTag, Tag, TagKind, TagList};

/// Maximum nesting of lists and compounds
pub const MAX_DEPTH: usize = 512;

/// Outcome of decoding a buffer of top-level named tags
#[derive(Debug)]
pub struct Decoded {
    /// Every complete top-level tag, in stream order
    pub tags: Vec<NamedTag>,
    /// Offset just past the last complete top-level tag
    pub consumed: usize,
    /// Set when decoding stopped on malformed data; truncation is not reported
    pub error: Option<NbtError>,
}

impl Decoded {
    /// The first top-level compound, which is how most records are shaped
    pub fn root(&self) -> Option<&Compound> {
        self.tags.iter().find_map(|(_, tag)| tag.as_compound())
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Decode named tags until the buffer is exhausted
///
/// Never fails outright. Stops at the first bad tag and keeps everything
/// decoded before it; `consumed` then points at the start of that tag.
pub fn decode(buf: &[u8]) -> Decoded {
    let mut reader = BinaryReader::new(buf);
    let mut tags = Vec::new();
    let mut error = None;

    while !reader.is_empty() {
        let start = reader.position();
        match read_named(&mut reader, 0) {
            Ok(named) => tags.push(named),
            Err(e) => {
                reader.set_position(start);
                if !e.is_truncation() {
                    error = Some(e);
                }
                break;
            }
        }
    }

    Decoded { tags, consumed: reader.position(), error }
}

fn read_kind(reader: &mut BinaryReader) -> Result<TagKind> {
    let id = reader.read_u8()?;
    TagKind::from_id(id).ok_or(NbtError::InvalidTagId(id))
}

fn read_named(reader: &mut BinaryReader, depth: usize) -> Result<NamedTag> {
    let kind = read_kind(reader)?;
    if kind == TagKind::End {
        return Ok((String::new(), Tag::End));
    }
    let name = reader.read_string()?;
    let tag = read_payload(reader, kind, depth)?;
    Ok((name, tag))
}

fn read_payload(reader: &mut BinaryReader, kind: TagKind, depth: usize) -> Result<Tag> {
    if depth >= MAX_DEPTH {
        return Err(NbtError::TooDeep { max: MAX_DEPTH });
    }

    let tag = match kind {
        TagKind::End => Tag::End,
        TagKind::Byte => Tag::Byte(reader.read_i8()?),
        TagKind::Short => Tag::Short(reader.read_i16_le()?),
        TagKind::Int => Tag::Int(reader.read_i32_le()?),
        TagKind::Long => Tag::Long(reader.read_i64_le()?),
        TagKind::Float => Tag::Float(reader.read_f32_le()?),
        TagKind::Double => Tag::Double(reader.read_f64_le()?),
        TagKind::ByteArray => {
            let len = reader.read_len("byte array")?;
            Tag::ByteArray(reader.read_bytes(len)?.to_vec())
        }
        TagKind::String => Tag::String(reader.read_string()?),
        TagKind::List => Tag::List(read_list(reader, depth)?),
        TagKind::Compound => Tag::Compound(read_compound(reader, depth)?),
        TagKind::IntArray => {
            let len = reader.read_len("int array")?;
            if reader.remaining() < len.saturating_mul(4) {
                return Err(NbtError::UnexpectedEof);
            }
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(reader.read_i32_le()?);
            }
            Tag::IntArray(values)
        }
    };
    Ok(tag)
}

fn read_list(reader: &mut BinaryReader, depth: usize) -> Result<TagList> {
    let kind = read_kind(reader)?;
    let len = reader.read_len("list")?;
    let mut list = TagList::new(kind);
    if kind == TagKind::End {
        return Ok(list);
    }
    for _ in 0..len {
        list.push(read_payload(reader, kind, depth + 1)?)?;
    }
    Ok(list)
}

fn read_compound(reader: &mut BinaryReader, depth: usize) -> Result<Compound> {
    let mut compound = Compound::new();
    loop {
        let kind = read_kind(reader)?;
        if kind == TagKind::End {
            return Ok(compound);
        }
        let name = reader.read_string()?;
        let tag = read_payload(reader, kind, depth + 1)?;
        compound.insert(name, tag);
    }
}
