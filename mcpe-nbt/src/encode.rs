use crate::error::{NbtError, Result};
use crate::tag::{Compound, NamedTag, Tag, TagKind, TagList};
use crate::writer::BinaryWriter;

/// Encode a stream of top-level named tags
pub fn encode(tags: &[NamedTag]) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::new();
    for (name, tag) in tags {
        write_named(&mut writer, name, tag)?;
    }
    Ok(writer.into_vec())
}

/// Encode a single named tag
pub fn encode_tag(name: &str, tag: &Tag) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::new();
    write_named(&mut writer, name, tag)?;
    Ok(writer.into_vec())
}

fn write_len(writer: &mut BinaryWriter, len: usize, what: &'static str) -> Result<()> {
    let count = i32::try_from(len).map_err(|_| NbtError::LengthOverflow { what, len })?;
    writer.write_i32_le(count);
    Ok(())
}

fn write_named(writer: &mut BinaryWriter, name: &str, tag: &Tag) -> Result<()> {
    writer.write_u8(tag.kind().id());
    if let Tag::End = tag {
        return Ok(());
    }
    writer.write_string(name)?;
    write_payload(writer, tag)
}

fn write_payload(writer: &mut BinaryWriter, tag: &Tag) -> Result<()> {
    match tag {
        Tag::End => {}
        Tag::Byte(v) => writer.write_i8(*v),
        Tag::Short(v) => writer.write_i16_le(*v),
        Tag::Int(v) => writer.write_i32_le(*v),
        Tag::Long(v) => writer.write_i64_le(*v),
        Tag::Float(v) => writer.write_f32_le(*v),
        Tag::Double(v) => writer.write_f64_le(*v),
        Tag::ByteArray(bytes) => {
            write_len(writer, bytes.len(), "byte array")?;
            writer.write_bytes(bytes);
        }
        Tag::String(s) => writer.write_string(s)?,
        Tag::List(list) => write_list(writer, list)?,
        Tag::Compound(compound) => write_compound(writer, compound)?,
        Tag::IntArray(values) => {
            write_len(writer, values.len(), "int array")?;
            for v in values {
                writer.write_i32_le(*v);
            }
        }
    }
    Ok(())
}

fn write_list(writer: &mut BinaryWriter, list: &TagList) -> Result<()> {
    writer.write_u8(list.kind().id());
    write_len(writer, list.len(), "list")?;
    for item in list {
        write_payload(writer, item)?;
    }
    Ok(())
}

fn write_compound(writer: &mut BinaryWriter, compound: &Compound) -> Result<()> {
    for (name, tag) in compound {
        write_named(writer, name, tag)?;
    }
    writer.write_u8(TagKind::End.id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let bytes = encode_tag("hp", &Tag::Short(20)).unwrap();
        assert_eq!(bytes, vec![0x02, 0x02, 0x00, b'h', b'p', 0x14, 0x00]);
    }

    #[test]
    fn test_encode_list_header() {
        let list = TagList::from_items(vec![Tag::Float(0.0)]).unwrap();
        let bytes = encode_tag("", &Tag::List(list)).unwrap();
        // kind, empty name, element kind, count, one float
        assert_eq!(&bytes[..8], &[0x09, 0x00, 0x00, 0x05, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn test_encode_compound_terminator() {
        let c = Compound::new().with("x", Tag::Int(1));
        let bytes = encode_tag("", &Tag::Compound(c)).unwrap();
        assert_eq!(*bytes.last().unwrap(), 0x00);
    }

    #[test]
    fn test_reject_long_string() {
        let s = "a".repeat(70_000);
        assert!(matches!(
            encode_tag("", &Tag::String(s)),
            Err(NbtError::StringTooLong { .. })
        ));
    }
}
