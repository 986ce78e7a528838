use std::fmt::Write;

use crate::tag::{NamedTag, Tag};

/// Render tags as an indented tree, one value per line
pub fn dump(tags: &[NamedTag]) -> String {
    dump_with_prefix(tags, "")
}

/// Same as [`dump`] with every line starting with `prefix`
pub fn dump_with_prefix(tags: &[NamedTag], prefix: &str) -> String {
    let mut out = String::new();
    for (name, tag) in tags {
        write_tag(&mut out, prefix, 0, name, tag);
    }
    out
}

fn indent(out: &mut String, prefix: &str, level: usize) {
    out.push_str(prefix);
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_tag(out: &mut String, prefix: &str, level: usize, name: &str, tag: &Tag) {
    indent(out, prefix, level);
    // writing into a String cannot fail
    let _ = match tag {
        Tag::End => writeln!(out, "END"),
        Tag::Byte(v) => writeln!(out, "[{name}] {v} 0x{:x} (byte)", *v as u8),
        Tag::Short(v) => writeln!(out, "[{name}] {v} 0x{:x} (short)", *v as u16),
        Tag::Int(v) => writeln!(out, "[{name}] {v} 0x{:x} (int)", *v as u32),
        Tag::Long(v) => writeln!(out, "[{name}] {v} 0x{:x} (long)", *v as u64),
        Tag::Float(v) => writeln!(out, "[{name}] {v:.6} (float)"),
        Tag::Double(v) => writeln!(out, "[{name}] {v:.6} (double)"),
        Tag::ByteArray(bytes) => writeln!(out, "[{name}] [{} bytes] (byte array)", bytes.len()),
        Tag::String(s) => writeln!(out, "[{name}] '{s}' (string)"),
        Tag::IntArray(values) => writeln!(out, "[{name}] {values:?} (int array)"),
        Tag::List(list) => {
            let _ = writeln!(out, "[{name}] LIST of {} ({}) {{", list.kind().name(), list.len());
            for item in list {
                write_tag(out, prefix, level + 1, "", item);
            }
            indent(out, prefix, level);
            writeln!(out, "}} LIST")
        }
        Tag::Compound(compound) => {
            let _ = writeln!(out, "[{name}] COMPOUND {{");
            for (child, value) in compound {
                write_tag(out, prefix, level + 1, child, value);
            }
            indent(out, prefix, level);
            writeln!(out, "}} COMPOUND")
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{Compound, TagList};

    #[test]
    fn test_dump_scalar() {
        let out = dump(&[("hp".to_string(), Tag::Int(5))]);
        assert_eq!(out, "[hp] 5 0x5 (int)\n");
    }

    #[test]
    fn test_dump_nested() {
        let list = TagList::from_items(vec![Tag::Float(1.0)]).unwrap();
        let root = Compound::new()
            .with("id", Tag::String("Sign".into()))
            .with("Pos", Tag::List(list));
        let out = dump_with_prefix(&[(String::new(), Tag::Compound(root))], "> ");
        let expected = "\
> [] COMPOUND {
>   [id] 'Sign' (string)
>   [Pos] LIST of float (1) {
>     [] 1.000000 (float)
>   } LIST
> } COMPOUND
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dump_negative_hex() {
        let out = dump(&[("b".to_string(), Tag::Byte(-1))]);
        assert_eq!(out, "[b] -1 0xff (byte)\n");
    }
}
