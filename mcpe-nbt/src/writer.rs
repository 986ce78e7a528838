use crate::error::{NbtError, Result};

macro_rules! write_le {
    ($($name:ident($ty:ty)),* $(,)?) => {
        $(
            pub fn $name(&mut self, v: $ty) {
                self.data.extend_from_slice(&v.to_le_bytes());
            }
        )*
    };
}

/// Growable tag stream
#[derive(Debug, Default)]
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    write_le! {
        write_u8(u8),
        write_i8(i8),
        write_u16_le(u16),
        write_i16_le(i16),
        write_i32_le(i32),
        write_i64_le(i64),
        write_f32_le(f32),
        write_f64_le(f64),
    }

    /// u16 length then the UTF-8 bytes
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let len = u16::try_from(s.len())
            .map_err(|_| NbtError::StringTooLong { len: s.len(), max: u16::MAX as usize })?;
        self.write_u16_le(len);
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::BinaryReader;

    #[test]
    fn test_primitives_read_back() {
        let mut writer = BinaryWriter::new();
        writer.write_u8(0x42);
        writer.write_i16_le(-300);
        writer.write_i64_le(-7_000_000_000);
        writer.write_f64_le(2.5);
        writer.write_string("Text1").unwrap();

        let data = writer.into_vec();
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_i16_le().unwrap(), -300);
        assert_eq!(reader.read_i64_le().unwrap(), -7_000_000_000);
        assert_eq!(reader.read_f64_le().unwrap(), 2.5);
        assert_eq!(reader.read_string().unwrap(), "Text1");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_string_too_long() {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut writer = BinaryWriter::new();
        assert!(matches!(writer.write_string(&long), Err(NbtError::StringTooLong { .. })));
        assert!(writer.into_vec().is_empty());
    }
}
