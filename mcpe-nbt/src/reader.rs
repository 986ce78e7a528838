use crate::error::{NbtError, Result};

macro_rules! read_le {
    ($($name:ident -> $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                Ok(<$ty>::from_le_bytes(self.array()?))
            }
        )*
    };
}

/// Cursor over a tag stream
///
/// A read that runs past the end fails with [`NbtError::UnexpectedEof`]
/// and leaves the cursor where it was.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Rewind to an offset previously returned by [`position`](Self::position)
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());
        let end = end.ok_or(NbtError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    read_le! {
        read_u8 -> u8,
        read_i8 -> i8,
        read_u16_le -> u16,
        read_i16_le -> i16,
        read_i32_le -> i32,
        read_i64_le -> i64,
        read_f32_le -> f32,
        read_f64_le -> f64,
    }

    /// u16 length then UTF-8; invalid sequences are replaced, since sign
    /// text in old worlds is not always clean
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let len = self.read_u16_le()? as usize;
        match self.read_bytes(len) {
            Ok(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// i32 element count; negative counts are malformed
    pub fn read_len(&mut self, what: &'static str) -> Result<usize> {
        match self.read_i32_le()? {
            len if len < 0 => Err(NbtError::NegativeLength { what, len }),
            len => Ok(len as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16_le().unwrap(), 0x0302);
        assert_eq!(reader.read_i32_le().unwrap(), 0x07060504);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_signed() {
        let data = [0xff, 0xff, 0xfe, 0xff, 0xff, 0xff];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_i16_le().unwrap(), -1);
        assert_eq!(reader.read_i32_le().unwrap(), -2);
    }

    #[test]
    fn test_string() {
        let data = [0x05, 0x00, b'h', b'e', b'l', b'l', b'o'];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_string().unwrap(), "hello");
    }

    #[test]
    fn test_lossy_string() {
        let data = [0x02, 0x00, b'a', 0xff];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_string().unwrap(), "a\u{fffd}");
    }

    #[test]
    fn test_eof_does_not_advance() {
        let mut reader = BinaryReader::new(&[0x01]);
        assert!(matches!(reader.read_u16_le(), Err(NbtError::UnexpectedEof)));
        assert_eq!(reader.position(), 0);

        // declared length runs past the end
        let mut reader = BinaryReader::new(&[0x09, 0x00, b'x']);
        assert!(reader.read_string().is_err());
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn test_negative_len() {
        let data = (-3i32).to_le_bytes();
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(
            reader.read_len("byte array"),
            Err(NbtError::NegativeLength { len: -3, .. })
        ));
    }
}
