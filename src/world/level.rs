//! `level.dat`: world header and settings
//!
//! Layout: `i32 LE format version, i32 LE payload length, tag tree`.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use mcpe_nbt::{Compound, NamedTag, Tag};

use crate::error::{Error, Result};

const HEADER_LEN: usize = 8;
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    pub format_version: i32,
    root: Compound,
}

impl LevelInfo {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::UnexpectedEof);
        }
        let format_version = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let declared = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let body = &bytes[HEADER_LEN..];

        let len = usize::try_from(declared).unwrap_or(0);
        if len != body.len() {
            tracing::warn!(declared, actual = body.len(), "level.dat length mismatch");
        }
        let body = &body[..len.min(body.len())];

        let decoded = mcpe_nbt::decode(body);
        if let Some(e) = &decoded.error {
            tracing::warn!(consumed = decoded.consumed, "level.dat: {e}");
        }
        let root = decoded
            .root()
            .cloned()
            .ok_or(Error::MissingField { record: "level.dat", field: "root compound" })?;

        tracing::debug!("level.dat:\n{}", mcpe_nbt::dump_with_prefix(&decoded.tags, "level.dat: "));
        Ok(Self { format_version, root })
    }

    /// Read a bare `level.dat` or the one inside a `.mcworld` archive
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
        let info = if bytes.starts_with(&ZIP_MAGIC) {
            Self::parse(&read_level_dat(&bytes)?)?
        } else {
            Self::parse(&bytes)?
        };
        tracing::info!(
            path = %path.display(),
            version = info.format_version,
            name = info.level_name().unwrap_or("(unnamed)"),
            "Loaded level.dat"
        );
        Ok(info)
    }

    /// Serialize back to the on-disk layout
    #[cfg(test)]
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = mcpe_nbt::encode_tag("", &Tag::Compound(self.root.clone()))?;
        let len = i32::try_from(body.len()).map_err(|_| Error::InvalidArgument("level.dat too large".into()))?;
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&self.format_version.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn root(&self) -> &Compound {
        &self.root
    }

    pub fn tags(&self) -> Vec<NamedTag> {
        vec![(String::new(), Tag::Compound(self.root.clone()))]
    }

    pub fn spawn(&self) -> Option<[i32; 3]> {
        Some([
            self.root.get_int("SpawnX")?,
            self.root.get_int("SpawnY")?,
            self.root.get_int("SpawnZ")?,
        ])
    }

    pub fn level_name(&self) -> Option<&str> {
        self.root.get_str("LevelName")
    }

    /// Older saves store the seed as an int, newer ones as a long
    pub fn seed(&self) -> Option<i64> {
        self.root
            .get_long("RandomSeed")
            .or_else(|| self.root.get_int("RandomSeed").map(i64::from))
    }
}

fn read_level_dat(archive_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| Error::Store(format!("zip: {e}")))?;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| Error::Store(format!("zip: {e}")))?;
        if file.name() == "level.dat" || file.name().ends_with("/level.dat") {
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            return Ok(data);
        }
    }
    Err(Error::Store("archive has no level.dat".into()))
}
