#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("tag decode: {0}")]
    Nbt(#[from] mcpe_nbt::NbtError),

    #[error("terrain payload too short: {len} bytes, need {need}")]
    ShortTerrain { len: usize, need: usize },

    #[error("{record}: missing field {field}")]
    MissingField { record: &'static str, field: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("schema: {0}")]
    Schema(String),

    #[error("store: {0}")]
    Store(String),

    #[error("image: {0}")]
    Image(String),

    #[error("video encoder: {0}")]
    Encoder(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Schema(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
