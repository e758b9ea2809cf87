use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown scroll preset: {0}")]
    UnknownPreset(String),

    #[error("Lyrics provider error: {0}")]
    Lyrics(String),

    #[error("Sync service channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
