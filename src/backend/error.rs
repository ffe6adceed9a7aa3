use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyricbarError {
    #[error("could not determine a home directory")]
    UnrecognisedHomeDir,
    #[error("directory could not be created: {0}")]
    DirectoryNotFound(String),
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tray error: {0}")]
    Tray(String)
}
