use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to open sink '{name}': {source}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to close sink '{name}': {source}")]
    Close {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink '{0}' is not open")]
    NotOpen(String),
}
