// Metadata Mapper Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Mapping entry '{path}': {source}")]
    MappingEntry {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Invalid filename pattern: {0}")]
    InvalidPattern(String),

    #[error("Performer unresolvable: {0}")]
    PerformerUnresolvable(String),

    #[error("Catalog field unresolvable: {0}")]
    CatalogFieldUnresolvable(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for MapperError {
    fn from(err: anyhow::Error) -> Self {
        MapperError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
