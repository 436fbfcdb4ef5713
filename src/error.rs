use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cocoprep operations.
#[derive(Debug, Error)]
pub enum CocoprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Category not found in source document: {}", names.join(", "))]
    CategoryNotFound { names: Vec<String> },

    #[error("Malformed COCO input at '{field}': {message}")]
    MalformedInput { field: String, message: String },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write YAML to {path}: {source}")]
    YamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    DatasetLayout { path: PathBuf, message: String },

    #[error("Image file not found: {path}")]
    MissingImage { path: PathBuf },

    #[error("Invalid split: {message}")]
    InvalidSplit { message: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl CocoprepError {
    /// Wraps an IO error together with the path it happened on.
    pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CocoprepError::IoAt { path, source }
    }

    pub(crate) fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        CocoprepError::MalformedInput {
            field: field.into(),
            message: message.into(),
        }
    }
}
