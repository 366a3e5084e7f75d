use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Template {} changed on disk since it was loaded (expected {expected}, found {found})", .path.display())]
    Conflict {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Failed to serialize template: {0}")]
    Serialize(String),
}
