// Project persistence for sinesth
// JSON export/import of the whole timeline, plus autosave to a key-value store

pub mod autosave;
pub mod serialization;
pub mod storage;
pub mod types;

use crate::store::EditError;

pub use autosave::{AUTOSAVE_KEY, AutoSave};
pub use serialization::export_filename;
pub use storage::{FileStorage, MemoryStorage, ProjectStorage};
pub use types::{ImportReport, PROJECT_FORMAT_VERSION, ProjectFile, TimelineRecord};

pub type ProjectResult<T> = Result<T, ProjectError>;

/// Project error types
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Invalid project: {0}")]
    InvalidProject(String),

    #[error("Unsupported project format version {0}")]
    UnsupportedVersion(u64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Edit rejected: {0}")]
    Edit(#[from] EditError),
}
