use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UstibbError {
    #[error("Category rules not found: {path}")]
    RulesNotFound { path: PathBuf },

    #[error("Duplicate category code: {code}")]
    DuplicateCategory { code: String },

    #[error("Invalid change status: '{status}' - expected a letter such as A, M or D")]
    InvalidStatus { status: String },

    #[error("Repositories directory does not exist: {path}")]
    ReposDirNotFound { path: PathBuf },

    #[error("Output directory does not exist: {path}")]
    OutputDirNotFound { path: PathBuf },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(String),
}

pub type Result<T> = std::result::Result<T, UstibbError>;

impl UstibbError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RulesNotFound { .. } => 2,
            Self::ReposDirNotFound { .. } | Self::OutputDirNotFound { .. } => 3,
            Self::DuplicateCategory { .. } => 4,
            Self::ConfigParse { .. } | Self::ConfigKeyNotFound { .. } => 5,
            Self::Git(_) => 6,
            _ => 1,
        }
    }
}
