use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("image '{image}' references unknown repo '{repo}'")]
    UnknownRepo { image: String, repo: String },
}

pub type Result<T> = std::result::Result<T, ManifestError>;
