use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("base-image override references unknown repo: {0}")]
    UnknownRepo(String),

    #[error("hook failed: {script} ({status})")]
    HookFailed { script: PathBuf, status: ExitStatus },

    #[error("command failed after {attempts} attempt(s): {command} ({status})")]
    CommandFailed {
        command: String,
        attempts: u32,
        status: ExitStatus,
    },

    #[error("invalid rewrite pattern: {0}")]
    Rewrite(String),

    #[error(transparent)]
    Manifest(#[from] kiln_core::ManifestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
