//! Pre/post-build hooks.
//!
//! A build context may carry a `hooks/` directory with `pre-build` and
//! `post-build` scripts. A bare file is executed directly; a `.ps1` variant
//! goes through the host's PowerShell. Absent hooks are a no-op, but an
//! existing hook that exits non-zero aborts the run.

use crate::error::{BuildError, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const PRE_BUILD: &str = "pre-build";
pub const POST_BUILD: &str = "post-build";

const HOOKS_DIR: &str = "hooks";
const SCRIPT_EXT: &str = "ps1";

#[cfg(windows)]
const SCRIPT_INTERPRETER: &str = "powershell";
#[cfg(not(windows))]
const SCRIPT_INTERPRETER: &str = "pwsh";

/// A discovered hook script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookScript {
    /// Executed directly.
    Executable(PathBuf),
    /// Executed through the host's script interpreter.
    Interpreted(PathBuf),
}

impl HookScript {
    pub fn path(&self) -> &Path {
        match self {
            HookScript::Executable(path) | HookScript::Interpreted(path) => path,
        }
    }

    fn command(&self) -> Command {
        match self {
            HookScript::Executable(path) => Command::new(path),
            HookScript::Interpreted(path) => {
                let mut cmd = Command::new(SCRIPT_INTERPRETER);
                cmd.arg(path);
                cmd
            }
        }
    }
}

/// Probe `<context>/hooks` for the named hook.
///
/// A bare `name` file wins over the interpreted `name.ps1` variant.
pub fn discover(context: &Path, name: &str) -> Option<HookScript> {
    let dir = context.join(HOOKS_DIR);
    if !dir.is_dir() {
        return None;
    }

    let direct = dir.join(name);
    if direct.is_file() {
        return Some(HookScript::Executable(direct));
    }

    let script = dir.join(format!("{name}.{SCRIPT_EXT}"));
    if script.is_file() {
        return Some(HookScript::Interpreted(script));
    }

    None
}

/// Run the named hook if it exists, with the build context as its working
/// directory. A missing hooks directory or script is not an error.
pub fn invoke(context: &Path, name: &str, dry_run: bool) -> Result<()> {
    let Some(hook) = discover(context, name) else {
        return Ok(());
    };

    if dry_run {
        println!("  {} hook {}", "dry-run:".yellow(), hook.path().display());
        return Ok(());
    }

    tracing::debug!("Running {} hook: {}", name, hook.path().display());

    let status = hook.command().current_dir(context).status()?;
    if !status.success() {
        return Err(BuildError::HookFailed {
            script: hook.path().to_path_buf(),
            status,
        });
    }

    Ok(())
}
