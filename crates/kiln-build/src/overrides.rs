//! Base-image rewriting.
//!
//! When a platform declares base-image overrides, the build must not run
//! against the original Dockerfile: every overridden `FROM` reference is
//! rewritten into a private copy next to the original, and that copy is
//! removed once the platform's build attempt is over.

use crate::error::{BuildError, Result};
use kiln_core::{Manifest, Platform};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Suffix appended to the original Dockerfile path for the private copy.
pub const TEMP_SUFFIX: &str = ".temp";

/// Split a fully-qualified reference into its repository and tag/digest
/// suffix (suffix keeps its leading `:` or `@`).
///
/// Registry ports are not tags: `localhost:5000/app` has no suffix.
pub fn split_reference(reference: &str) -> (&str, &str) {
    if let Some(pos) = reference.find('@') {
        return (&reference[..pos], &reference[pos..]);
    }
    if let Some(pos) = reference.rfind(':')
        && !reference[pos + 1..].contains('/')
    {
        return (&reference[..pos], &reference[pos..]);
    }
    (reference, "")
}

/// Replace every `FROM <reference>` occurrence across the whole document.
///
/// The match is `FROM` + whitespace + the exact reference + optional trailing
/// same-line whitespace; the replacement is `FROM <replacement>`. The
/// reference itself is matched case-sensitively.
pub fn replace_from(text: &str, reference: &str, replacement: &str) -> Result<String> {
    let pattern = format!(r"FROM\s+{}[ \t]*", regex::escape(reference));
    let re = Regex::new(&pattern).map_err(|e| BuildError::Rewrite(e.to_string()))?;

    let replacement = format!("FROM {replacement}");
    Ok(re.replace_all(text, regex::NoExpand(&replacement)).into_owned())
}

/// Collect the `FROM` references of a Dockerfile, in order of appearance.
///
/// Multi-stage aliases (`FROM x AS build` then `FROM build`), `scratch` and
/// ARG-parameterized references are skipped; `--platform=...` style flags
/// between `FROM` and the reference are ignored.
pub fn from_references(text: &str) -> Vec<String> {
    let mut references = Vec::new();
    let mut aliases: Vec<String> = Vec::new();

    for line in text.lines() {
        let Some(rest) = line.trim_start().strip_prefix("FROM ") else {
            continue;
        };

        let mut tokens = rest.split_whitespace().filter(|t| !t.starts_with("--"));
        let Some(reference) = tokens.next() else {
            continue;
        };

        if let Some(keyword) = tokens.next()
            && keyword.eq_ignore_ascii_case("as")
            && let Some(alias) = tokens.next()
        {
            aliases.push(alias.to_string());
        }

        if reference == "scratch"
            || reference.contains('$')
            || aliases.iter().any(|a| a == reference)
        {
            continue;
        }

        references.push(reference.to_string());
    }

    references
}

/// Private rewritten Dockerfile living at `<original>.temp`.
///
/// The handle must be released with [`TempDockerfile::remove`] once the
/// platform's build attempt is over; removal errors propagate to the caller.
#[derive(Debug)]
pub struct TempDockerfile {
    path: PathBuf,
}

impl TempDockerfile {
    fn create(original: &Path, text: &str) -> Result<Self> {
        let mut os = original.as_os_str().to_os_string();
        os.push(TEMP_SUFFIX);
        let path = PathBuf::from(os);

        std::fs::write(&path, text)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(self) -> std::io::Result<()> {
        std::fs::remove_file(&self.path)
    }
}

/// Rewrite a platform's overridden base-image references into a private
/// Dockerfile copy.
///
/// Returns `None` without touching the filesystem when the platform declares
/// no overrides. The original file is never modified. Each override's
/// repository portion must name a repo in the filtered manifest; the
/// replacement keeps the reference's tag/digest suffix.
pub fn rewrite_dockerfile(
    platform: &Platform,
    manifest: &Manifest,
) -> Result<Option<TempDockerfile>> {
    if platform.base_overrides.is_empty() {
        return Ok(None);
    }

    let mut text = std::fs::read_to_string(&platform.dockerfile)?;

    for reference in &platform.base_overrides {
        let (repo_name, suffix) = split_reference(reference);
        let repo = manifest
            .repo(repo_name)
            .ok_or_else(|| BuildError::UnknownRepo(repo_name.to_string()))?;

        let replacement = format!("{}{}", repo.repository, suffix);
        text = replace_from(&text, reference, &replacement)?;
    }

    let temp = TempDockerfile::create(&platform.dockerfile, &text)?;
    Ok(Some(temp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::Repo;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn manifest_with_repo(name: &str, repository: &str) -> Manifest {
        Manifest {
            repos: vec![Repo {
                name: name.to_string(),
                repository: repository.to_string(),
            }],
            images: vec![],
        }
    }

    fn platform(dockerfile: &Path, overrides: &[&str]) -> Platform {
        Platform {
            dockerfile: dockerfile.to_path_buf(),
            context: dockerfile.parent().unwrap().to_path_buf(),
            platform: None,
            build_args: BTreeMap::new(),
            tags: vec![],
            base_overrides: overrides.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(split_reference("deps:9.0"), ("deps", ":9.0"));
        assert_eq!(split_reference("deps"), ("deps", ""));
        assert_eq!(
            split_reference("deps@sha256:abc123"),
            ("deps", "@sha256:abc123")
        );
        assert_eq!(split_reference("localhost:5000/app"), ("localhost:5000/app", ""));
        assert_eq!(
            split_reference("localhost:5000/app:dev"),
            ("localhost:5000/app", ":dev")
        );
    }

    #[test]
    fn test_replace_from_all_occurrences() {
        let text = "FROM repoA:tag1\nRUN true\nFROM repoA:tag1\nFROM other:1\n";
        let result = replace_from(text, "repoA:tag1", "repoB:tag1").unwrap();

        assert!(!result.contains("FROM repoA:tag1"));
        assert_eq!(result.matches("FROM repoB:tag1").count(), 2);
        assert!(result.contains("FROM other:1"));
    }

    #[test]
    fn test_replace_from_is_case_sensitive_on_reference() {
        let text = "FROM RepoA:tag1\nFROM repoA:tag1\n";
        let result = replace_from(text, "repoA:tag1", "repoB:tag1").unwrap();

        assert!(result.contains("FROM RepoA:tag1"));
        assert!(result.contains("FROM repoB:tag1"));
    }

    #[test]
    fn test_replace_from_escapes_reference_metacharacters() {
        let text = "FROM deps:9.0\nFROM deps:9X0\n";
        let result = replace_from(text, "deps:9.0", "ghcr.io/acme/deps:9.0").unwrap();

        // The `.` in the reference is literal, not a regex wildcard.
        assert!(result.contains("FROM deps:9X0"));
        assert!(result.contains("FROM ghcr.io/acme/deps:9.0"));
    }

    #[test]
    fn test_from_references_skips_aliases_and_scratch() {
        let text = "\
ARG VERSION=9.0
FROM golang:1.22 AS build
RUN make
FROM scratch
FROM build
FROM --platform=$BUILDPLATFORM alpine:3.20
FROM base:$VERSION
";
        assert_eq!(from_references(text), vec!["golang:1.22", "alpine:3.20"]);
    }

    #[test]
    fn test_rewrite_no_overrides_is_noop() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM alpine:3.20\n").unwrap();

        let manifest = manifest_with_repo("deps", "ghcr.io/acme/deps");
        let result = rewrite_dockerfile(&platform(&dockerfile, &[]), &manifest).unwrap();

        assert!(result.is_none());
        assert!(!temp_dir.path().join("Dockerfile.temp").exists());
    }

    #[test]
    fn test_rewrite_substitutes_and_keeps_original() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        let original = "FROM deps:9.0\nRUN true\n";
        fs::write(&dockerfile, original).unwrap();

        let manifest = manifest_with_repo("deps", "ghcr.io/acme/deps");
        let temp = rewrite_dockerfile(&platform(&dockerfile, &["deps:9.0"]), &manifest)
            .unwrap()
            .unwrap();

        assert_eq!(temp.path(), temp_dir.path().join("Dockerfile.temp"));

        let rewritten = fs::read_to_string(temp.path()).unwrap();
        assert!(rewritten.contains("FROM ghcr.io/acme/deps:9.0"));
        assert!(!rewritten.contains("FROM deps:9.0"));

        // The original is byte-identical.
        assert_eq!(fs::read_to_string(&dockerfile).unwrap(), original);

        temp.remove().unwrap();
        assert!(!temp_dir.path().join("Dockerfile.temp").exists());
        assert!(dockerfile.exists());
    }

    #[test]
    fn test_rewrite_unknown_repo_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM mystery:1\n").unwrap();

        let manifest = manifest_with_repo("deps", "ghcr.io/acme/deps");
        let result = rewrite_dockerfile(&platform(&dockerfile, &["mystery:1"]), &manifest);

        assert!(matches!(result, Err(BuildError::UnknownRepo(name)) if name == "mystery"));
        // Nothing was written.
        assert!(!temp_dir.path().join("Dockerfile.temp").exists());
    }

    #[test]
    fn test_rewrite_digest_suffix_preserved() {
        let temp_dir = tempdir().unwrap();
        let dockerfile = temp_dir.path().join("Dockerfile");
        fs::write(&dockerfile, "FROM deps@sha256:abc123\n").unwrap();

        let manifest = manifest_with_repo("deps", "ghcr.io/acme/deps");
        let temp = rewrite_dockerfile(&platform(&dockerfile, &["deps@sha256:abc123"]), &manifest)
            .unwrap()
            .unwrap();

        let rewritten = fs::read_to_string(temp.path()).unwrap();
        assert!(rewritten.contains("FROM ghcr.io/acme/deps@sha256:abc123"));

        temp.remove().unwrap();
    }
}
