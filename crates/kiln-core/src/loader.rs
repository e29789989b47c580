use crate::error::{ManifestError, Result};
use crate::model::Manifest;
use std::path::Path;

impl Manifest {
    /// Load and validate a manifest from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Manifest> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }

        let text = std::fs::read_to_string(path)?;
        let manifest = Manifest::from_str(&text)?;

        tracing::debug!(
            "Loaded manifest from {}: {} repos, {} images",
            path.display(),
            manifest.repos.len(),
            manifest.images.len()
        );

        Ok(manifest)
    }

    /// Parse a manifest from YAML text.
    pub fn from_str(text: &str) -> Result<Manifest> {
        let manifest: Manifest = serde_yaml::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check cross-references: every image must name a declared repo.
    pub fn validate(&self) -> Result<()> {
        for image in &self.images {
            if self.repo(&image.repo).is_none() {
                return Err(ManifestError::UnknownRepo {
                    image: image.name.clone(),
                    repo: image.repo.clone(),
                });
            }
        }
        Ok(())
    }
}
