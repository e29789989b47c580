use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The full catalog of buildable images.
///
/// The build engine never reads this directly; it consumes the filtered view
/// returned by [`Manifest::filter`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Named repositories images publish to.
    #[serde(default)]
    pub repos: Vec<Repo>,

    /// Buildable images, processed in declaration order.
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Manifest {
    /// Look up a repo by its manifest name. Names are matched exactly.
    pub fn repo(&self, name: &str) -> Option<&Repo> {
        self.repos.iter().find(|r| r.name == name)
    }

    /// Produce the filtered view the build engine consumes.
    ///
    /// `image` filters on image name; `None` keeps everything. Repos are
    /// always carried over so base-image overrides keep resolving.
    pub fn filter(&self, image: Option<&str>) -> Manifest {
        let images = match image {
            Some(name) => self
                .images
                .iter()
                .filter(|i| i.name == name)
                .cloned()
                .collect(),
            None => self.images.clone(),
        };

        Manifest {
            repos: self.repos.clone(),
            images,
        }
    }
}

/// A named repository entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repo {
    /// Manifest-local name, referenced by images and base-image overrides.
    pub name: String,

    /// Fully-qualified repository, e.g. `ghcr.io/acme/runtime`.
    pub repository: String,
}

/// A logical image composed of one or more platform variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub name: String,

    /// Name of the [`Repo`] this image publishes to.
    pub repo: String,

    /// Tags applied to every platform build of this image.
    #[serde(default)]
    pub shared_tags: Vec<TagSpec>,

    /// Platform variants, built in declaration order.
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

/// One buildable unit: a Dockerfile plus its context, args and tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub dockerfile: PathBuf,

    /// Build context directory. The hook scripts live under
    /// `<context>/hooks/`.
    pub context: PathBuf,

    /// Optional `os/arch` string forwarded to the engine as `--platform`.
    #[serde(default)]
    pub platform: Option<String>,

    /// Build arguments, passed as `--build-arg key=value` in key order.
    #[serde(default)]
    pub build_args: BTreeMap<String, String>,

    /// Platform-specific tags, appended after the image's shared tags.
    #[serde(default)]
    pub tags: Vec<TagSpec>,

    /// Base-image references whose repository must be rewritten before the
    /// build. Each reference's repository portion must name a manifest repo.
    #[serde(default)]
    pub base_overrides: Vec<String>,
}

/// A tag name plus whether it stays local (never pushed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSpec {
    pub name: String,

    #[serde(default)]
    pub local: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest {
            repos: vec![
                Repo {
                    name: "runtime".to_string(),
                    repository: "ghcr.io/acme/runtime".to_string(),
                },
                Repo {
                    name: "sdk".to_string(),
                    repository: "ghcr.io/acme/sdk".to_string(),
                },
            ],
            images: vec![
                Image {
                    name: "runtime".to_string(),
                    repo: "runtime".to_string(),
                    shared_tags: vec![],
                    platforms: vec![],
                },
                Image {
                    name: "sdk".to_string(),
                    repo: "sdk".to_string(),
                    shared_tags: vec![],
                    platforms: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_repo_lookup_exact() {
        let manifest = sample();
        assert_eq!(
            manifest.repo("sdk").map(|r| r.repository.as_str()),
            Some("ghcr.io/acme/sdk")
        );
        assert!(manifest.repo("SDK").is_none());
        assert!(manifest.repo("missing").is_none());
    }

    #[test]
    fn test_filter_by_image_name() {
        let manifest = sample();
        let filtered = manifest.filter(Some("sdk"));

        assert_eq!(filtered.images.len(), 1);
        assert_eq!(filtered.images[0].name, "sdk");
        // Repos survive filtering so overrides still resolve.
        assert_eq!(filtered.repos.len(), 2);
    }

    #[test]
    fn test_filter_none_keeps_everything() {
        let manifest = sample();
        let filtered = manifest.filter(None);
        assert_eq!(filtered.images.len(), 2);
    }

    #[test]
    fn test_filter_no_match_is_empty() {
        let manifest = sample();
        let filtered = manifest.filter(Some("nope"));
        assert!(filtered.images.is_empty());
    }
}
