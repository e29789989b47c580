use kiln_core::{Image, Platform, Repo};

/// A fully-qualified image reference plus its local-only flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub local: bool,
}

/// Compose the full tag set for one platform build.
///
/// The image's shared tags come first, then the platform's own tags, both in
/// declaration order. Duplicates are kept as-is.
pub fn resolve_tags(image: &Image, platform: &Platform, repo: &Repo) -> Vec<Tag> {
    image
        .shared_tags
        .iter()
        .chain(platform.tags.iter())
        .map(|spec| Tag {
            name: format!("{}:{}", repo.repository, spec.name),
            local: spec.local,
        })
        .collect()
}

/// Tags eligible for pushing. Local-only tags never leave the host.
pub fn pushable(tags: &[Tag]) -> Vec<&Tag> {
    tags.iter().filter(|t| !t.local).collect()
}
