//! Manifest data model for kiln.
//!
//! A manifest declares the repos and images a project can build. The build
//! engine only ever sees a filtered view produced by [`Manifest::filter`].

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ManifestError, Result};
pub use model::{Image, Manifest, Platform, Repo, TagSpec};
