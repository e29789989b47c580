//! Build-orchestration engine for kiln.
//!
//! Drives a manifest-described, multi-platform image build: pull base images,
//! build each platform (with optional base-image rewriting and pre/post
//! hooks), push what was built, report a summary.

pub mod builder;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod overrides;
pub mod tags;

pub use builder::{BuildOptions, BuildSummary, Builder};
pub use error::{BuildError, Result};
pub use executor::{Executor, RetryPolicy};
pub use tags::Tag;
