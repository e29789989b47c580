//! Build orchestration.
//!
//! [`Builder::run`] drives the fixed pipeline over a filtered manifest:
//! pull base images, build every platform of every image in declaration
//! order, push what was built, and hand back the summary. Everything is
//! sequential; the first failure aborts the run.

use crate::error::Result;
use crate::executor::{Executor, RetryPolicy};
use crate::hooks;
use crate::overrides::{self, TempDockerfile};
use crate::tags::{self, Tag};
use colored::Colorize;
use kiln_core::{Image, Manifest, ManifestError, Platform, Repo};

/// Options controlling one orchestration run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Container engine binary, e.g. `docker` or `podman`.
    pub engine: String,

    /// Push built, non-local tags after the build phase.
    pub push: bool,

    /// Skip pulling base images before building.
    pub no_pull: bool,

    /// Echo engine commands and hooks without executing them.
    pub dry_run: bool,

    /// Retry policy for engine invocations.
    pub retry: RetryPolicy,

    /// Optional user to impersonate while pushing.
    pub push_user: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            engine: "docker".to_string(),
            push: false,
            no_pull: false,
            dry_run: false,
            retry: RetryPolicy::default(),
            push_user: None,
        }
    }
}

/// Outcome of one run: every tag built, in build order.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub built: Vec<Tag>,
}

impl BuildSummary {
    pub fn print_report(&self) {
        println!();
        if self.built.is_empty() {
            println!("{}", "No images built.".yellow());
            return;
        }

        println!("{}", "Built images:".bold());
        for tag in &self.built {
            println!("  {} {}", "✓".green(), tag.name.cyan());
        }
    }
}

/// Scope wrapping the push loop in an optional "run as user" identity.
///
/// Credential plumbing lives with the caller's environment; the engine only
/// needs a way to bracket a block of work with the identity context.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user: Option<String>,
}

impl Identity {
    pub fn run_as<T>(&self, work: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(user) = &self.user {
            tracing::info!("Entering push scope as {}", user);
        }
        work()
    }
}

/// Drives pull → build → push → summary over a filtered manifest.
pub struct Builder {
    manifest: Manifest,
    opts: BuildOptions,
    executor: Executor,
}

impl Builder {
    pub fn new(manifest: Manifest, opts: BuildOptions) -> Self {
        let executor = Executor::new(&opts.engine, opts.dry_run, opts.retry.clone());
        Self {
            manifest,
            opts,
            executor,
        }
    }

    /// Run the whole pipeline. Any failure aborts the run; tags built before
    /// the failure are not reported.
    pub fn run(&self) -> Result<BuildSummary> {
        if !self.opts.no_pull {
            self.pull_base_images()?;
        }

        let built = self.build_images()?;

        if !built.is_empty() && self.opts.push {
            self.push_images(&built)?;
        }

        Ok(BuildSummary { built })
    }

    /// Pull every distinct external base image referenced by the filtered
    /// manifest. References that resolve to a manifest repo are products of
    /// this run and are not pulled.
    fn pull_base_images(&self) -> Result<()> {
        let references = self.external_base_images()?;
        if references.is_empty() {
            return Ok(());
        }

        println!("{}", "⬇ Pulling base images...".blue().bold());
        for reference in references {
            self.executor.run(&["pull".to_string(), reference], true)?;
        }

        Ok(())
    }

    fn external_base_images(&self) -> Result<Vec<String>> {
        let mut references = Vec::new();

        for image in &self.manifest.images {
            for platform in &image.platforms {
                let text = std::fs::read_to_string(&platform.dockerfile)?;
                for reference in overrides::from_references(&text) {
                    let (repo_name, _) = overrides::split_reference(&reference);
                    if self.manifest.repo(repo_name).is_some()
                        || self.manifest.repos.iter().any(|r| r.repository == repo_name)
                    {
                        continue;
                    }
                    if !references.contains(&reference) {
                        references.push(reference);
                    }
                }
            }
        }

        Ok(references)
    }

    fn build_images(&self) -> Result<Vec<Tag>> {
        println!("{}", "🔨 Building images...".green().bold());

        let mut built = Vec::new();

        for image in &self.manifest.images {
            let repo = self.manifest.repo(&image.repo).ok_or_else(|| {
                ManifestError::UnknownRepo {
                    image: image.name.clone(),
                    repo: image.repo.clone(),
                }
            })?;

            for platform in &image.platforms {
                let temp = overrides::rewrite_dockerfile(platform, &self.manifest)?;
                let result = self.build_platform(image, platform, repo, temp.as_ref());

                // The private Dockerfile is released on every exit path. A
                // removal error propagates even when the build itself failed.
                if let Some(temp) = temp {
                    temp.remove()?;
                }

                built.extend(result?);
            }
        }

        Ok(built)
    }

    fn build_platform(
        &self,
        image: &Image,
        platform: &Platform,
        repo: &Repo,
        temp: Option<&TempDockerfile>,
    ) -> Result<Vec<Tag>> {
        let variant = platform
            .platform
            .clone()
            .unwrap_or_else(|| platform.dockerfile.display().to_string());
        println!();
        println!("{}", format!("Building {} ({})", image.name, variant).green());

        hooks::invoke(&platform.context, hooks::PRE_BUILD, self.opts.dry_run)?;

        let tags = tags::resolve_tags(image, platform, repo);
        let dockerfile = temp
            .map(|t| t.path())
            .unwrap_or(platform.dockerfile.as_path());

        let mut args: Vec<String> = vec!["build".to_string()];
        if let Some(target) = &platform.platform {
            args.push("--platform".to_string());
            args.push(target.clone());
        }
        args.push("-f".to_string());
        args.push(dockerfile.display().to_string());
        for tag in &tags {
            args.push("-t".to_string());
            args.push(tag.name.clone());
        }
        for (key, value) in &platform.build_args {
            args.push("--build-arg".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(platform.context.display().to_string());

        self.executor.run(&args, true)?;

        hooks::invoke(&platform.context, hooks::POST_BUILD, self.opts.dry_run)?;

        Ok(tags)
    }

    fn push_images(&self, built: &[Tag]) -> Result<()> {
        println!();
        println!("{}", "📤 Pushing images...".blue().bold());

        let identity = Identity {
            user: self.opts.push_user.clone(),
        };

        identity.run_as(|| {
            for tag in tags::pushable(built) {
                self.executor
                    .run(&["push".to_string(), tag.name.clone()], true)?;
            }
            Ok(())
        })
    }
}
