use clap::{Parser, Subcommand};
use colored::Colorize;
use kiln_build::{BuildOptions, Builder, RetryPolicy};
use kiln_core::Manifest;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Manifest-driven container image builds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the images described by the manifest
    Build {
        /// Manifest path
        #[arg(short, long, default_value = "kiln.yaml", env = "KILN_MANIFEST")]
        manifest: PathBuf,
        /// Only build the named image
        #[arg(short, long)]
        image: Option<String>,
        /// Push built images after the build phase
        #[arg(long)]
        push: bool,
        /// User to impersonate while pushing
        #[arg(long, requires = "push")]
        push_user: Option<String>,
        /// Skip pulling base images
        #[arg(long)]
        no_pull: bool,
        /// Echo engine commands without executing them
        #[arg(long)]
        dry_run: bool,
        /// Attempts per engine invocation before giving up
        #[arg(long, default_value_t = 3)]
        retries: u32,
        /// Container engine binary
        #[arg(long, default_value = "docker", env = "KILN_ENGINE")]
        engine: String,
    },
    /// Load and validate the manifest
    Validate {
        /// Manifest path
        #[arg(short, long, default_value = "kiln.yaml", env = "KILN_MANIFEST")]
        manifest: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            image,
            push,
            push_user,
            no_pull,
            dry_run,
            retries,
            engine,
        } => {
            let opts = BuildOptions {
                engine,
                push,
                no_pull,
                dry_run,
                retry: RetryPolicy {
                    attempts: retries,
                    delay: Duration::from_secs(2),
                },
                push_user,
            };
            handle_build(&manifest, image.as_deref(), opts)
        }
        Commands::Validate { manifest } => handle_validate(&manifest),
        Commands::Version => {
            println!("kiln {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn handle_build(
    manifest_path: &PathBuf,
    image: Option<&str>,
    opts: BuildOptions,
) -> anyhow::Result<()> {
    let manifest = Manifest::from_file(manifest_path)?;
    let filtered = manifest.filter(image);

    if let Some(name) = image
        && filtered.images.is_empty()
    {
        return Err(anyhow::anyhow!("image '{}' not found in manifest", name));
    }

    tracing::debug!(
        "Building {} of {} images",
        filtered.images.len(),
        manifest.images.len()
    );

    let summary = Builder::new(filtered, opts).run()?;
    summary.print_report();

    Ok(())
}

fn handle_validate(manifest_path: &PathBuf) -> anyhow::Result<()> {
    let manifest = Manifest::from_file(manifest_path)?;

    println!(
        "{} {} ({} repos, {} images)",
        "✓".green(),
        "manifest ok".green(),
        manifest.repos.len(),
        manifest.images.len()
    );

    Ok(())
}
