use bucket_resizer::batch::{BatchOptions, BatchOrchestrator};
use bucket_resizer::config::{self, BatchConfig, ConfigError};
use bucket_resizer::notify::LogNotifier;
use bucket_resizer::output;
use bucket_resizer::state::SuffixTracker;
use bucket_resizer::store::FsObjectStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bucket-resizer")]
#[command(about = "Resize every unprocessed image in a bucket")]
#[command(long_about = "\
Resize every unprocessed image in a bucket

Lists the keys under a prefix, skips keys already marked processed, and runs
each remaining bitmap through decode → resize → encode. The result is stored
under `<key><suffix>`, the original is removed, and a completion message is
published per image.

With the filesystem store each container is a directory under --root:

  root/
  └── images/                    # container
      └── image/                 # prefix
          ├── a.bmp              # unprocessed
          └── b.bmp_processed.jpg  # already processed, skipped

Logs go to stderr; set RUST_LOG to change verbosity.

Run 'bucket-resizer gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory of the filesystem object store
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Per-run overrides for config values.
#[derive(clap::Args, Clone, Default)]
struct RunArgs {
    /// Container to scan
    #[arg(long)]
    container: Option<String>,

    /// Key prefix to scan
    #[arg(long)]
    prefix: Option<String>,

    /// Target bounding-box width
    #[arg(long)]
    width: Option<u32>,

    /// Target bounding-box height
    #[arg(long)]
    height: Option<u32>,

    /// Print the batch result as JSON instead of a listing
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Process every unprocessed image under the prefix
    Run(RunArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Run(args) => {
            let config = apply_overrides(config::load_config(cli.config.as_deref())?, &args)?;
            init_thread_pool(&config.processing);

            let orchestrator = BatchOrchestrator::new(
                FsObjectStore::new(&cli.root),
                LogNotifier,
                SuffixTracker::new(config.processed_suffix.clone()),
                BatchOptions::from_config(&config),
            );
            let result = orchestrator.run(
                &config.container,
                &config.prefix,
                config.target.dimensions(),
            )?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_batch_result(&result);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Layer CLI flags over the loaded config and re-validate.
fn apply_overrides(mut config: BatchConfig, args: &RunArgs) -> Result<BatchConfig, ConfigError> {
    if let Some(container) = &args.container {
        config.container = container.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(width) = args.width {
        config.target.width = width;
    }
    if let Some(height) = args.height {
        config.target.height = height;
    }
    config.validate()?;
    Ok(config)
}

/// Structured logs to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucket_resizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
