mod analyze;
mod files;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use socialdash_analytics::{run_dashboard, Dashboard, DashboardContext, DashboardOutcome, Upload};
use socialdash_core::EXPORT_FILE_NAME;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "socialdash-cli")]
#[command(about = "Social media performance dashboard on the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print summary cards, one performance cluster and the top posts
    Analyze {
        /// CSV of post metrics; without it only the upload prompt is shown
        file: Option<PathBuf>,

        /// Performance cluster to list (0, 1 or 2)
        #[arg(long, default_value_t = 0)]
        cluster: u8,

        /// Number of explorer rows to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write the analyzed table as CSV
    Export {
        file: PathBuf,

        #[arg(long, default_value = EXPORT_FILE_NAME)]
        out: PathBuf,
    },
    /// Write the three charts as SVG files
    Charts {
        file: PathBuf,

        #[arg(long)]
        out_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = socialdash_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Analyze { file, cluster, top }) => {
            analyze::run_analyze(file.as_deref(), cluster, top)?;
        }
        Some(Commands::Export { file, out }) => files::run_export(&file, &out)?,
        Some(Commands::Charts { file, out_dir }) => files::run_charts(&file, &out_dir)?,
        None => println!("no command given; run `socialdash-cli --help` for usage"),
    }

    Ok(())
}

/// Read `path` into an [`Upload`] named after the file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub(crate) fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(Upload::new(file_name, bytes))
}

/// Run the full dashboard pipeline over a file on disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or any pipeline stage fails.
pub(crate) fn load_dashboard(path: &Path, cluster_choice: u8) -> anyhow::Result<Dashboard> {
    let ctx = DashboardContext {
        upload: Some(read_upload(path)?),
        cluster_choice,
    };
    match run_dashboard(&ctx).with_context(|| format!("failed to analyze {}", path.display()))? {
        DashboardOutcome::Ready(dashboard) => Ok(*dashboard),
        DashboardOutcome::AwaitingUpload { message } => anyhow::bail!(message),
    }
}
