use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use recapture::codec::ThreadNonce;
use recapture::config::{DeviceConfig, SessionConfig};
use recapture::dataset::RowRange;
use recapture::display::{ConsoleDisplay, Pacing};
use recapture::reconstruct::{self, ReconstructConfig, ReconstructSummary, DEFAULT_COPY_CONCURRENCY};
use recapture::sync::{self, SessionOutcome, SessionReport, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(name = "recapture")]
#[command(about = "Collect and rebuild screen-recaptured image datasets", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by manual and auto collection
#[derive(Args, Debug)]
struct SessionArgs {
    /// Path to the data CSV
    #[arg(long)]
    csv_path: PathBuf,

    /// Directory the CSV paths are relative to
    #[arg(long)]
    data_dir: PathBuf,

    /// Row index of the first image to load (inclusive). 0 is the first image
    #[arg(long, default_value_t = 0)]
    row_start: usize,

    /// Row index of the last entry to load (exclusive). Omit to load until the end
    #[arg(long)]
    row_end: Option<usize>,

    /// Width (in px) of the screen
    #[arg(long)]
    screen_width: u32,

    /// Height (in px) of the screen
    #[arg(long)]
    screen_height: u32,
}

impl SessionArgs {
    fn into_config(self) -> recapture::Result<SessionConfig> {
        SessionConfig::new(
            self.csv_path,
            self.data_dir,
            self.row_start,
            self.row_end,
            self.screen_width,
            self.screen_height,
        )
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show images and advance on a key press or a fixed delay
    Manual {
        #[command(flatten)]
        session: SessionArgs,

        /// Interval between images in ms. 0 waits for a key press
        #[arg(long, default_value_t = 0)]
        delay: u64,
    },
    /// Show images and synchronise each one with the capture device
    Auto {
        #[command(flatten)]
        session: SessionArgs,

        /// IP address of the capture device
        #[arg(long, env = "RECAPTURE_DEVICE_IP")]
        ip: IpAddr,

        /// Port of the capture device
        #[arg(long, env = "RECAPTURE_DEVICE_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Seconds to wait for each device reply before resending
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
    /// Build a dataset from a folder of photos exported from the capture device
    Compile {
        /// Source CSV used during capture
        #[arg(long)]
        src_csv_path: PathBuf,

        /// Starting row of the source range (inclusive)
        #[arg(long)]
        src_row_start: usize,

        /// Ending row of the source range (exclusive). Omit for the end of the table
        #[arg(long)]
        src_row_end: Option<usize>,

        /// Local folder holding the exported photos
        #[arg(long)]
        export_dir: PathBuf,

        /// Where output images are saved, preserving the original structure
        #[arg(long)]
        dst_data_dir: PathBuf,

        /// Name of the new dataset, prepended to every path in the new CSV
        #[arg(long)]
        dst_dataset_name: String,

        /// Save location for the new CSV
        #[arg(long)]
        dst_csv_path: PathBuf,

        /// Only generate the CSV, do not copy photos
        #[arg(long)]
        no_copy: bool,

        /// Photos copied concurrently
        #[arg(long, default_value_t = DEFAULT_COPY_CONCURRENCY)]
        jobs: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Manual { session, delay } => {
            let config = session.into_config()?;
            let rows = config.load_rows().context("loading dataset rows")?;
            println!("🖥️  Manual session over {} images (q + Enter to stop)", rows.len());

            let mut display = ConsoleDisplay::stdin();
            let report = sync::run_manual(&rows, &mut display, config.geometry, Pacing::from_millis(delay))?;
            print_session(&report, cli.json)
        }
        Commands::Auto {
            session,
            ip,
            port,
            timeout_secs,
        } => {
            let config = session.into_config()?;
            let device = DeviceConfig::new(ip, port, Duration::from_secs(timeout_secs))?;
            let rows = config.load_rows().context("loading dataset rows")?;
            println!(
                "📡 Auto session over {} images with device {} (q + Enter to stop)",
                rows.len(),
                device.address
            );

            let mut display = ConsoleDisplay::stdin();
            let mut transport = device.transport()?;
            let report = sync::run_auto(
                &rows,
                &mut display,
                config.geometry,
                &mut transport,
                &mut ThreadNonce,
            )
            .context("capture session failed")?;
            print_session(&report, cli.json)
        }
        Commands::Compile {
            src_csv_path,
            src_row_start,
            src_row_end,
            export_dir,
            dst_data_dir,
            dst_dataset_name,
            dst_csv_path,
            no_copy,
            jobs,
        } => {
            let config = ReconstructConfig {
                export_dir,
                src_csv_path,
                range: RowRange::new(src_row_start, src_row_end)?,
                dst_data_dir,
                dataset_name: dst_dataset_name,
                dst_csv_path,
                copy: !no_copy,
                copy_concurrency: jobs,
            };

            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            let summary = runtime
                .block_on(reconstruct::reconstruct(&config))
                .context("reconstruction failed")?;
            print_reconstruct(&summary, cli.json)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn print_session(report: &SessionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let elapsed = report.finished_at - report.started_at;
    match report.outcome {
        SessionOutcome::Completed => println!(
            "✅ Session complete: {} shown, {} photos written, {} skipped, {} retries ({}s)",
            report.shown,
            report.accepted.len(),
            report.skipped.len(),
            report.retries,
            elapsed.num_seconds()
        ),
        SessionOutcome::Cancelled => println!(
            "⏹️  Session cancelled after {} images: {} photos written, {} skipped",
            report.shown,
            report.accepted.len(),
            report.skipped.len()
        ),
    }
    for skipped in &report.skipped {
        println!("⚠️  [{}] skipped: {}", skipped.sequence, skipped.message);
    }
    Ok(())
}

fn print_reconstruct(summary: &ReconstructSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "✅ Built dataset {}: {} rows, {} photos copied, manifest at {}",
        summary.dataset_name,
        summary.rows,
        summary.copied,
        summary.manifest.display()
    );
    Ok(())
}
