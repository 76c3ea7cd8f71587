use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use client::ApiClient;
use config::DashboardConfig;
use log::{info, warn};
use speedcore::detection::{FilterForm, ObjectTypeOptions};
use speedcore::{DashboardError, DashboardSession, DetectionBoard};
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};

mod client;
mod config;
mod render;

#[derive(Parser)]
#[command(author, version, about = "Speed-camera detections dashboard")]
struct Args {
    /// Load the dashboard config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "http://127.0.0.1:9000")]
    base_url: String,
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch once and print the filtered detections
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Keep polling the backend and reprint the filtered detections
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Select detections and delete their images
    Delete {
        #[command(flatten)]
        filters: FilterArgs,
        /// Select every displayed detection that has an image
        #[arg(long, default_value_t = false)]
        all: bool,
        /// Image file to select; repeatable
        #[arg(long = "file")]
        files: Vec<String>,
        /// Deletes in flight at once (overrides the config file)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Skip the dry run and delete for real
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Show the object types offered by the type filter
    Options,
}

/// Filter inputs as typed on the command line. Values are sanitised the
/// same way form inputs are: unparsable bounds impose no constraint.
#[derive(ClapArgs, Default)]
struct FilterArgs {
    #[arg(long = "type")]
    object_type: Option<String>,
    /// L2R or R2L
    #[arg(long)]
    direction: Option<String>,
    #[arg(long)]
    speed_min: Option<String>,
    #[arg(long)]
    speed_max: Option<String>,
    /// today, yesterday, week or month
    #[arg(long)]
    date_range: Option<String>,
    #[arg(long, default_value_t = false)]
    violations_only: bool,
}

impl FilterArgs {
    /// Overlays the command-line values on the configured defaults.
    fn to_form(&self, defaults: &FilterForm) -> FilterForm {
        let pick = |value: &Option<String>, fallback: &String| {
            value.clone().unwrap_or_else(|| fallback.clone())
        };
        FilterForm {
            object_type: pick(&self.object_type, &defaults.object_type),
            direction: pick(&self.direction, &defaults.direction),
            speed_min: pick(&self.speed_min, &defaults.speed_min),
            speed_max: pick(&self.speed_max, &defaults.speed_max),
            date_range: pick(&self.date_range, &defaults.date_range),
            violations_only: self.violations_only || defaults.violations_only,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config.as_ref() {
        DashboardConfig::load(path)?
    } else {
        DashboardConfig::from_args(args.base_url.clone(), args.poll_interval)
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the dashboard")?;
    runtime.block_on(run(args.command, config))
}

async fn run(command: Command, config: DashboardConfig) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.base_url, config.request_timeout())
        .context("building backend client")?;

    match command {
        Command::List { filters } => {
            let mut session = session_for(client, &filters, &config);
            session
                .refresh()
                .await
                .context("loading detections")?;
            print_board(session.board());
        }
        Command::Watch { filters } => {
            let session = session_for(client, &filters, &config);
            watch(session, &config).await?;
        }
        Command::Delete {
            filters,
            all,
            files,
            concurrency,
            yes,
        } => {
            let mut session = session_for(client, &filters, &config);
            session
                .refresh()
                .await
                .context("loading detections")?;

            let board = session.board_mut();
            if all {
                board.select_all();
            }
            for file in &files {
                board.toggle(file, true);
                if !board.selection().contains(file) {
                    warn!("{} is not a displayed detection with an image; skipped", file);
                }
            }

            let selected = session.board().selected_ids();
            if selected.is_empty() {
                println!("No detections selected");
                return Ok(());
            }
            if !yes {
                println!(
                    "Would permanently delete {} detection image{} (re-run with --yes):",
                    selected.len(),
                    if selected.len() > 1 { "s" } else { "" }
                );
                for line in render::pending_deletes(session.board(), &selected) {
                    println!("{line}");
                }
                return Ok(());
            }

            let limit = concurrency.unwrap_or(config.delete_concurrency);
            let report = if limit > 1 {
                session.delete_selected_concurrently(limit).await
            } else {
                session.delete_selected().await
            };
            let report = match report {
                Ok(report) => report,
                Err(DashboardError::EmptySelection) => {
                    println!("No detections selected");
                    return Ok(());
                }
                Err(err) => return Err(err).context("bulk delete"),
            };
            for line in render::delete_report(&report) {
                println!("{line}");
            }
            print_board(session.board());
        }
        Command::Options => {
            let document = client.fetch_config().await.context("loading camera config")?;
            let options = ObjectTypeOptions::from_config(&document);
            print!("{}", render::object_type_options(&options));
        }
    }

    Ok(())
}

fn session_for(
    client: ApiClient,
    filters: &FilterArgs,
    config: &DashboardConfig,
) -> DashboardSession<ApiClient> {
    let criteria = filters.to_form(&config.filters).to_criteria();
    DashboardSession::with_board(client, DetectionBoard::with_criteria(criteria))
}

/// Polls until Ctrl+C. A failed poll is reported and the previous list stays
/// on screen.
async fn watch(mut session: DashboardSession<ApiClient>, config: &DashboardConfig) -> anyhow::Result<()> {
    let mut ticker = interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        "polling {} every {:?}",
        config.base_url,
        config.poll_interval()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match session.refresh().await {
                    Ok(_) => print_board(session.board()),
                    Err(err) => println!("Error loading detections: {err}"),
                }
            }
            result = signal::ctrl_c() => {
                result.context("awaiting Ctrl+C to exit")?;
                let metrics = session.metrics();
                info!(
                    "stopped after {} fetches ({} failed)",
                    metrics.fetches, metrics.fetch_errors
                );
                return Ok(());
            }
        }
    }
}

fn print_board(board: &DetectionBoard) {
    print!("{}", render::detection_table(board.displayed()));
    println!("{}", render::board_summary(board));
}
