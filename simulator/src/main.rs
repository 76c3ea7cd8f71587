use anyhow::Context;
use api::routes::{serve, ApiState};
use backend::config::SimulatorConfig;
use backend::store::{DetectionQuery, DetectionStore};
use chrono::Local;
use clap::Parser;
use generator::profile::build_detections;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod api;
mod backend;
mod generator;

#[derive(Parser)]
#[command(author, version, about = "Stand-in speed-camera backend for the dashboard")]
struct Args {
    /// Print a summary of the generated detection log and exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load the simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
    #[arg(long, default_value_t = 50.0)]
    speed_limit: f64,
    #[arg(long, default_value_t = 120)]
    count: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        SimulatorConfig::load(path)?
    } else {
        SimulatorConfig::from_args(args.bind, args.speed_limit, args.count, args.seed)
    };

    let now = Local::now().naive_local();
    let rows = build_detections(&config.generator, &config.vehicle_classes, now)
        .context("generating detection log")?;
    let store = DetectionStore::new(rows, config.speed_limit_kmh);

    if args.offline {
        let all = store.query(&DetectionQuery::default(), now);
        let violations = all.iter().filter(|r| r.is_violation).count();
        let with_images = all.iter().filter(|r| r.has_image).count();
        println!(
            "Offline run -> detections {}, violations {}, with images {}, speed limit {} km/h",
            store.len(),
            violations,
            with_images,
            store.speed_limit()
        );
        return Ok(());
    }

    let addr = config.bind;
    let state = ApiState::new(store, config);
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the HTTP backend")?;
    runtime.block_on(async move {
        tokio::select! {
            _ = serve(state, addr) => Ok(()),
            result = signal::ctrl_c() => {
                log::info!("shutting down backend");
                result.context("awaiting Ctrl+C to exit")
            }
        }
    })?;

    Ok(())
}
