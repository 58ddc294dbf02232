use anyhow::Result;
use clap::Parser;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::*;
use waypoint_follower::{
    configuration, control_loop::ControlLoop, driver::transport_from_config,
    localisation::PoseDecoder, logging, path_loader::load_path_or_empty,
    waypoint_queue::WaypointQueue,
};

#[derive(Parser, Debug)]
#[command(version, about = "Drive a differential drive robot along a recorded path")]
struct Args {
    /// path to config
    #[arg(long)]
    config: Option<PathBuf>,

    /// path file, overrides the configured one
    #[arg(long)]
    path: Option<PathBuf>,

    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Emit logs as json
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_tracing(args.verbosity, args.json_logs);

    let app_config = configuration::AppConfig::load_config(&args.config)?;

    let path_file = args.path.unwrap_or_else(|| app_config.path_file.clone());
    let mut queue = WaypointQueue::new();
    queue.load(load_path_or_empty(&path_file))?;

    let running = Arc::new(AtomicBool::new(true));
    let running_handle = running.clone();
    ctrlc::set_handler(move || {
        running_handle.store(false, Ordering::Release);
        info!("Caught interrupt, stopping after current tick");
    })?;

    let (localiser, driver) = transport_from_config(&app_config.transport, running.clone())?;

    let mut control_loop = ControlLoop::new(localiser, driver, app_config.policy.build(), queue)
        .with_decoder(PoseDecoder::new(app_config.axes))
        .with_stop_signal(running);
    if let Some(period) = app_config.tick_period() {
        control_loop = control_loop.with_tick_period(period);
    }

    let summary = control_loop.run()?;
    info!(
        "Done after {} ticks with {} failed commands",
        summary.ticks, summary.dispatch_failures
    );
    Ok(())
}
