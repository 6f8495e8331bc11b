/*
 * Flocking Simulation
 *
 * Interactive viewer for the flocking core. Agents follow three rules
 * within their own flock:
 * 1. Separation: steer away from flockmates that are too close
 * 2. Alignment: match the mean heading and speed of visible flockmates
 * 3. Cohesion: steer toward the centroid of visible flockmates
 *
 * A JSON file can describe the bounds, global parameters and any number of
 * flocks; without one a single default flock is shown with wrapping edges.
 */

use std::path::PathBuf;

use clap::Parser;
use log::error;

use flocking::{logging, viewer, BoundsMode, SimulationConfig};

#[derive(Debug, Parser)]
#[command(version, about = "Batched parallel flocking simulation viewer")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for spawn positions and noise; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => match SimulationConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                std::process::exit(1);
            }
        },
        None => {
            let mut config = SimulationConfig::default();
            config.params.bounds_mode = BoundsMode::Wrap;
            config
        }
    };
    if args.seed.is_some() {
        config.params.seed = args.seed;
    }

    viewer::run(config);
}
