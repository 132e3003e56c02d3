//! Headless loam host: loads config, generates and serves chunks, autosaves.
#![forbid(unsafe_code)]

mod app;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use loam_blocks::BlocksConfig;
use loam_world::WorldGenConfig;
use loam_world::worldgen::load_config_from_path;

use app::{HostConfig, HostSession, load_host_config};

const DEFAULT_CONFIG: &str = "loam.toml";

#[derive(Parser, Debug)]
#[command(name = "loam", about = "Chunked voxel world host")]
struct Args {
    /// Host config file (defaults to ./loam.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Archive directory, overrides `world_dir`
    #[arg(long)]
    world_dir: Option<PathBuf>,

    /// World seed, overrides the worldgen file
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks to run before shutting down (0 runs until killed)
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Tick length in milliseconds
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_configs(args: &Args) -> Result<(HostConfig, WorldGenConfig, BlocksConfig), Box<dyn Error>> {
    let mut host = match &args.config {
        Some(path) => load_host_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => load_host_config(Path::new(DEFAULT_CONFIG))?,
        None => HostConfig::default(),
    };
    if let Some(dir) = &args.world_dir {
        host.world_dir = dir.clone();
    }

    let mut worldgen = match &host.worldgen {
        Some(path) => load_config_from_path(path)?,
        None => WorldGenConfig::default(),
    };
    if let Some(seed) = args.seed {
        worldgen.seed = seed;
    }

    let blocks = match &host.blocks {
        Some(path) => BlocksConfig::load(path)?,
        None => BlocksConfig::builtin(),
    };
    Ok((host, worldgen, blocks))
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let (host, worldgen, blocks) = load_configs(&args)?;
    log::info!("seed {}, {} world(s), {} block type(s)", worldgen.seed, worldgen.worlds.len(), blocks.blocks.len());
    let mut session = HostSession::init(host, &worldgen, &blocks)?;

    let tick = Duration::from_millis(args.tick_ms.max(1));
    let mut last = Instant::now();
    let mut n: u64 = 0;
    while args.ticks == 0 || n < args.ticks {
        let started = Instant::now();
        let dt = started.duration_since(last).as_secs_f32();
        last = started;
        if let Some(report) = session.tick(dt) {
            log::info!("autosave: {} chunk(s) written, {} failed", report.written, report.failed);
        }
        n += 1;
        if let Some(rest) = tick.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    session.shutdown()?;
    Ok(())
}
