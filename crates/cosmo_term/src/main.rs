use anyhow::{Context, Result};
use clap::Parser;
use cosmo_renderer::{Player, PlayerConfig};
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod terminal;

use terminal::Screen;

/// Command line options.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "cosmo_term")]
#[command(about = "Play a Cosmo scene as ASCII animation in the terminal")]
#[command(after_help = "Press q, Esc or Ctrl-C to stop.")]
struct Options {
    /// Scene description file
    scene: PathBuf,

    /// Load a binary STL file under NAME (repeatable)
    #[arg(long = "mesh", value_name = "NAME=PATH", value_parser = parse_mesh_pair)]
    meshes: Vec<(String, PathBuf)>,

    /// Grid size in characters
    #[arg(long, value_name = "WxH", value_parser = parse_size, default_value = "80x24")]
    size: (u32, u32),

    /// Frames per second
    #[arg(long, default_value_t = 24.0)]
    fps: f32,

    /// Stop after N frames instead of running until interrupted
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Render threads, 0 for sequential (default: all cores)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Cull meshes with bounding boxes and BVHs
    #[arg(long)]
    aabb: bool,

    /// Draw hits with a single character, no shading
    #[arg(long)]
    flat: bool,
}

fn parse_mesh_pair(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{value}'")),
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{value}'"))?;
    let width = w.parse().map_err(|_| format!("bad width '{w}'"))?;
    let height = h.parse().map_err(|_| format!("bad height '{h}'"))?;
    Ok((width, height))
}

fn load_player(options: &Options) -> Result<Player> {
    let scene = std::fs::read_to_string(&options.scene)
        .with_context(|| format!("Failed to read scene {}", options.scene.display()))?;

    let meshes = options
        .meshes
        .iter()
        .map(|(name, path)| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read mesh {}", path.display()))?;
            Ok((name.clone(), bytes))
        })
        .collect::<Result<Vec<_>>>()?;

    let workers = options.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    let config = PlayerConfig::default()
        .with_size(options.size.0, options.size.1)
        .with_frame_rate(options.fps)
        .with_aabb(options.aabb)
        .with_shading_disabled(options.flat)
        .with_workers(workers);

    Player::new(scene.lines(), &meshes, config)
        .with_context(|| format!("Failed to load scene {}", options.scene.display()))
}

fn play(mut player: Player, fps: f32, frames: Option<u64>) -> Result<()> {
    let frame_time = Duration::from_secs_f32(1.0 / fps);
    let mut screen = Screen::new().context("Failed to set up the terminal")?;

    let mut shown = 0;
    loop {
        let start = Instant::now();

        screen.draw(&player.get_a())?;
        shown += 1;
        if frames.is_some_and(|limit| shown >= limit) {
            break;
        }

        player.update();
        if screen.wait_for_quit(frame_time.saturating_sub(start.elapsed()))? {
            break;
        }
    }
    drop(screen);

    log::info!("Stopped after {shown} frames");
    player.free();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let options = Options::parse();
    log::info!("Starting cosmo_term with {:?}", options);

    let player = load_player(&options)?;
    play(player, options.fps, options.frames)
}
