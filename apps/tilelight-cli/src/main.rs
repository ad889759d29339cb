use clap::{Parser, Subcommand};
use glam::Vec3;
use std::path::PathBuf;
use tilelight_common::RenderConfig;
use tilelight_render::demo::DemoScene;
use tilelight_render::{FrameController, RecordingBackend, RenderError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilelight-cli", about = "CLI tool for tilelight frame batching")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON render configuration (defaults apply to missing fields)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and derived buffer sizes
    Info,
    /// Print the effective configuration as JSON
    Config,
    /// Run the demo dungeon headless and report per-frame batching stats
    Simulate {
        /// Number of frames to build
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Camera pan along x per frame, in world units
        #[arg(short, long, default_value = "0.0")]
        pan: f32,
        /// Print a description of the last submitted frame
        #[arg(short, long)]
        describe: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RenderConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading render config");
            Ok(RenderConfig::load(path)?)
        }
        None => Ok(RenderConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("tilelight-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tilelight_common::crate_info());
            println!("render: {}", tilelight_render::crate_info());
            let frames = FrameController::new(config)?;
            println!(
                "geometry: {} vertices ({} KiB)",
                frames.geometry().capacity(),
                frames.geometry().as_bytes().len() / 1024
            );
            println!(
                "lights: {} slots ({} floats)",
                frames.lights().capacity(),
                frames.lights().as_floats().len()
            );
            println!(
                "atlas: {}px / {}px tiles = {} tiles per row",
                frames.atlas().texture_size(),
                frames.atlas().tile_size(),
                frames.atlas().tiles_per_row()
            );
        }
        Commands::Config => {
            println!("{}", config.to_json()?);
        }
        Commands::Simulate {
            frames: frame_count,
            pan,
            describe,
        } => {
            let scene = DemoScene::new();
            let mut frames = FrameController::new(config)?;
            let level_verts = frames.build_level(|level| scene.build_level(level))?;
            println!(
                "Level: {} walls, {} floors -> {level_verts} static vertices",
                scene.wall_count(),
                scene.floor_count()
            );

            // Only the last frame is ever described.
            let mut backend = RecordingBackend::keep_last(1);
            let mut abandoned = 0u32;
            let mut total_verts = 0usize;
            for i in 0..frame_count {
                let camera = scene.start_camera() + Vec3::new(i as f32 * pan, 0.0, 0.0);
                frames.begin_frame(camera)?;
                match scene.emit_frame(&mut frames, i as f32 / 60.0) {
                    Ok(sprites) => {
                        let stats = frames.end_frame(&mut backend)?;
                        total_verts += stats.vertices;
                        tracing::debug!(
                            frame = stats.frame,
                            sprites,
                            vertices = stats.vertices,
                            lights = stats.lights,
                            "frame built"
                        );
                    }
                    Err(err @ RenderError::CapacityExceeded { .. }) => {
                        tracing::warn!("frame {i}: {err}");
                        frames.abandon_frame();
                        abandoned += 1;
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            let submitted = frames.frames_submitted();
            println!(
                "Frames: {submitted} submitted, {abandoned} abandoned, {:.1} vertices/frame",
                if submitted == 0 {
                    0.0
                } else {
                    total_verts as f64 / submitted as f64
                }
            );
            if describe {
                print!("{}", backend.describe());
            }
        }
    }

    Ok(())
}
