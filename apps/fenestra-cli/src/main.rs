use anyhow::Context;
use clap::{Parser, Subcommand};
use fenestra_assembly::{WindowDoor, WindowFrame, WindowWall};
use fenestra_assets::import_handle_model;
use fenestra_common::Color;
use fenestra_composer::{ComposerConfig, SceneComposer};
use fenestra_input::GuiParams;
use fenestra_render::{DebugTextRenderer, RenderView, Renderer};
use fenestra_tools::{SceneInspector, SceneSummary};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fenestra-cli", about = "CLI tool for fenestra window scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and assembly constants
    Info,
    /// Compose the window scene with the given parameters and print it
    Scene {
        #[arg(long, default_value = "1.0")]
        width: f32,
        #[arg(long, default_value = "1.0")]
        height: f32,
        /// Leaf opening angle in radians
        #[arg(long, default_value = "0.0")]
        rotation: f32,
        /// Frame color as #RRGGBB
        #[arg(long, default_value = "#FFFFFF")]
        color: String,
        /// glTF file to load the handles from
        #[arg(long)]
        handle_model: Option<PathBuf>,
        /// Give up on the handle model after this many milliseconds
        #[arg(long, default_value = "5000")]
        load_timeout_ms: u64,
        /// Print a JSON summary instead of the text rendering
        #[arg(long)]
        json: bool,
    },
    /// Import a handle model and report what was found
    Handle {
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct SceneReport {
    params: GuiParams,
    summary: SceneSummary,
    floor_y: f32,
    handles_visible: [bool; 2],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("fenestra-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "frame: thickness={} depth={} sill={}x{}",
                WindowFrame::FRAME_THICKNESS,
                WindowFrame::FRAME_DEPTH,
                WindowFrame::SILL_HEIGHT,
                WindowFrame::SILL_DEPTH,
            );
            println!(
                "leaf: thickness={} depth={} glass={} grip coupling={}",
                WindowDoor::FRAME_THICKNESS,
                WindowDoor::FRAME_DEPTH,
                WindowDoor::GLASS_DEPTH,
                WindowDoor::GRIP_COUPLING,
            );
            println!(
                "wall: depth={} hole overcut={} drop={}",
                WindowWall::WALL_DEPTH,
                WindowWall::HOLE_OVERCUT,
                WindowWall::HOLE_DROP,
            );
        }
        Commands::Scene {
            width,
            height,
            rotation,
            color,
            handle_model,
            load_timeout_ms,
            json,
        } => {
            let color = Color::from_hex(&color)?;
            let params = GuiParams {
                rotation,
                width,
                height,
                color,
            };
            let config = ComposerConfig {
                handle_model,
                load_timeout: Duration::from_millis(load_timeout_ms),
                ..ComposerConfig::default()
            };
            let waiting = config.handle_model.is_some();
            let timeout = config.load_timeout;

            let mut composer = SceneComposer::new(config)?;
            composer
                .apply_all(params.controls_from_default(), Instant::now())
                .context("applying scene parameters")?;
            composer.flush()?;
            composer.tick(Instant::now())?;

            if waiting {
                let deadline = Instant::now() + timeout + Duration::from_millis(100);
                while Instant::now() < deadline && !handles_settled(&composer) {
                    std::thread::sleep(Duration::from_millis(10));
                    composer.tick(Instant::now())?;
                }
            }

            let stage = composer.stage();
            if json {
                let report = SceneReport {
                    params: composer.params(),
                    summary: SceneInspector::summary(&stage.scene, &stage.meshes, &stage.materials),
                    floor_y: composer.floor_y(),
                    handles_visible: [
                        composer.frame().left_leaf().handle_visible(stage),
                        composer.frame().right_leaf().handle_visible(stage),
                    ],
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let output =
                    DebugTextRenderer::new().render(&composer.render_scene(), &RenderView::default());
                print!("{output}");
            }
        }
        Commands::Handle { path } => {
            let model = import_handle_model(&path)
                .with_context(|| format!("importing {}", path.display()))?;
            for (name, part) in [("base", &model.base), ("grip", &model.grip)] {
                let size = part.mesh.aabb().map(|bb| bb.size()).unwrap_or_default();
                let p = part.transform.position;
                println!(
                    "{name}: {} tris, size=({:.3}, {:.3}, {:.3}) at ({:.3}, {:.3}, {:.3})",
                    part.mesh.triangle_count(),
                    size.x,
                    size.y,
                    size.z,
                    p.x,
                    p.y,
                    p.z,
                );
            }
        }
    }

    Ok(())
}

fn handles_settled(composer: &SceneComposer) -> bool {
    let frame = composer.frame();
    [frame.left_leaf(), frame.right_leaf()]
        .iter()
        .all(|leaf| leaf.handle().is_none_or(|h| !h.is_loading()))
}
