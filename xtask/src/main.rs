use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for fenestra")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests and a CLI smoke run
    Check,
    /// Run all tests
    Test,
    /// Time the wall CSG cut
    Bench,
    /// Compose scenes through the CLI at the slider extremes
    Smoke,
    /// Build rustdoc for the workspace
    Doc,
}

/// Slider extremes plus the default scene.
const SMOKE_SIZES: [(&str, &str); 3] = [("1", "1"), ("0.5", "0.5"), ("3", "3")];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            cargo(
                "clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            )?;
            cargo("test", &["test", "--workspace"])?;
            smoke()?;
        }
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Bench => cargo(
            "bench",
            &["bench", "-p", "fenestra-mesh", "--bench", "bench_wall_csg"],
        )?,
        Commands::Smoke => smoke()?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
    }

    Ok(())
}

fn smoke() -> Result<()> {
    for (width, height) in SMOKE_SIZES {
        cargo(
            "scene",
            &[
                "run", "-q", "-p", "fenestra-cli", "--", "scene", "--width", width, "--height",
                height, "--rotation", "0.3", "--json",
            ],
        )?;
    }
    cargo(
        "handle model",
        &[
            "run",
            "-q",
            "-p",
            "fenestra-cli",
            "--",
            "handle",
            "assets/models/handle.gltf",
        ],
    )
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> {step}: cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed ({status})");
    }
    Ok(())
}
