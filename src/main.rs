use anyhow::{Context, Result};
use bga_render::cli::Cli;
use bga_render::pipeline::{self, OutputArtifacts, RunConfig};
use bga_render::progress::{ProgressUi, STEP_DELAY};
use bga_render::prompt::ask_render_options;
use clap::Parser;
use dialoguer::Input;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let pause = !cli.no_pause;

    match run(cli) {
        Ok(artifacts) => {
            report(&artifacts);
            acknowledge(pause);
        }
        Err(err) => die(&format!("{err:#}"), pause),
    }
}

fn run(cli: Cli) -> Result<OutputArtifacts> {
    let exe_dir = exe_dir()?;
    let cfg = cli.into_config(&exe_dir)?;
    let opts = ask_render_options(cfg.mode, cfg.resolution)?;
    tracing::debug!(?opts, chart = %cfg.chart.display(), "render options");

    let run_cfg = RunConfig {
        chart: cfg.chart,
        tools: cfg.tools,
        output_root: cfg.output_root,
        verbose: cfg.verbose,
        step_delay: STEP_DELAY,
    };

    let mut ui = ProgressUi::new();
    match pipeline::run(&run_cfg, &opts, &mut ui) {
        Ok(artifacts) => {
            ui.finish();
            Ok(artifacts)
        }
        Err(err) => {
            ui.abandon();
            Err(err.into())
        }
    }
}

fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate this executable")?;
    Ok(exe
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "bga_render=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(artifacts: &OutputArtifacts) {
    println!();
    if let Some(path) = &artifacts.lossless_path {
        println!("Lossless video created:\n{}\n", path.display());
    }
    if let Some(path) = &artifacts.web_path {
        println!("Web-compatible video created:\n{}\n", path.display());
    }
}

/// Blocks until Enter so a double-clicked console stays open.
fn acknowledge(pause: bool) {
    if !pause {
        return;
    }
    let _ = Input::<String>::new()
        .with_prompt("Press Enter to exit")
        .allow_empty(true)
        .interact_text();
}

fn die(msg: &str, pause: bool) -> ! {
    eprintln!("{msg}");
    acknowledge(pause);
    std::process::exit(1);
}
