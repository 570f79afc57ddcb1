use crate::error::{BgaError, Result};
use crate::ffmpeg::{resolve_tools, Tools};
use crate::prompt::{parse_mode, parse_resolution, Mode};
use clap::{ArgAction, Parser, ValueHint};
use std::path::{Path, PathBuf};

/// File extensions of the BMS chart family.
pub const CHART_EXTENSIONS: [&str; 4] = ["bms", "bme", "bml", "pms"];

#[derive(Parser, Debug)]
#[command(
    name = "bga_render",
    version,
    about = "Render a BMS chart's background animation to video"
)]
pub struct Cli {
    /// Chart file (.bms/.bme/.bml/.pms)
    #[arg(value_hint = ValueHint::FilePath)]
    pub chart: Option<PathBuf>,

    /// Output mode: 1 = lossless .avi, 2 = web .mp4, 3 = both (skips the prompt)
    #[arg(short = 'm', long, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// BGA resolution such as 256x256 (skips the prompt)
    #[arg(short = 'r', long, value_parser = parse_resolution)]
    pub resolution: Option<(u32, u32)>,

    /// Path to the chart decoder (default: next to this executable)
    #[arg(long, value_hint = ValueHint::ExecutablePath)]
    pub decoder: Option<PathBuf>,

    /// Path to ffmpeg binary (overrides PATH lookup)
    #[arg(long, value_hint = ValueHint::ExecutablePath)]
    pub ffmpeg: Option<PathBuf>,

    /// Directory receiving the per-chart output folder (default: next to this executable)
    #[arg(short = 'o', long, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Show decoder and ffmpeg logs (useful for debugging)
    #[arg(long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Exit without waiting for Enter
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_pause: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chart: PathBuf,
    pub mode: Option<Mode>,
    pub resolution: Option<(u32, u32)>,
    pub tools: Tools,
    pub output_root: PathBuf,
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self, exe_dir: &Path) -> Result<AppConfig> {
        let chart = self.chart.ok_or_else(|| {
            BgaError::Usage("Drag and drop a .bms/.bme file onto this executable".into())
        })?;
        if !chart.exists() {
            return Err(BgaError::Usage(format!("Input file not found: {}", chart.display())));
        }
        let chart = chart
            .canonicalize()
            .map_err(|e| BgaError::io(format!("cannot resolve {}", chart.display()), e))?;
        if !is_chart_file(&chart) {
            tracing::warn!(chart = %chart.display(), "file does not look like a BMS chart");
        }

        let tools = resolve_tools(self.ffmpeg, self.decoder, exe_dir)?;

        Ok(AppConfig {
            chart,
            mode: self.mode,
            resolution: self.resolution,
            tools,
            output_root: self.output_dir.unwrap_or_else(|| exe_dir.to_path_buf()),
            verbose: self.verbose,
        })
    }
}

pub fn is_chart_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CHART_EXTENSIONS.iter().any(|c| e.eq_ignore_ascii_case(c)))
}
