use crate::decoder::decode_all;
use crate::encoder::probe_encoder;
use crate::error::{BgaError, Result};
use crate::ffmpeg::Tools;
use crate::progress::ProgressSink;
use crate::prompt::RenderOptions;
use crate::transcode::{plan_stages, run_stage, LOSSLESS_FILE, WEB_FILE};
use crate::workspace::Workspace;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub chart: PathBuf,
    pub tools: Tools,
    pub output_root: PathBuf,
    pub verbose: bool,
    pub step_delay: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputArtifacts {
    pub lossless_path: Option<PathBuf>,
    pub web_path: Option<PathBuf>,
}

impl OutputArtifacts {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.lossless_path.iter().chain(self.web_path.iter()).map(PathBuf::as_path)
    }
}

/// `<root>/<name of the directory holding the chart>`.
pub fn output_dir_for(chart: &Path, output_root: &Path) -> PathBuf {
    let name = chart
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output".into());
    output_root.join(name)
}

/// Decode, then encode every requested output. The workspace is dropped on
/// every return path; files already written to the output directory stay.
pub fn run(cfg: &RunConfig, opts: &RenderOptions, sink: &mut impl ProgressSink) -> Result<OutputArtifacts> {
    let choice = opts.mode.wants_web().then(|| probe_encoder(&cfg.tools.ffmpeg));

    let ws = Workspace::create(&cfg.tools.decoder, &cfg.chart)?;
    tracing::info!(workspace = %ws.path().display(), "workspace ready");
    sink.stage("Decoding chart...");
    let streams = decode_all(&ws, cfg.verbose)?;
    let total_ms = streams.duration_ms();
    tracing::info!(
        total_ms,
        video_bytes = streams.video_bytes,
        audio_bytes = streams.audio_bytes,
        "decoded raw streams"
    );

    let out_dir = output_dir_for(&cfg.chart, &cfg.output_root);
    fs::create_dir_all(&out_dir)
        .map_err(|e| BgaError::io(format!("cannot create {}", out_dir.display()), e))?;

    let stages = plan_stages(opts, &ws, choice.as_ref(), &out_dir)?;
    for stage in &stages {
        run_stage(&cfg.tools.ffmpeg, stage, total_ms, cfg.step_delay, cfg.verbose, sink)?;
    }

    Ok(OutputArtifacts {
        lossless_path: opts.mode.wants_lossless().then(|| out_dir.join(LOSSLESS_FILE)),
        web_path: opts.mode.wants_web().then(|| out_dir.join(WEB_FILE)),
    })
}
