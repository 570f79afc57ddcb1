use crate::decoder::{CHANNELS, FRAME_RATE, SAMPLE_RATE};
use crate::encoder::EncoderChoice;
use crate::error::{BgaError, Result};
use crate::ffmpeg::{spawn_ffmpeg, wait_for_completion};
use crate::progress::{PctRange, ProgressSink, ProgressState, StageMonitor};
use crate::prompt::{Mode, RenderOptions};
use crate::workspace::Workspace;
use std::ffi::OsString;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LOSSLESS_FILE: &str = "out.avi";
pub const WEB_FILE: &str = "out.mp4";

/// One ffmpeg run and the slice of the progress bar it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub label: &'static str,
    pub args: Vec<OsString>,
    pub output: PathBuf,
    pub range: PctRange,
}

fn push_args(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Both raw streams declared with their exact formats.
pub fn raw_input_args(opts: &RenderOptions, video_raw: &Path, audio_raw: &Path) -> Vec<OsString> {
    let mut args = Vec::new();
    push_args(&mut args, &["-f", "rawvideo", "-pixel_format", "rgb24", "-video_size"]);
    args.push(format!("{}x{}", opts.width, opts.height).into());
    args.push("-framerate".into());
    args.push(FRAME_RATE.to_string().into());
    args.push("-i".into());
    args.push(video_raw.into());
    push_args(&mut args, &["-f", "s16le", "-ar"]);
    args.push(SAMPLE_RATE.to_string().into());
    args.push("-ac".into());
    args.push(CHANNELS.to_string().into());
    args.push("-i".into());
    args.push(audio_raw.into());
    args
}

pub fn lossless_output_args(output: &Path) -> Vec<OsString> {
    let mut args = Vec::new();
    push_args(&mut args, &["-c:v", "huffyuv", "-c:a", "pcm_s16le"]);
    args.push(output.into());
    args
}

pub fn web_output_args(choice: &EncoderChoice, output: &Path) -> Vec<OsString> {
    let mut args = Vec::new();
    push_args(&mut args, &["-c:v", choice.codec]);
    push_args(&mut args, &choice.params);
    push_args(
        &mut args,
        &["-pix_fmt", "yuv420p", "-movflags", "+faststart", "-c:a", "aac", "-b:a", "192k"],
    );
    args.push(output.into());
    args
}

/// Lays out the ffmpeg runs for a mode. In `Both` the web file is encoded
/// from the finished lossless file, not from the raw streams.
pub fn plan_stages(
    opts: &RenderOptions,
    ws: &Workspace,
    choice: Option<&EncoderChoice>,
    out_dir: &Path,
) -> Result<Vec<Stage>> {
    let lossless = out_dir.join(LOSSLESS_FILE);
    let web = out_dir.join(WEB_FILE);
    let raw = raw_input_args(opts, &ws.video_raw, &ws.audio_raw);
    let need_choice = || {
        choice.ok_or_else(|| BgaError::Environment("no web encoder selected".into()))
    };

    let stages = match opts.mode {
        Mode::LosslessOnly => vec![Stage {
            label: "Encoding lossless video...",
            args: [raw, lossless_output_args(&lossless)].concat(),
            output: lossless,
            range: PctRange::FULL,
        }],
        Mode::WebOnly => vec![Stage {
            label: "Encoding web video...",
            args: [raw, web_output_args(need_choice()?, &web)].concat(),
            output: web,
            range: PctRange::FULL,
        }],
        Mode::Both => {
            let mut reencode: Vec<OsString> = vec!["-i".into(), lossless.clone().into()];
            reencode.extend(web_output_args(need_choice()?, &web));
            vec![
                Stage {
                    label: "Encoding lossless video...",
                    args: [raw, lossless_output_args(&lossless)].concat(),
                    output: lossless,
                    range: PctRange::new(0, 50),
                },
                Stage {
                    label: "Re-encoding for web...",
                    args: reencode,
                    output: web,
                    range: PctRange::new(50, 100),
                },
            ]
        }
    };
    Ok(stages)
}

/// Runs one stage to completion while driving the bar. Reading happens on
/// this thread; the child is only waited on after its stdout is drained.
pub fn run_stage(
    ffmpeg: &Path,
    stage: &Stage,
    total_ms: u64,
    step_delay: Duration,
    verbose: bool,
    sink: &mut impl ProgressSink,
) -> Result<ProgressState> {
    tracing::info!(output = %stage.output.display(), start = stage.range.start, end = stage.range.end, "starting ffmpeg stage");
    sink.stage(stage.label);

    let monitor = StageMonitor::new(total_ms, stage.range).with_step_delay(step_delay);
    let session = spawn_ffmpeg(ffmpeg, &stage.args, verbose)?;
    let state = monitor
        .consume(
            BufReader::new(session.stdout),
            ProgressState::starting_at(stage.range),
            sink,
        )
        .map_err(|e| BgaError::io("cannot read ffmpeg progress", e))?;

    wait_for_completion(session.child, &stage.output)?;
    Ok(monitor.complete(state, sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(mode: Mode) -> RenderOptions {
        RenderOptions {
            width: 320,
            height: 240,
            mode,
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_raw_inputs_declare_formats() {
        let args = strings(&raw_input_args(
            &opts(Mode::LosslessOnly),
            Path::new("/w/video_raw"),
            Path::new("/w/audio_raw"),
        ));
        assert_eq!(
            args,
            vec![
                "-f", "rawvideo", "-pixel_format", "rgb24", "-video_size", "320x240", "-framerate",
                "30", "-i", "/w/video_raw", "-f", "s16le", "-ar", "44100", "-ac", "2", "-i",
                "/w/audio_raw",
            ]
        );
    }

    #[test]
    fn test_lossless_output() {
        let args = strings(&lossless_output_args(Path::new("/o/out.avi")));
        assert_eq!(args, vec!["-c:v", "huffyuv", "-c:a", "pcm_s16le", "/o/out.avi"]);
    }

    #[test]
    fn test_web_output_uses_choice() {
        let args = strings(&web_output_args(&EncoderChoice::software(), Path::new("/o/out.mp4")));
        assert_eq!(&args[..2], ["-c:v", "libx264"]);
        assert!(args.windows(2).any(|w| w == ["-crf", "18"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
        assert_eq!(args.last().map(String::as_str), Some("/o/out.mp4"));
    }

    fn workspace() -> (tempfile::TempDir, Workspace) {
        let src = tempfile::tempdir().unwrap();
        let chart = src.path().join("song.bms");
        std::fs::write(&chart, b"").unwrap();
        let decoder = src.path().join("bga_compo");
        std::fs::write(&decoder, b"").unwrap();
        let ws = Workspace::create(&decoder, &chart).unwrap();
        (src, ws)
    }

    #[test]
    fn test_plan_lossless_only() {
        let (_src, ws) = workspace();
        let stages = plan_stages(&opts(Mode::LosslessOnly), &ws, None, Path::new("/o")).unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].output, Path::new("/o/out.avi"));
        assert_eq!(stages[0].range, PctRange::FULL);
    }

    #[test]
    fn test_plan_web_needs_encoder() {
        let (_src, ws) = workspace();
        assert!(plan_stages(&opts(Mode::WebOnly), &ws, None, Path::new("/o")).is_err());

        let choice = EncoderChoice::software();
        let stages = plan_stages(&opts(Mode::WebOnly), &ws, Some(&choice), Path::new("/o")).unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].output, Path::new("/o/out.mp4"));
        assert!(strings(&stages[0].args).contains(&"rawvideo".to_string()));
    }

    #[test]
    fn test_plan_both_chains_from_lossless() {
        let (_src, ws) = workspace();
        let choice = EncoderChoice::software();
        let stages = plan_stages(&opts(Mode::Both), &ws, Some(&choice), Path::new("/o")).unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].range, PctRange::new(0, 50));
        assert_eq!(stages[1].range, PctRange::new(50, 100));

        let second = strings(&stages[1].args);
        assert_eq!(&second[..2], ["-i", "/o/out.avi"]);
        assert!(!second.contains(&"rawvideo".to_string()));
        assert_eq!(second.iter().filter(|a| *a == "-i").count(), 1);
    }
}
