use crate::error::{describe_status, BgaError, Result};
use crate::workspace::Workspace;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Stdio};

pub const FRAME_RATE: u32 = 30;
pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u32 = 2;
pub const BYTES_PER_SAMPLE: u32 = 2;

const AUDIO_BYTES_PER_SECOND: u64 = (SAMPLE_RATE * CHANNELS * BYTES_PER_SAMPLE) as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn flag(self) -> &'static str {
        match self {
            StreamKind::Video => "-v",
            StreamKind::Audio => "-a",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
        }
    }
}

/// Raw decoder output sitting in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStreams {
    pub video_bytes: u64,
    pub audio_bytes: u64,
}

impl RawStreams {
    pub fn duration_ms(&self) -> u64 {
        audio_duration_ms(self.audio_bytes)
    }
}

/// Length of s16le stereo 44.1 kHz PCM, rounded down to the millisecond.
pub fn audio_duration_ms(bytes: u64) -> u64 {
    (u128::from(bytes) * 1000 / u128::from(AUDIO_BYTES_PER_SECOND)) as u64
}

/// Runs `<decoder> <flag> <chart>` with stdout written to `dest`.
pub fn decode_stream(
    decoder: &Path,
    chart: &Path,
    kind: StreamKind,
    dest: &Path,
    verbose: bool,
) -> Result<u64> {
    let out = File::create(dest)
        .map_err(|e| BgaError::io(format!("cannot create {}", dest.display()), e))?;

    tracing::info!(stream = kind.name(), decoder = %decoder.display(), "running decoder");
    let status = Command::new(decoder)
        .arg(kind.flag())
        .arg(chart)
        .stdin(Stdio::null())
        .stdout(out)
        .stderr(if verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        })
        .status()
        .map_err(|e| BgaError::Decoder {
            stream: kind.name(),
            reason: format!("cannot run {}: {e}", decoder.display()),
        })?;

    if !status.success() {
        return Err(BgaError::Decoder {
            stream: kind.name(),
            reason: describe_status(status),
        });
    }

    let bytes = fs::metadata(dest)
        .map_err(|e| BgaError::io(format!("cannot stat {}", dest.display()), e))?
        .len();
    tracing::debug!(stream = kind.name(), bytes, "decoder finished");
    Ok(bytes)
}

/// Video first, then audio. Never overlapped.
pub fn decode_all(ws: &Workspace, verbose: bool) -> Result<RawStreams> {
    let video_bytes = decode_stream(&ws.decoder, &ws.chart, StreamKind::Video, &ws.video_raw, verbose)?;
    let audio_bytes = decode_stream(&ws.decoder, &ws.chart, StreamKind::Audio, &ws.audio_raw, verbose)?;

    let frame = u64::from(CHANNELS * BYTES_PER_SAMPLE);
    if audio_bytes % frame != 0 {
        tracing::warn!(audio_bytes, "audio stream is not a whole number of stereo frames");
    }
    Ok(RawStreams {
        video_bytes,
        audio_bytes,
    })
}
