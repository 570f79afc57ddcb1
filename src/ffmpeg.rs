use crate::error::{describe_status, BgaError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use which::which;

pub const DECODER_NAME: &str = if cfg!(windows) { "bga_compo.exe" } else { "bga_compo" };

#[derive(Debug, Clone)]
pub struct Tools {
    pub ffmpeg: PathBuf,
    pub decoder: PathBuf,
}

#[derive(Debug)]
pub struct FfmpegSession {
    pub child: Child,
    pub stdout: ChildStdout,
}

/// The decoder ships next to our executable unless overridden. ffmpeg comes
/// from PATH unless overridden.
pub fn resolve_tools(
    ffmpeg: Option<PathBuf>,
    decoder: Option<PathBuf>,
    exe_dir: &Path,
) -> Result<Tools> {
    let decoder = decoder.unwrap_or_else(|| exe_dir.join(DECODER_NAME));
    if !decoder.is_file() {
        return Err(BgaError::Environment(format!(
            "Embedded {} not found: {}",
            DECODER_NAME,
            decoder.display()
        )));
    }
    Ok(Tools {
        ffmpeg: resolve_ffmpeg(ffmpeg)?,
        decoder,
    })
}

/// Runs ffmpeg with `-progress` on stdout. `args` are everything after the
/// global flags, ending with the output path.
pub fn spawn_ffmpeg(ffmpeg: &Path, args: &[OsString], verbose: bool) -> Result<FfmpegSession> {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-hide_banner");
    if !verbose {
        cmd.arg("-nostats").arg("-loglevel").arg("error");
    }
    cmd.arg("-y").arg("-progress").arg("pipe:1").args(args);
    tracing::debug!(?cmd, "spawning ffmpeg");

    let output = args.last().map(PathBuf::from).unwrap_or_default();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(if verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        })
        .spawn()
        .map_err(|e| BgaError::Encoder {
            output: output.clone(),
            reason: format!("cannot run {}: {e}", ffmpeg.display()),
        })?;

    let stdout = child.stdout.take().ok_or_else(|| BgaError::Encoder {
        output,
        reason: "failed to capture ffmpeg stdout".into(),
    })?;

    Ok(FfmpegSession { child, stdout })
}

pub fn wait_for_completion(mut child: Child, output: &Path) -> Result<()> {
    let status = child
        .wait()
        .map_err(|e| BgaError::io("cannot wait for ffmpeg", e))?;
    if !status.success() {
        return Err(BgaError::Encoder {
            output: output.to_path_buf(),
            reason: describe_status(status),
        });
    }
    Ok(())
}

fn resolve_ffmpeg(bin_opt: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = bin_opt {
        if path.is_file() {
            return Ok(path);
        }
        return Err(BgaError::Environment(format!(
            "Provided ffmpeg not found: {}",
            path.display()
        )));
    }

    // A missing ffmpeg only matters once we try to run it; the probe falls
    // back to software and the first encode reports the failure.
    match which("ffmpeg") {
        Ok(path) => Ok(path),
        Err(err) => {
            tracing::warn!(%err, "`ffmpeg` not found in PATH");
            Ok(PathBuf::from("ffmpeg"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_decoder_is_environment_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_tools(None, None, dir.path()).unwrap_err();
        assert!(matches!(err, BgaError::Environment(_)), "{err}");
        assert!(err.to_string().contains(DECODER_NAME));
    }

    #[test]
    fn test_explicit_paths_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = dir.path().join("my_decoder");
        std::fs::write(&decoder, b"").unwrap();
        let ffmpeg = dir.path().join("my_ffmpeg");
        std::fs::write(&ffmpeg, b"").unwrap();

        let tools = resolve_tools(Some(ffmpeg.clone()), Some(decoder.clone()), Path::new("/")).unwrap();
        assert_eq!(tools.decoder, decoder);
        assert_eq!(tools.ffmpeg, ffmpeg);

        let err = resolve_tools(Some(dir.path().join("gone")), Some(decoder), Path::new("/")).unwrap_err();
        assert!(matches!(err, BgaError::Environment(_)));
    }
}
