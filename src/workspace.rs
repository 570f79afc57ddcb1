use crate::error::{BgaError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const WORKSPACE_PREFIX: &str = "bga_tmp_";
const CHART_DIR: &str = "chart";

/// Scratch directory owned by one conversion. Everything in it, including the
/// raw streams, is removed when the value is dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    pub decoder: PathBuf,
    pub chart: PathBuf,
    pub video_raw: PathBuf,
    pub audio_raw: PathBuf,
}

impl Workspace {
    /// Copies the decoder and the chart's whole directory (bitmaps and
    /// sounds live next to the chart) into a fresh temp dir.
    pub fn create(decoder: &Path, chart: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| BgaError::io("cannot create temporary workspace", e))?;
        tracing::debug!(path = %dir.path().display(), "created workspace");

        let decoder_name = decoder
            .file_name()
            .ok_or_else(|| BgaError::Environment(format!("Invalid decoder path: {}", decoder.display())))?;
        let decoder_copy = dir.path().join(decoder_name);
        fs::copy(decoder, &decoder_copy)
            .map_err(|e| BgaError::io(format!("cannot copy decoder {}", decoder.display()), e))?;

        let chart_name = chart
            .file_name()
            .ok_or_else(|| BgaError::Usage(format!("Invalid chart path: {}", chart.display())))?;
        let chart_src_dir = chart.parent().unwrap_or(Path::new("."));
        let chart_dir = dir.path().join(CHART_DIR);
        copy_dir_recursive(chart_src_dir, &chart_dir)?;

        Ok(Self {
            decoder: decoder_copy,
            chart: chart_dir.join(chart_name),
            video_raw: dir.path().join("video_raw"),
            audio_raw: dir.path().join("audio_raw"),
            dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<u64> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| {
            let msg = format!("cannot read {}", src.display());
            BgaError::io(msg, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| BgaError::Environment(format!("unexpected path {}", entry.path().display())))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| BgaError::io(format!("cannot create {}", target.display()), e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| BgaError::io(format!("cannot copy {}", entry.path().display()), e))?;
            copied += 1;
        }
    }
    tracing::debug!(files = copied, from = %src.display(), "copied chart directory");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_dir_recursive() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("bmp/sub")).unwrap();
        fs::write(src.path().join("song.bme"), b"#TITLE x").unwrap();
        fs::write(src.path().join("bmp/sub/01.bmp"), b"BM").unwrap();

        let dst = tempfile::tempdir().unwrap();
        let out = dst.path().join("copy");
        assert_eq!(copy_dir_recursive(src.path(), &out).unwrap(), 2);
        assert_eq!(fs::read(out.join("bmp/sub/01.bmp")).unwrap(), b"BM");
        assert!(out.join("song.bme").is_file());
    }

    #[test]
    fn test_workspace_is_removed_on_drop() {
        let src = tempfile::tempdir().unwrap();
        let chart = src.path().join("song.bms");
        fs::write(&chart, b"#BPM 120").unwrap();
        let decoder = src.path().join("bga_compo");
        fs::write(&decoder, b"stub").unwrap();

        let ws = Workspace::create(&decoder, &chart).unwrap();
        let root = ws.path().to_path_buf();
        assert!(ws.decoder.is_file());
        assert!(ws.chart.is_file());
        assert!(ws.chart.starts_with(&root));
        assert!(!ws.video_raw.exists());
        assert!(
            root.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(WORKSPACE_PREFIX))
        );

        drop(ws);
        assert!(!root.exists());
    }
}
