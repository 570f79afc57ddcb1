use crate::error::{BgaError, Result};
use dialoguer::{theme::ColorfulTheme, Input};

pub const DEFAULT_WIDTH: u32 = 256;
pub const DEFAULT_HEIGHT: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    LosslessOnly,
    WebOnly,
    Both,
}

impl Mode {
    pub fn wants_lossless(self) -> bool {
        matches!(self, Mode::LosslessOnly | Mode::Both)
    }

    pub fn wants_web(self) -> bool {
        matches!(self, Mode::WebOnly | Mode::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub mode: Mode,
}

/// Accepts exactly `1`, `2` or `3` (surrounding whitespace ignored).
pub fn parse_mode(raw: &str) -> std::result::Result<Mode, String> {
    match raw.trim() {
        "1" => Ok(Mode::LosslessOnly),
        "2" => Ok(Mode::WebOnly),
        "3" => Ok(Mode::Both),
        other => Err(format!("`{other}` is not a valid mode (expected 1, 2 or 3)")),
    }
}

/// `WxH`, `W x H` or `W H`; the `x` separator is case-insensitive.
/// Empty input yields the default resolution.
pub fn parse_resolution(raw: &str) -> std::result::Result<(u32, u32), String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok((DEFAULT_WIDTH, DEFAULT_HEIGHT));
    }

    let normalized = trimmed.to_ascii_lowercase().replace('x', " ");
    let parts: Vec<&str> = normalized.split_whitespace().collect();
    let [w, h] = parts.as_slice() else {
        return Err(format!("`{trimmed}` must be two numbers like 256x256"));
    };
    let width: u32 = w
        .parse()
        .map_err(|_| format!("`{w}` is not a positive integer"))?;
    let height: u32 = h
        .parse()
        .map_err(|_| format!("`{h}` is not a positive integer"))?;
    if width == 0 || height == 0 {
        return Err("width and height must be positive".into());
    }
    Ok((width, height))
}

/// Asks for whatever was not already supplied on the command line.
/// Invalid answers are fatal; there is no second chance.
pub fn ask_render_options(
    mode: Option<Mode>,
    resolution: Option<(u32, u32)>,
) -> Result<RenderOptions> {
    let theme = ColorfulTheme::default();

    let mode = match mode {
        Some(m) => m,
        None => {
            let raw: String = Input::with_theme(&theme)
                .with_prompt("Output mode (1 = lossless .avi, 2 = web .mp4, 3 = both)")
                .allow_empty(true)
                .interact_text()
                .map_err(|e| BgaError::Input(format!("Cannot read mode: {e}")))?;
            parse_mode(&raw).map_err(|e| BgaError::Input(format!("Invalid mode: {e}")))?
        }
    };

    let (width, height) = match resolution {
        Some(r) => r,
        None => {
            let raw: String = Input::with_theme(&theme)
                .with_prompt("Enter BMP width and height (press Enter for 256x256)")
                .allow_empty(true)
                .interact_text()
                .map_err(|e| BgaError::Input(format!("Cannot read resolution: {e}")))?;
            parse_resolution(&raw)
                .map_err(|e| BgaError::Input(format!("Invalid resolution format: {e}")))?
        }
    };

    Ok(RenderOptions {
        width,
        height,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("1"), Ok(Mode::LosslessOnly));
        assert_eq!(parse_mode("2"), Ok(Mode::WebOnly));
        assert_eq!(parse_mode(" 3\n"), Ok(Mode::Both));
        for bad in ["", "0", "4", "12", "one", "1.0", "-1"] {
            assert!(parse_mode(bad).is_err(), "expected `{bad}` to be rejected");
        }
    }

    #[test]
    fn test_mode_outputs() {
        assert!(Mode::LosslessOnly.wants_lossless());
        assert!(!Mode::LosslessOnly.wants_web());
        assert!(!Mode::WebOnly.wants_lossless());
        assert!(Mode::WebOnly.wants_web());
        assert!(Mode::Both.wants_lossless() && Mode::Both.wants_web());
    }

    #[test]
    fn test_default_resolution() {
        assert_eq!(parse_resolution(""), Ok((256, 256)));
        assert_eq!(parse_resolution("   "), Ok((256, 256)));
    }

    #[test]
    fn test_resolution_separators() {
        assert_eq!(parse_resolution("640x480"), Ok((640, 480)));
        assert_eq!(parse_resolution("640X480"), Ok((640, 480)));
        assert_eq!(parse_resolution("640 480"), Ok((640, 480)));
        assert_eq!(parse_resolution(" 512 x 512 "), Ok((512, 512)));
        assert_eq!(parse_resolution("1\t2"), Ok((1, 2)));
    }

    #[test]
    fn test_resolution_rejects_garbage() {
        for bad in [
            "640", "640x", "x480", "0x480", "640x0", "-1x480", "640x480x2", "abc", "6.5x4",
            "640*480",
        ] {
            assert!(parse_resolution(bad).is_err(), "expected `{bad}` to be rejected");
        }
    }
}
