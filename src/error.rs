use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Every way a conversion can fail. None of them are recoverable; the binary
/// reports the message and exits.
#[derive(Debug, thiserror::Error)]
pub enum BgaError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Environment(String),

    #[error("{0}")]
    Input(String),

    #[error("Decoder failed ({stream} stream): {reason}")]
    Decoder { stream: &'static str, reason: String },

    #[error("ffmpeg failed while writing {}: {reason}", .output.display())]
    Encoder { output: PathBuf, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BgaError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BgaError::Io {
            context: context.into(),
            source,
        }
    }
}

pub(crate) fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BgaError>;
