pub mod cli;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod transcode;
pub mod workspace;

pub use error::{BgaError, Result};
