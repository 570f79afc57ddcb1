use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoEncoder {
    Nvenc,
    Amf,
    Qsv,
    X264,
}

/// Hardware encoders in the order they are preferred.
const HARDWARE_PRIORITY: [VideoEncoder; 3] = [VideoEncoder::Nvenc, VideoEncoder::Amf, VideoEncoder::Qsv];

impl VideoEncoder {
    pub fn as_ffmpeg_codec(self) -> &'static str {
        match self {
            VideoEncoder::Nvenc => "h264_nvenc",
            VideoEncoder::Amf => "h264_amf",
            VideoEncoder::Qsv => "h264_qsv",
            VideoEncoder::X264 => "libx264",
        }
    }

    fn params(self) -> &'static [&'static str] {
        match self {
            VideoEncoder::Nvenc => &[
                "-preset", "p7", "-rc", "vbr", "-cq", "19", "-b:v", "0", "-profile:v", "high",
            ],
            VideoEncoder::Amf => &[
                "-quality", "quality", "-rc", "cqp", "-qp_i", "18", "-qp_p", "18", "-profile:v",
                "high",
            ],
            VideoEncoder::Qsv => &[
                "-preset", "veryslow", "-global_quality", "18", "-profile:v", "high",
            ],
            VideoEncoder::X264 => &[
                "-preset", "slow", "-crf", "18", "-profile:v", "high", "-level", "4.1",
            ],
        }
    }
}

/// Codec plus the arguments that follow `-c:v <codec>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderChoice {
    pub encoder: VideoEncoder,
    pub codec: &'static str,
    pub params: Vec<&'static str>,
}

impl EncoderChoice {
    pub fn new(encoder: VideoEncoder) -> Self {
        Self {
            encoder,
            codec: encoder.as_ffmpeg_codec(),
            params: encoder.params().to_vec(),
        }
    }

    pub fn software() -> Self {
        Self::new(VideoEncoder::X264)
    }

    pub fn is_hardware(&self) -> bool {
        self.encoder != VideoEncoder::X264
    }
}

/// Picks the first hardware encoder mentioned in an `ffmpeg -encoders` listing.
pub fn select_encoder(listing: &str) -> EncoderChoice {
    HARDWARE_PRIORITY
        .into_iter()
        .find(|enc| listing.contains(enc.as_ffmpeg_codec()))
        .map(EncoderChoice::new)
        .unwrap_or_else(EncoderChoice::software)
}

pub fn probe_encoder(ffmpeg: &Path) -> EncoderChoice {
    let output = match Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-encoders")
        .stdin(Stdio::null())
        .output()
    {
        Ok(o) => o,
        Err(err) => {
            tracing::warn!(%err, ffmpeg = %ffmpeg.display(), "encoder probe failed, using software encoder");
            return EncoderChoice::software();
        }
    };

    let choice = select_encoder(&String::from_utf8_lossy(&output.stdout));
    tracing::info!(codec = choice.codec, hardware = choice.is_hardware(), "selected web encoder");
    choice
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Encoders:
 V..... = Video
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (codec h264)
 V....D h264_qsv             H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (Intel Quick Sync Video acceleration) (codec h264)
 V....D h264_amf             AMD AMF H.264 Encoder (codec h264)
";

    #[test]
    fn test_encoder_to_codec() {
        assert_eq!(VideoEncoder::Nvenc.as_ffmpeg_codec(), "h264_nvenc");
        assert_eq!(VideoEncoder::X264.as_ffmpeg_codec(), "libx264");
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(select_encoder(LISTING).encoder, VideoEncoder::Amf);

        let with_nvenc = format!("{LISTING} V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)\n");
        assert_eq!(select_encoder(&with_nvenc).encoder, VideoEncoder::Nvenc);

        let qsv_only = " V....D h264_qsv  Intel\n V....D libx264  x264\n";
        assert_eq!(select_encoder(qsv_only).encoder, VideoEncoder::Qsv);
    }

    #[test]
    fn test_software_fallback() {
        let choice = select_encoder(" V....D libx264  x264\n");
        assert_eq!(choice, EncoderChoice::software());
        assert!(!choice.is_hardware());
        assert_eq!(
            choice.params,
            vec!["-preset", "slow", "-crf", "18", "-profile:v", "high", "-level", "4.1"]
        );
        assert_eq!(select_encoder("").codec, "libx264");
    }

    #[test]
    fn test_missing_toolchain_falls_back() {
        let choice = probe_encoder(Path::new("/definitely/not/a/real/ffmpeg-binary"));
        assert_eq!(choice, EncoderChoice::software());
    }
}
