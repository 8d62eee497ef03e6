//! The encoder seam: one external transcoder invocation per rendition.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use clipmill_models::{Intensity, RenditionSpec};

use crate::command::{check_ffmpeg, FfmpegCommand};
use crate::error::{MediaError, MediaResult};

/// Everything needed to produce one rendition from one input.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// Local input file
    pub input: PathBuf,
    /// Local output file
    pub output: PathBuf,
    /// Desired output profile
    pub spec: RenditionSpec,
    /// Effective intensity tier (spec override already applied)
    pub intensity: Intensity,
}

impl EncodeRequest {
    /// Build the FFmpeg invocation for this request.
    ///
    /// Video-only by scope decision: the audio stream is dropped so the
    /// encode cost stays on the video codec.
    pub fn ffmpeg_command(&self) -> FfmpegCommand {
        FfmpegCommand::new(&self.input, &self.output)
            .scale(self.spec.width, self.spec.height)
            .output_args(self.intensity.encoder_args())
            .crf(self.spec.crf)
            .pixel_format("yuv420p")
            .faststart()
            .drop_audio()
    }
}

/// Capability interface over the external transcoder process.
///
/// Orchestration tests substitute a fake implementation so the state machine
/// can be verified without real media tooling.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Produce `req.output` from `req.input`, or fail with the transcoder's
    /// diagnostic text.
    async fn encode(&self, req: &EncodeRequest) -> MediaResult<()>;
}

/// Encoder backed by the real `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder;

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, req: &EncodeRequest) -> MediaResult<()> {
        check_ffmpeg()?;

        if !req.input.exists() {
            return Err(MediaError::FileNotFound(req.input.clone()));
        }

        let cmd = req.ffmpeg_command();
        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MediaError::encode_failed(stderr, output.status.code()))
        }
    }
}
