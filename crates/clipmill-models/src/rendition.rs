//! Rendition specs, intensity tiers, and produced output descriptors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum meaningful CRF value for libx264.
pub const MAX_CRF: u8 = 51;

/// Errors produced when validating a rendition spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("width and height must be positive, got {width}x{height}")]
    NonPositiveDimensions { width: u32, height: u32 },

    #[error("crf must be at most {MAX_CRF}, got {0}")]
    CrfOutOfRange(u8),

    #[error("label {0:?} is not filesystem-safe")]
    UnsafeLabel(String),

    #[error("unknown intensity {0:?}")]
    UnknownIntensity(String),
}

/// Encoding effort tier, trading wall-clock time for compression efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    /// Fastest encode, lowest CPU usage
    Low,
    /// Balanced
    Medium,
    /// Default: thorough encode
    #[default]
    High,
    /// Maximum CPU burn. A demonstration tier for load testing, not a
    /// production default.
    Max,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
            Intensity::Max => "max",
        }
    }

    /// x264 preset arguments for this tier. All tiers let the encoder pick
    /// its own thread count.
    pub fn encoder_args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            Intensity::Low => &["-c:v", "libx264", "-preset", "faster", "-threads", "0"],
            Intensity::Medium => &["-c:v", "libx264", "-preset", "slow", "-threads", "0"],
            Intensity::High => &["-c:v", "libx264", "-preset", "veryslow", "-threads", "0"],
            Intensity::Max => &[
                "-c:v",
                "libx264",
                "-preset",
                "placebo",
                "-tune",
                "film",
                "-threads",
                "0",
                "-x264-params",
                "me=tesa:subme=10:merange=64:ref=6:rc-lookahead=60",
            ],
        };
        args.iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Intensity {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            "max" => Ok(Intensity::Max),
            other => Err(SpecError::UnknownIntensity(other.to_string())),
        }
    }
}

/// One desired output profile for a transcode job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RenditionSpec {
    /// Target width in pixels
    pub width: u32,

    /// Target height in pixels
    pub height: u32,

    /// Constant Rate Factor (quality, lower is better)
    pub crf: u8,

    /// Label used to build output filenames (e.g. "1080p")
    pub label: String,

    /// Optional per-spec intensity override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Intensity>,
}

impl RenditionSpec {
    /// Create a new spec.
    pub fn new(width: u32, height: u32, crf: u8, label: impl Into<String>) -> Self {
        Self {
            width,
            height,
            crf,
            label: label.into(),
            intensity: None,
        }
    }

    /// Validate dimensions, quality parameter, and label safety.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.width == 0 || self.height == 0 {
            return Err(SpecError::NonPositiveDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.crf > MAX_CRF {
            return Err(SpecError::CrfOutOfRange(self.crf));
        }
        if !is_filesystem_safe(&self.label) {
            return Err(SpecError::UnsafeLabel(self.label.clone()));
        }
        Ok(())
    }
}

/// Labels end up in output filenames and storage keys, so they are restricted
/// to alphanumerics, hyphens, and underscores.
fn is_filesystem_safe(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 64
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Default rendition ladder applied when a job request omits renditions.
pub fn default_rendition_ladder() -> Vec<RenditionSpec> {
    vec![
        RenditionSpec::new(1920, 1080, 18, "1080p"),
        RenditionSpec::new(1280, 720, 20, "720p"),
        RenditionSpec::new(854, 480, 22, "480p"),
    ]
}

/// One successfully transcoded and uploaded rendition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProducedOutput {
    /// Rendition label
    pub label: String,

    /// Storage key of the uploaded artifact
    pub storage_key: String,

    /// Artifact size in bytes
    pub size_bytes: u64,

    /// Short-lived retrieval URL, when the storage backend supports
    /// presigning. `None` means "fetch via the stream endpoint".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_url: Option<String>,

    /// Wall-clock seconds spent encoding this rendition
    pub encode_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_spec() {
        let spec = RenditionSpec::new(1920, 1080, 18, "1080p");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let spec = RenditionSpec::new(0, 1080, 18, "1080p");
        assert_eq!(
            spec.validate(),
            Err(SpecError::NonPositiveDimensions {
                width: 0,
                height: 1080
            })
        );
    }

    #[test]
    fn test_crf_out_of_range_rejected() {
        let spec = RenditionSpec::new(1280, 720, 52, "720p");
        assert_eq!(spec.validate(), Err(SpecError::CrfOutOfRange(52)));
    }

    #[test]
    fn test_unsafe_labels_rejected() {
        for label in ["", "has space", "../escape", "a/b", "dot.dot"] {
            let spec = RenditionSpec::new(1280, 720, 20, label);
            assert!(spec.validate().is_err(), "label {:?} should fail", label);
        }
    }

    #[test]
    fn test_default_ladder() {
        let ladder = default_rendition_ladder();
        assert_eq!(ladder.len(), 3);
        assert_eq!(ladder[0].label, "1080p");
        assert!(ladder.iter().all(|s| s.validate().is_ok()));
    }

    #[test]
    fn test_max_intensity_args() {
        let args = Intensity::Max.encoder_args();
        assert!(args.contains(&"placebo".to_string()));
        assert!(args.iter().any(|a| a.contains("me=tesa")));
    }

    #[test]
    fn test_intensity_default_is_high() {
        assert_eq!(Intensity::default(), Intensity::High);
        assert!(Intensity::High.encoder_args().contains(&"veryslow".to_string()));
    }
}
