//! Orchestrator configuration.

use std::time::Duration;

use clipmill_media::rendition_cap;
use clipmill_models::Intensity;

/// What `submit` does when the backlog is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BacklogPolicy {
    /// Enqueue from a detached task; the caller returns immediately and
    /// the job waits for a backlog slot.
    #[default]
    Wait,
    /// Refuse the submission so the caller can surface the overload.
    Reject,
}

impl BacklogPolicy {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wait" => Some(Self::Wait),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum jobs running at once
    pub max_concurrent_jobs: usize,
    /// Backlog capacity for queued submissions
    pub queue_capacity: usize,
    /// Behavior when the backlog is full
    pub backlog_policy: BacklogPolicy,
    /// Intensity applied to renditions that do not pin their own
    pub default_intensity: Intensity,
    /// Lifetime of presigned retrieval URLs
    pub presign_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: rendition_cap(),
            queue_capacity: 256,
            backlog_policy: BacklogPolicy::default(),
            default_intensity: Intensity::default(),
            presign_ttl: Duration::from_secs(3600),
        }
    }
}

impl OrchestratorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("ORCH_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            queue_capacity: std::env::var("ORCH_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.queue_capacity),
            backlog_policy: std::env::var("ORCH_BACKLOG_POLICY")
                .ok()
                .and_then(|s| BacklogPolicy::parse(&s))
                .unwrap_or(defaults.backlog_policy),
            default_intensity: std::env::var("ORCH_DEFAULT_INTENSITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_intensity),
            presign_ttl: Duration::from_secs(
                std::env::var("ORCH_PRESIGN_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert!(config.max_concurrent_jobs >= 1);
        assert!(config.max_concurrent_jobs <= 8);
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.backlog_policy, BacklogPolicy::Wait);
        assert_eq!(config.default_intensity, Intensity::High);
    }

    #[test]
    fn test_backlog_policy_parse() {
        assert_eq!(BacklogPolicy::parse("wait"), Some(BacklogPolicy::Wait));
        assert_eq!(BacklogPolicy::parse("REJECT"), Some(BacklogPolicy::Reject));
        assert_eq!(BacklogPolicy::parse("drop"), None);
    }
}
