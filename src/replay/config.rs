//! Replay configuration

use std::time::Duration;

/// Default pause between video tags
pub const DEFAULT_TAG_INTERVAL: Duration = Duration::from_millis(20);

/// Replay configuration options
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Pause between consecutive video tags
    pub interval: Duration,

    /// Start over from the first video tag after the last one
    pub loop_playback: bool,

    /// Send the metadata tag once before the first video tag
    pub send_metadata: bool,

    /// Stop after this many full passes (None = until shutdown)
    pub max_passes: Option<u32>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TAG_INTERVAL,
            loop_playback: true,
            send_metadata: true,
            max_passes: None,
        }
    }
}

impl ReplayConfig {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Play the video tags once
    pub fn once(mut self) -> Self {
        self.loop_playback = false;
        self
    }

    pub fn without_metadata(mut self) -> Self {
        self.send_metadata = false;
        self
    }

    pub fn max_passes(mut self, passes: u32) -> Self {
        self.max_passes = Some(passes);
        self
    }
}
