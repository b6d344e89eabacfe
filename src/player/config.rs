//! Engine configuration: buffering thresholds and adaptive selection policy

use std::time::Duration;

use super::error::{PlayerError, PlayerResult};

/// Buffering thresholds handed to the engine's load control.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadControl {
    /// Buffer the engine always tries to keep ahead of the playhead.
    pub min_buffer: Duration,
    /// Buffer above which loading pauses.
    pub max_buffer: Duration,
    /// Buffer required to start playback after a seek or first load.
    pub buffer_for_playback: Duration,
    /// Buffer required to restart playback after a rebuffer.
    pub buffer_for_playback_after_rebuffer: Duration,
}

impl Default for LoadControl {
    fn default() -> Self {
        Self {
            min_buffer: Duration::from_millis(2500),
            max_buffer: Duration::from_millis(5000),
            buffer_for_playback: Duration::from_millis(2000),
            buffer_for_playback_after_rebuffer: Duration::from_millis(2000),
        }
    }
}

/// Adaptive bitrate selection policy.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackSelection {
    pub min_duration_for_quality_increase: Duration,
    pub max_duration_for_quality_decrease: Duration,
    pub min_duration_to_retain_after_discard: Duration,
    /// Share of the estimated bandwidth the selected track may use.
    pub bandwidth_fraction: f32,
}

impl Default for TrackSelection {
    fn default() -> Self {
        Self {
            min_duration_for_quality_increase: Duration::from_millis(10_000),
            max_duration_for_quality_decrease: Duration::from_millis(5000),
            min_duration_to_retain_after_discard: Duration::from_millis(5000),
            bandwidth_fraction: 0.7,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineConfig {
    pub load_control: LoadControl,
    pub track_selection: TrackSelection,
}

impl EngineConfig {
    pub fn validate(&self) -> PlayerResult<()> {
        let lc = &self.load_control;
        if lc.buffer_for_playback > lc.min_buffer {
            return Err(PlayerError::InvalidConfig(
                "buffer_for_playback must not exceed min_buffer".to_string(),
            ));
        }
        if lc.buffer_for_playback_after_rebuffer > lc.min_buffer {
            return Err(PlayerError::InvalidConfig(
                "buffer_for_playback_after_rebuffer must not exceed min_buffer".to_string(),
            ));
        }
        if lc.min_buffer > lc.max_buffer {
            return Err(PlayerError::InvalidConfig(
                "min_buffer must not exceed max_buffer".to_string(),
            ));
        }

        let fraction = self.track_selection.bandwidth_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(PlayerError::InvalidConfig(format!(
                "bandwidth_fraction must be in (0, 1], got {}",
                fraction
            )));
        }

        Ok(())
    }
}

/// Behaviour flags for the cache-aware data source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheFlags {
    /// Any cache failure switches the source to upstream-only instead of failing the read.
    pub ignore_cache_on_error: bool,
}

impl Default for CacheFlags {
    fn default() -> Self {
        Self {
            ignore_cache_on_error: true,
        }
    }
}
