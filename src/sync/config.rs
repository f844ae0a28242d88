//! Sync engine configuration

use std::time::Duration;

/// Default heartbeat interval for event streams
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Default time a subscriber gets to accept a frame
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default per-connection frame buffer
pub const DEFAULT_EVENT_BUFFER: usize = 32;

/// Configuration for the sync engine and its event streams
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between heartbeat envelopes on every event stream
    pub heartbeat_interval: Duration,

    /// How long a send may wait for room in a subscriber's buffer
    pub send_timeout: Duration,

    /// Frames buffered per event stream before sends start waiting
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl SyncConfig {
    /// Set the heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the per-connection buffer size (at least 1)
    pub fn event_buffer(mut self, frames: usize) -> Self {
        self.event_buffer = frames.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();

        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert_eq!(config.send_timeout, Duration::from_secs(5));
        assert_eq!(config.event_buffer, 32);
    }

    #[test]
    fn test_event_buffer_minimum() {
        let config = SyncConfig::default().event_buffer(0);

        assert_eq!(config.event_buffer, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = SyncConfig::default()
            .heartbeat_interval(Duration::from_secs(15))
            .send_timeout(Duration::from_millis(250))
            .event_buffer(8);

        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(config.send_timeout, Duration::from_millis(250));
        assert_eq!(config.event_buffer, 8);
    }
}
