//! Configuration
//!
//! Layered settings for the serial link, the poll cadence and the frame
//! loop. Priority, highest first:
//!
//! 1. Command-line overrides ([`ConfigOverrides`])
//! 2. `JUDGE_*` environment variables ([`JudgeConfig::from_env`])
//! 3. Built-in defaults
//!
//! There is no configuration file.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting is out of range
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Serial link settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path
    pub port: String,
    /// Line speed
    pub baud_rate: u32,
    /// How long a single line read may wait
    pub line_timeout: Duration,
    /// Wait after resetting the microcontroller before the first poll
    pub settle_delay: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            line_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Poll cadence settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Minimum wall-clock time between poll starts
    pub interval: Duration,
    /// Upper bound on one request/response exchange
    pub budget: Duration,
    /// Consecutive timed-out polls treated as a dead device (0 = never)
    pub stall_limit: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            budget: Duration::from_millis(500),
            stall_limit: 40,
        }
    }
}

/// Frame loop settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Frame rate cap
    pub fps: u32,
    /// How long the error screen stays up before the loop exits
    pub failure_grace: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            failure_grace: Duration::from_secs(3),
        }
    }
}

impl FrameConfig {
    /// Duration of one frame at the configured rate
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

/// Complete simulator configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Serial link
    pub serial: SerialConfig,
    /// Poll cadence
    pub polling: PollConfig,
    /// Frame loop
    pub frame: FrameConfig,
}

impl JudgeConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `JUDGE_PORT`: Serial device path
    /// - `JUDGE_BAUD`: Baud rate
    /// - `JUDGE_LINE_TIMEOUT_MS`: Per-line read timeout
    /// - `JUDGE_SETTLE_MS`: Wait after reset before polling
    /// - `JUDGE_POLL_INTERVAL_MS`: Time between polls
    /// - `JUDGE_POLL_BUDGET_MS`: Upper bound on one poll
    /// - `JUDGE_STALL_LIMIT`: Timed-out polls before giving up (0 = never)
    /// - `JUDGE_FPS`: Frame rate cap
    /// - `JUDGE_FAILURE_GRACE_MS`: How long the error screen stays up
    ///
    /// Unparsable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("JUDGE_PORT").filter(|p| !p.trim().is_empty()) {
            config.serial.port = port;
        }
        if let Some(baud) = parse_var(&lookup, "JUDGE_BAUD") {
            config.serial.baud_rate = baud;
        }
        if let Some(ms) = parse_var(&lookup, "JUDGE_LINE_TIMEOUT_MS") {
            config.serial.line_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "JUDGE_SETTLE_MS") {
            config.serial.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "JUDGE_POLL_INTERVAL_MS") {
            config.polling.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "JUDGE_POLL_BUDGET_MS") {
            config.polling.budget = Duration::from_millis(ms);
        }
        if let Some(limit) = parse_var(&lookup, "JUDGE_STALL_LIMIT") {
            config.polling.stall_limit = limit;
        }
        if let Some(fps) = parse_var(&lookup, "JUDGE_FPS") {
            config.frame.fps = fps;
        }
        if let Some(ms) = parse_var(&lookup, "JUDGE_FAILURE_GRACE_MS") {
            config.frame.failure_grace = Duration::from_millis(ms);
        }

        config
    }

    /// Check that every setting is usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::Validation(
                "serial port path is empty".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Validation("baud rate must be > 0".to_string()));
        }
        if self.serial.line_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "line timeout must be > 0".to_string(),
            ));
        }
        if self.polling.interval.is_zero() {
            return Err(ConfigError::Validation(
                "poll interval must be > 0".to_string(),
            ));
        }
        if self.polling.budget.is_zero() {
            return Err(ConfigError::Validation(
                "poll budget must be > 0".to_string(),
            ));
        }
        if !(1..=240).contains(&self.frame.fps) {
            return Err(ConfigError::Validation(format!(
                "fps must be between 1 and 240, got {}",
                self.frame.fps
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

/// Command-line overrides, applied on top of [`JudgeConfig::from_env`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Serial device path
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: Option<u32>,
    /// Poll interval (milliseconds)
    pub poll_interval_ms: Option<u64>,
    /// Poll budget (milliseconds)
    pub poll_budget_ms: Option<u64>,
    /// Stall limit
    pub stall_limit: Option<u32>,
    /// Frame rate cap
    pub fps: Option<u32>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set serial port override
    #[must_use]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Set baud rate override
    #[must_use]
    pub fn with_baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Set poll interval override
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = Some(ms);
        self
    }

    /// Set poll budget override
    #[must_use]
    pub fn with_poll_budget_ms(mut self, ms: u64) -> Self {
        self.poll_budget_ms = Some(ms);
        self
    }

    /// Set stall limit override
    #[must_use]
    pub fn with_stall_limit(mut self, limit: u32) -> Self {
        self.stall_limit = Some(limit);
        self
    }

    /// Set frame rate override
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut JudgeConfig) {
        if let Some(port) = &self.port {
            config.serial.port.clone_from(port);
        }
        if let Some(baud) = self.baud_rate {
            config.serial.baud_rate = baud;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.polling.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.poll_budget_ms {
            config.polling.budget = Duration::from_millis(ms);
        }
        if let Some(limit) = self.stall_limit {
            config.polling.stall_limit = limit;
        }
        if let Some(fps) = self.fps {
            config.frame.fps = fps;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = JudgeConfig::default();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.line_timeout, Duration::from_secs(1));
        assert_eq!(config.serial.settle_delay, Duration::from_secs(2));
        assert_eq!(config.polling.interval, Duration::from_millis(50));
        assert_eq!(config.polling.budget, Duration::from_millis(500));
        assert_eq!(config.polling.stall_limit, 40);
        assert_eq!(config.frame.fps, 60);
        assert_eq!(config.frame.failure_grace, Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_layer() {
        let config = JudgeConfig::from_lookup(lookup(&[
            ("JUDGE_PORT", "/dev/ttyUSB0"),
            ("JUDGE_BAUD", "115200"),
            ("JUDGE_POLL_INTERVAL_MS", "100"),
            ("JUDGE_STALL_LIMIT", "0"),
            ("JUDGE_FPS", "30"),
            ("JUDGE_SETTLE_MS", "0"),
        ]));
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.polling.interval, Duration::from_millis(100));
        assert_eq!(config.polling.stall_limit, 0);
        assert_eq!(config.frame.fps, 30);
        assert_eq!(config.serial.settle_delay, Duration::ZERO);
        // Untouched values keep their defaults
        assert_eq!(config.polling.budget, Duration::from_millis(500));
    }

    #[test]
    fn test_env_garbage_ignored() {
        let config = JudgeConfig::from_lookup(lookup(&[
            ("JUDGE_BAUD", "fast"),
            ("JUDGE_FPS", "-1"),
            ("JUDGE_PORT", "   "),
        ]));
        assert_eq!(config, JudgeConfig::default());
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = JudgeConfig::from_lookup(lookup(&[
            ("JUDGE_PORT", "/dev/ttyUSB0"),
            ("JUDGE_FPS", "30"),
        ]));
        ConfigOverrides::new()
            .with_port("/dev/ttyACM1")
            .with_poll_budget_ms(250)
            .apply(&mut config);

        assert_eq!(config.serial.port, "/dev/ttyACM1");
        assert_eq!(config.polling.budget, Duration::from_millis(250));
        assert_eq!(config.frame.fps, 30);
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let mut config = JudgeConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config, JudgeConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = JudgeConfig::default();
        config.frame.fps = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fps"));

        let mut config = JudgeConfig::default();
        config.polling.budget = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = JudgeConfig::default();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_period() {
        let frame = FrameConfig {
            fps: 50,
            ..FrameConfig::default()
        };
        assert_eq!(frame.frame_period(), Duration::from_millis(20));
    }
}
