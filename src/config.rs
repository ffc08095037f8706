//! Bridge, engine and adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::types::Transition;

type Result<T> = std::result::Result<T, Error>;

/// Complete configuration, usually loaded from a JSON file.
///
/// Every field has a default, so `{}` is a valid configuration.
///
/// # Example
///
/// ```
/// use hue_autolight::Config;
///
/// let config = Config::from_json(r#"{"bridge": {"host": "10.0.0.2", "username": "abc"}}"#).unwrap();
/// assert_eq!(config.bridge.base_uri(), "http://10.0.0.2/api/abc");
/// assert_eq!(config.engine.max_steps, 10);
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub bridge: BridgeConfig,
    pub engine: EngineConfig,
    pub adapter: AdapterConfig,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(Error::JsonLoad)
    }
}

/// Where the bridge lives and how to talk to it.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BridgeConfig {
    pub host: String,
    /// The whitelisted API key
    pub username: String,
    pub https: bool,
    pub timeout_secs: u64,
    /// Bridges ship self-signed certificates
    pub accept_invalid_certs: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            host: "192.168.1.2".to_string(),
            username: String::new(),
            https: false,
            timeout_secs: 10,
            accept_invalid_certs: false,
        }
    }
}

impl BridgeConfig {
    /// Base URI every resource path is appended to.
    pub fn base_uri(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{scheme}://{}/api/{}", self.host, self.username)
    }
}

/// Reconciliation loop tuning.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the group whose brightness is managed
    pub brightness_group: String,
    /// Name of the group whose color temperature is managed
    pub temperature_group: String,
    /// Delay before the first step, coalescing bursts of mutations
    pub settle_delay_ms: u64,
    /// Delay between steps
    pub step_interval_ms: u64,
    /// Maximum steps per loop trigger
    pub max_steps: usize,
    /// Fade used for major value changes, in bridge deciseconds
    pub major_transition: u16,
    /// Fade used by the all-off command when none is given, in deciseconds
    pub all_off_transition: u16,
    /// Spawn a background loop on mutation. When off, callers drive the
    /// engine with `drain`.
    pub background: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            brightness_group: "Auto Brightness".to_string(),
            temperature_group: "Auto Temperature".to_string(),
            settle_delay_ms: 2000,
            step_interval_ms: 1000,
            max_steps: 10,
            major_transition: 100,
            all_off_transition: 25,
            background: true,
        }
    }
}

impl EngineConfig {
    /// Defaults without a background loop.
    pub fn manual() -> Self {
        EngineConfig {
            background: false,
            ..Self::default()
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

/// Host-side policy.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AdapterConfig {
    /// Entity ids containing any of these are never tracked
    pub excluded_patterns: Vec<String>,
    /// Fade applied when turning a tracked light on without one
    pub on_transition: Option<f64>,
    /// Fade applied when turning a tracked light off without one
    pub off_transition: Option<f64>,
    /// Desired brightness until the host reports one
    pub default_brightness: u8,
    /// Desired temperature until the host reports one
    pub default_temperature: u16,
    /// Largest difference at which a light still counts as following
    pub close_enough: u16,
    pub cancel_timers_on_night_mode: bool,
    /// Push the full desired state whenever the engine becomes ready
    pub repush_on_ready: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            excluded_patterns: vec![
                "light.veranda".to_string(),
                "light.tv_".to_string(),
                "light.bed_".to_string(),
            ],
            on_transition: None,
            off_transition: Some(1.5),
            default_brightness: 255,
            default_temperature: 200,
            close_enough: 10,
            cancel_timers_on_night_mode: true,
            repush_on_ready: true,
        }
    }
}

impl AdapterConfig {
    pub fn on_transition(&self) -> Option<Transition> {
        self.on_transition.map(Transition::seconds)
    }

    pub fn off_transition(&self) -> Option<Transition> {
        self.off_transition.map(Transition::seconds)
    }

    /// Returns `true` if the entity may be tracked automatically.
    pub fn is_automatic_entity(&self, entity_id: &str) -> bool {
        !self
            .excluded_patterns
            .iter()
            .any(|pattern| entity_id.contains(pattern.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.engine.brightness_group, "Auto Brightness");
        assert_eq!(config.engine.temperature_group, "Auto Temperature");
        assert_eq!(config.engine.settle_delay(), Duration::from_secs(2));
        assert_eq!(config.engine.step_interval(), Duration::from_secs(1));
        assert!(config.engine.background);
        assert_eq!(config.adapter.off_transition().unwrap().deciseconds(), 15);
        assert!(config.adapter.on_transition().is_none());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_json(
            r#"{"bridge": {"host": "hue.local", "https": true}, "engine": {"max_steps": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.bridge.base_uri(), "https://hue.local/api/");
        assert_eq!(config.bridge.timeout_secs, 10);
        assert_eq!(config.engine.max_steps, 3);
        assert_eq!(config.engine.major_transition, 100);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(Error::JsonLoad(_))
        ));
    }

    #[test]
    fn test_excluded_patterns() {
        let adapter = AdapterConfig::default();
        assert!(!adapter.is_automatic_entity("light.veranda_left"));
        assert!(!adapter.is_automatic_entity("light.tv_backlight"));
        assert!(!adapter.is_automatic_entity("light.bed_side"));
        assert!(adapter.is_automatic_entity("light.kitchen"));
    }
}
