//! Configuration loading and validation
//!
//! Handles:
//! - Poll period (humantime strings such as `10s`, `1m30s`)
//! - Actuator base URLs (one poller per URL)
//! - Stats selection (`/metrics`, `/health`)
//! - Output selection (MQTT broker or console)

use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::client::StatsKind;

/// Env var pointing at the YAML config file
pub const CONFIG_ENV: &str = "ACTUATORBEAT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "actuatorbeat.yml";
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_URL: &str = "http://127.0.0.1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid period '{value}': {reason}")]
    InvalidPeriod { value: String, reason: String },

    #[error("Invalid actuator URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("Invalid statistics configuration: metrics and health are both disabled")]
    NoStatsEnabled,

    #[error("Invalid output configuration: only one of mqtt or console may be set")]
    ConflictingOutputs,
}

/// File layout, before validation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub actuatorbeat: BeatSection,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct BeatSection {
    pub period: Option<String>,
    pub urls: Option<Vec<String>>,
    pub stats: StatsSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct StatsSection {
    pub metrics: Option<bool>,
    pub health: Option<bool>,
}

/// Output section; at most one sink may be configured, MQTT when none is
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mqtt: Option<MqttConf>,
    pub console: Option<ConsoleConf>,
}

/// Validated sink selection
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Mqtt(MqttConf),
    Console(ConsoleConf),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub topic_prefix: String,
    pub keep_alive_secs: u64,
    /// Upper bound on one publish while the client queue is full
    pub publish_timeout_secs: u64,
}

impl Default for MqttConf {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "actuatorbeat".to_string(),
            topic_prefix: "actuatorbeat".to_string(),
            keep_alive_secs: 30,
            publish_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsoleConf {
    pub pretty: bool,
}

/// Validated actuator base address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    url: Url,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(invalid("not an absolute address"));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Base address without trailing slash; used as the target identity in events
    pub fn identity(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    /// Full URL of one stats endpoint
    pub fn endpoint(&self, suffix: &str) -> String {
        format!("{}{}", self.identity(), suffix)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identity())
    }
}

/// Shared, read-only polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub period: Duration,
    pub poll_metrics: bool,
    pub poll_health: bool,
}

impl PollConfig {
    pub fn new(period: Duration, poll_metrics: bool, poll_health: bool) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::InvalidPeriod {
                value: humantime::format_duration(period).to_string(),
                reason: "period must be positive".to_string(),
            });
        }
        if !poll_metrics && !poll_health {
            return Err(ConfigError::NoStatsEnabled);
        }
        Ok(Self { period, poll_metrics, poll_health })
    }

    /// Stats kinds polled on every tick, metrics first
    pub fn enabled_kinds(self) -> impl Iterator<Item = StatsKind> {
        [(self.poll_metrics, StatsKind::Metrics), (self.poll_health, StatsKind::Health)]
            .into_iter()
            .filter_map(|(enabled, kind)| enabled.then_some(kind))
    }
}

/// Fully validated settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub poll: PollConfig,
    pub targets: Vec<Target>,
    pub output: Output,
}

impl Settings {
    pub fn from_yaml(txt: &str) -> Result<Self, ConfigError> {
        if txt.trim().is_empty() {
            return FileConfig::default().validate();
        }
        let file: FileConfig = serde_yaml::from_str(txt)?;
        file.validate()
    }
}

impl FileConfig {
    pub fn validate(self) -> Result<Settings, ConfigError> {
        let period = parse_period(self.actuatorbeat.period.as_deref())?;

        let urls = self
            .actuatorbeat
            .urls
            .unwrap_or_else(|| vec![DEFAULT_URL.to_string()]);
        let targets = urls
            .iter()
            .map(|u| Target::parse(u))
            .collect::<Result<Vec<_>, _>>()?;

        let poll = PollConfig::new(
            period,
            self.actuatorbeat.stats.metrics.unwrap_or(true),
            self.actuatorbeat.stats.health.unwrap_or(true),
        )?;

        let output = match (self.output.mqtt, self.output.console) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingOutputs),
            (None, Some(console)) => Output::Console(console),
            (mqtt, None) => Output::Mqtt(mqtt.unwrap_or_default()),
        };

        Ok(Settings { poll, targets, output })
    }
}

fn parse_period(raw: Option<&str>) -> Result<Duration, ConfigError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_PERIOD),
        Some(raw) => raw,
    };
    humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidPeriod {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Load settings from `$ACTUATORBEAT_CONFIG` (default `actuatorbeat.yml`)
pub async fn load_settings() -> Result<Settings, ConfigError> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    load_settings_from(&path).await
}

pub async fn load_settings_from(path: &str) -> Result<Settings, ConfigError> {
    if !Path::new(path).exists() {
        warn!("No config file at {}, using defaults", path);
        return FileConfig::default().validate();
    }
    let txt = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
    Settings::from_yaml(&txt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings.poll.period, Duration::from_secs(10));
        assert!(settings.poll.poll_metrics);
        assert!(settings.poll.poll_health);
        assert_eq!(settings.targets.len(), 1);
        assert_eq!(settings.targets[0].identity(), "http://127.0.0.1");
        assert_eq!(settings.output, Output::Mqtt(MqttConf::default()));
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
actuatorbeat:
  period: 1s
  urls: ["http://h1:8080", "https://h2/manage/"]
  stats:
    metrics: true
    health: false
output:
  console:
    pretty: true
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.poll.period, Duration::from_secs(1));
        assert!(!settings.poll.poll_health);
        assert_eq!(settings.targets[0].endpoint("/metrics"), "http://h1:8080/metrics");
        assert_eq!(settings.targets[1].endpoint("/health"), "https://h2/manage/health");
        assert_eq!(settings.output, Output::Console(ConsoleConf { pretty: true }));
    }

    #[test]
    fn test_compound_period() {
        let yaml = "actuatorbeat:\n  period: 1m30s\n";
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.poll.period, Duration::from_secs(90));
    }

    #[test]
    fn test_explicit_empty_url_list() {
        let settings = Settings::from_yaml("actuatorbeat:\n  urls: []\n").unwrap();
        assert!(settings.targets.is_empty());
    }

    #[test]
    fn test_rejects_zero_and_garbage_period() {
        let err = Settings::from_yaml("actuatorbeat:\n  period: 0s\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPeriod { .. }));

        let err = Settings::from_yaml("actuatorbeat:\n  period: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPeriod { .. }));
    }

    #[test]
    fn test_rejects_relative_url() {
        let err = Settings::from_yaml("actuatorbeat:\n  urls: [\"localhost/metrics\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        assert!(Target::parse("ftp://host").is_err());
        assert!(Target::parse("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_rejects_both_stats_disabled() {
        let yaml = "actuatorbeat:\n  stats:\n    metrics: false\n    health: false\n";
        assert!(matches!(Settings::from_yaml(yaml), Err(ConfigError::NoStatsEnabled)));
    }

    #[test]
    fn test_single_stat_disabled_is_valid() {
        let yaml = "actuatorbeat:\n  stats:\n    metrics: false\n";
        let settings = Settings::from_yaml(yaml).unwrap();
        let kinds: Vec<_> = settings.poll.enabled_kinds().collect();
        assert_eq!(kinds, vec![StatsKind::Health]);
    }

    #[test]
    fn test_rejects_two_outputs() {
        let yaml = "output:\n  mqtt:\n    host: broker\n  console:\n    pretty: false\n";
        assert!(matches!(Settings::from_yaml(yaml), Err(ConfigError::ConflictingOutputs)));
    }

    #[test]
    fn test_partial_mqtt_section_keeps_defaults() {
        let yaml = "output:\n  mqtt:\n    host: broker.lan\n";
        match Settings::from_yaml(yaml).unwrap().output {
            Output::Mqtt(conf) => {
                assert_eq!(conf.host, "broker.lan");
                assert_eq!(conf.port, 1883);
                assert_eq!(conf.topic_prefix, "actuatorbeat");
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_target_identity_trims_slash() {
        let target = Target::parse("http://h1/").unwrap();
        assert_eq!(target.identity(), "http://h1");
        assert_eq!(target.to_string(), "http://h1");
        assert_eq!(target.endpoint("/metrics"), "http://h1/metrics");
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        let settings = load_settings_from(path.to_str().unwrap()).await.unwrap();
        assert_eq!(settings.targets.len(), 1);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actuatorbeat.yml");
        std::fs::write(&path, "actuatorbeat:\n  period: 250ms\n  urls: [\"http://h1\"]\n").unwrap();
        let settings = load_settings_from(path.to_str().unwrap()).await.unwrap();
        assert_eq!(settings.poll.period, Duration::from_millis(250));
        assert_eq!(settings.targets[0].identity(), "http://h1");
    }

    #[test]
    fn test_sample_config_is_valid() {
        let settings = Settings::from_yaml(include_str!("../../actuatorbeat.yml")).unwrap();
        assert_eq!(settings.targets[0].identity(), "http://127.0.0.1:8080");
        assert_eq!(settings.output, Output::Mqtt(MqttConf::default()));
    }
}
