//! Application-level configuration loading, including the offline escalation template.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SIGNAGE_BACK_CONFIG_PATH";

/// Offline threshold applied when an organization has no stored setting, or a
/// stored setting is non-positive.
pub const DEFAULT_OFFLINE_THRESHOLD_MINUTES: u32 = 5;
/// How long a freshly issued pairing code remains redeemable.
const DEFAULT_PAIRING_CODE_TTL_MINUTES: u64 = 60;
/// How often the sweeper re-evaluates every player against its threshold.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pairing_code_ttl: Duration,
    sweep_interval: Duration,
    qr_base_url: String,
    escalation: Vec<EscalationStage>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        stages = config.escalation.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Validity window of a freshly generated pairing code.
    pub fn pairing_code_ttl(&self) -> Duration {
        self.pairing_code_ttl
    }

    /// Interval between two offline sweeper passes over the fleet.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Base URL encoded into the QR payload shown next to a pairing code.
    pub fn qr_base_url(&self) -> &str {
        &self.qr_base_url
    }

    /// Pick the escalation stage matching how long a player has been offline,
    /// returning its zero-based index alongside the template entry.
    ///
    /// Stages are ordered by their upper bound; a template whose last stage is
    /// bounded still matches by falling through to that last entry, so callers
    /// always receive a value.
    pub fn escalation_stage(&self, offline_for: Duration) -> (usize, &EscalationStage) {
        let minutes = offline_for.as_secs() / 60;
        self.escalation
            .iter()
            .enumerate()
            .find(|(_, stage)| stage.up_to_minutes.is_none_or(|bound| minutes < bound))
            .unwrap_or_else(|| {
                (
                    self.escalation.len() - 1,
                    self.escalation.last().expect("escalation template is never empty"),
                )
            })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pairing_code_ttl: Duration::from_secs(DEFAULT_PAIRING_CODE_TTL_MINUTES * 60),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            qr_base_url: "https://api.ods-cloud.com/players/pair".into(),
            escalation: default_escalation_template(),
        }
    }
}

/// One tier of the offline escalation template: how a player that has been
/// silent for a while should be highlighted in the dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EscalationStage {
    /// Upper bound of the band in minutes offline; `None` marks the open-ended final stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_to_minutes: Option<u64>,
    /// Border/alert color applied by the dashboard.
    pub color: String,
    /// Animation hint (`none`, `pulse`, `blink`).
    pub animation: String,
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    pairing_code_ttl_minutes: Option<u64>,
    #[serde(default)]
    sweep_interval_secs: Option<u64>,
    #[serde(default)]
    qr_base_url: Option<String>,
    #[serde(default)]
    escalation: Vec<EscalationStage>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            pairing_code_ttl: raw
                .pairing_code_ttl_minutes
                .filter(|minutes| *minutes > 0)
                .map(|minutes| Duration::from_secs(minutes * 60))
                .unwrap_or(defaults.pairing_code_ttl),
            sweep_interval: raw
                .sweep_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            qr_base_url: raw.qr_base_url.unwrap_or(defaults.qr_base_url),
            escalation: if raw.escalation.is_empty() {
                defaults.escalation
            } else {
                raw.escalation
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in escalation template shipped with the binary.
///
/// Four time bands keyed to how long a player has been offline, each with an
/// increasingly severe visual treatment.
fn default_escalation_template() -> Vec<EscalationStage> {
    vec![
        EscalationStage {
            up_to_minutes: Some(30),
            color: "#facc15".into(),
            animation: "none".into(),
        },
        EscalationStage {
            up_to_minutes: Some(60),
            color: "#fb923c".into(),
            animation: "none".into(),
        },
        EscalationStage {
            up_to_minutes: Some(120),
            color: "#f87171".into(),
            animation: "pulse".into(),
        },
        EscalationStage {
            up_to_minutes: None,
            color: "#dc2626".into(),
            animation: "blink".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_selection_follows_time_bands() {
        let config = AppConfig::default();

        let minute = Duration::from_secs(60);
        assert_eq!(config.escalation_stage(Duration::ZERO).0, 0);
        assert_eq!(config.escalation_stage(29 * minute).0, 0);
        assert_eq!(config.escalation_stage(30 * minute).0, 1);
        assert_eq!(config.escalation_stage(59 * minute).0, 1);
        assert_eq!(config.escalation_stage(60 * minute).0, 2);
        assert_eq!(config.escalation_stage(119 * minute).0, 2);
        assert_eq!(config.escalation_stage(120 * minute).0, 3);
        assert_eq!(config.escalation_stage(100_000 * minute).0, 3);
    }

    #[test]
    fn raw_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig = serde_json::from_str("{}").expect("empty object parses");
        let config: AppConfig = raw.into();
        assert_eq!(config.pairing_code_ttl(), Duration::from_secs(60 * 60));
        assert_eq!(config.sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.escalation.len(), 4);
    }

    #[test]
    fn zero_ttl_in_config_falls_back_to_default() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"pairing_code_ttl_minutes": 0}"#).expect("parses");
        let config: AppConfig = raw.into();
        assert_eq!(config.pairing_code_ttl(), Duration::from_secs(60 * 60));
    }
}
