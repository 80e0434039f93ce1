//! Server configuration: a JSON file plus environment overrides.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tangga::prelude::GameRules;
use tracing::{info, warn};

/// Default location on disk where the server looks for its JSON config.
const DEFAULT_CONFIG_PATH: &str = "config/tangga.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TANGGA_CONFIG_PATH";
/// Full bind address override, e.g. `127.0.0.1:4000`.
const BIND_ENV: &str = "TANGGA_BIND";
/// Port-only override; binds every interface.
const PORT_ENV: &str = "PORT";

/// Runtime configuration for the server binary.
///
/// Every field has a default, so a partial file (or none at all) works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub idle_timeout_secs: u64,
    /// When set, finished games are appended here as JSON lines.
    pub report_path: Option<PathBuf>,
    pub rules: GameRules,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            idle_timeout_secs: 60,
            report_path: None,
            rules: GameRules::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the config file, falling back to defaults, then applies
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_from(&resolve_config_path());
        if let Some(bind) = bind_override(env::var(BIND_ENV).ok(), env::var(PORT_ENV).ok()) {
            info!(%bind, "bind address overridden from environment");
            config.bind = bind;
        }
        config
    }

    /// Reads `path`. A missing or malformed file yields the defaults, and
    /// unplayable rules are replaced by the default rules.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Self::read(path);
        if let Err(err) = config.rules.validate() {
            warn!(
                path = %path.display(),
                error = %err,
                "invalid game rules; falling back to default rules"
            );
            config.rules = GameRules::default();
        }
        config
    }

    fn read(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded server config");
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

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.max(1))
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// `TANGGA_BIND` wins; otherwise a numeric `PORT` binds all interfaces.
fn bind_override(bind: Option<String>, port: Option<String>) -> Option<String> {
    bind.filter(|b| !b.trim().is_empty()).or_else(|| {
        port.and_then(|p| p.trim().parse::<u16>().ok())
            .map(|p| format!("0.0.0.0:{p}"))
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("tangga-{}-{name}.json", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = ServerConfig::load_from(Path::new("/definitely/not/here.json"));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_from_partial_file_fills_defaults() {
        let path = temp_config(
            "partial",
            r#"{"idle_timeout_secs": 15, "rules": {"dice": {"min": 1, "max": 6}}}"#,
        );
        let config = ServerConfig::load_from(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.idle_timeout_secs, 15);
        assert_eq!(config.rules.dice.min, 1);
        assert_eq!(config.rules.board_size, 100);
        assert_eq!(config.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_load_from_malformed_file_uses_defaults() {
        let path = temp_config("malformed", "{ not json");
        let config = ServerConfig::load_from(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_load_from_inverted_dice_falls_back_to_default_rules() {
        let path = temp_config(
            "inverted-dice",
            r#"{"idle_timeout_secs": 20, "rules": {"dice": {"min": 6, "max": 4}}}"#,
        );
        let config = ServerConfig::load_from(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.idle_timeout_secs, 20);
        assert_eq!(config.rules, GameRules::default());

        let mut rng = StdRng::seed_from_u64(11);
        let dice = config.rules.dice_for(1);
        for _ in 0..50 {
            assert!((4..=6).contains(&dice.roll(&mut rng)));
        }
    }

    #[test]
    fn test_load_from_inverted_level_dice_falls_back() {
        let path = temp_config(
            "inverted-level",
            r#"{"rules": {"board_size": 64, "level_dice": {"2": {"min": 3, "max": 1}}}}"#,
        );
        let config = ServerConfig::load_from(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.rules, GameRules::default());
    }

    #[test]
    fn test_bind_override_prefers_full_address() {
        assert_eq!(
            bind_override(Some("127.0.0.1:4000".into()), Some("5000".into())),
            Some("127.0.0.1:4000".to_string())
        );
    }

    #[test]
    fn test_bind_override_port_only() {
        assert_eq!(
            bind_override(None, Some("5000".into())),
            Some("0.0.0.0:5000".to_string())
        );
        assert_eq!(bind_override(Some("  ".into()), Some("nope".into())), None);
        assert_eq!(bind_override(None, None), None);
    }
}
