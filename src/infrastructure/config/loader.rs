use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {0}: must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "Invalid poll interval: {poll_interval_ms}ms is longer than the {resolve_secs}s resolve timeout"
    )]
    PollIntervalTooLong { poll_interval_ms: u64, resolve_secs: u64 },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Output path cannot be empty")]
    EmptyOutputPath,

    #[error("WebDriver url cannot be empty")]
    EmptyWebDriverUrl,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .spinlog/config.yaml (project config)
    /// 3. .spinlog/local.yaml (local overrides, optional)
    /// 4. Environment variables (SPINLOG_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".spinlog/config.yaml"))
            .merge(Yaml::file(".spinlog/local.yaml"))
            .merge(Env::prefixed("SPINLOG_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let timeouts = &config.timeouts;
        for (name, value) in [
            ("load_secs", timeouts.load_secs),
            ("sound_prompt_secs", timeouts.sound_prompt_secs),
            ("resolve_secs", timeouts.resolve_secs),
            ("poll_interval_ms", timeouts.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }

        if timeouts.poll_interval() > timeouts.resolve() {
            return Err(ConfigError::PollIntervalTooLong {
                poll_interval_ms: timeouts.poll_interval_ms,
                resolve_secs: timeouts.resolve_secs,
            });
        }

        if config.output.path.trim().is_empty() {
            return Err(ConfigError::EmptyOutputPath);
        }

        if config.webdriver.url.trim().is_empty() {
            return Err(ConfigError::EmptyWebDriverUrl);
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        for (name, address) in &config.catalog.aristocrat {
            if address.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "catalog entry '{name}' has an empty address"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::TimeoutConfig;
    use crate::domain::models::Provider;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, Provider::Igt);
        assert_eq!(config.timeouts.resolve_secs, 1000);
        assert_eq!(config.output.path, "slot_results.csv");
        assert_eq!(config.logging.level, "info");
        assert!(!config.free_rounds_enabled());
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
game: siberian_storm
provider: aristocrat
headless: false
restore_balance: false
timeouts:
  load_secs: 30
  poll_interval_ms: 250
output:
  path: runs/storm.csv
  header: false
logging:
  level: debug
catalog:
  aristocrat:
    buffalo: https://casino.example/buffalo
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.game.as_deref(), Some("siberian_storm"));
        assert_eq!(config.provider, Provider::Aristocrat);
        assert!(!config.headless);
        assert!(!config.restore_balance);
        assert!(config.free_rounds_enabled());
        assert_eq!(config.timeouts.load_secs, 30);
        assert_eq!(config.timeouts.resolve_secs, 1000, "unset fields keep defaults");
        assert!(!config.output.header);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.catalog.aristocrat.len(), 1);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = Config {
            timeouts: TimeoutConfig {
                resolve_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroTimeout("resolve_secs"))
        ));
    }

    #[test]
    fn test_validate_poll_longer_than_resolve() {
        let config = Config {
            timeouts: TimeoutConfig {
                resolve_secs: 1,
                poll_interval_ms: 1500,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::PollIntervalTooLong { .. })
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_empty_paths() {
        let mut config = Config::default();
        config.output.path = "  ".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyOutputPath)
        ));

        let mut config = Config::default();
        config.webdriver.url = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyWebDriverUrl)
        ));
    }

    #[test]
    fn test_validate_empty_catalog_address() {
        let mut config = Config::default();
        config
            .catalog
            .aristocrat
            .insert("buffalo".to_string(), String::new());
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("SPINLOG_PROVIDER", Some("aristocrat")),
                ("SPINLOG_TIMEOUTS__RESOLVE_SECS", Some("600")),
                ("SPINLOG_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load().expect("env overrides should load");
                assert_eq!(config.provider, Provider::Aristocrat);
                assert_eq!(config.timeouts.resolve_secs, 600);
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        temp_env::with_var("SPINLOG_TIMEOUTS__POLL_INTERVAL_MS", Some("0"), || {
            assert!(ConfigLoader::load().is_err());
        });
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "sound: true\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "sound: false\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert!(!config.sound, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "game: red_hot\nfree_rounds: true").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.game.as_deref(), Some("red_hot"));
        assert!(config.free_rounds_enabled());
    }
}
