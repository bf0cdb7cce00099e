use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::catalog::Provider;

/// Main configuration structure for spinlog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Game to play when none is given on the command line
    #[serde(default)]
    pub game: Option<String>,

    /// Provider of the game
    #[serde(default = "default_provider")]
    pub provider: Provider,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Keep game audio on
    #[serde(default)]
    pub sound: bool,

    /// Reload the game to restore a free balance once funds run out
    #[serde(default = "default_true")]
    pub restore_balance: bool,

    /// Repeat the trigger while the engine reports free rounds (provider default when unset)
    #[serde(default)]
    pub free_rounds: Option<bool>,

    /// Wait bounds
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Automation endpoint
    #[serde(default)]
    pub webdriver: WebDriverConfig,

    /// Ledger output
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Additional game addresses
    #[serde(default)]
    pub catalog: CatalogConfig,
}

const fn default_provider() -> Provider {
    Provider::Igt
}

const fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: None,
            provider: default_provider(),
            headless: true,
            sound: false,
            restore_balance: true,
            free_rounds: None,
            timeouts: TimeoutConfig::default(),
            webdriver: WebDriverConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Config {
    /// Whether the free-round loop is enabled for the configured provider.
    pub fn free_rounds_enabled(&self) -> bool {
        self.free_rounds
            .unwrap_or_else(|| self.provider.free_rounds_by_default())
    }
}

/// Wait bounds. Load waits are short, resolution waits must cover bonus animations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Readiness bound after navigation, in seconds
    #[serde(default = "default_load_secs")]
    pub load_secs: u64,

    /// Bound for the sound preference prompt, in seconds
    #[serde(default = "default_sound_prompt_secs")]
    pub sound_prompt_secs: u64,

    /// Bound for each round-resolution wait, in seconds
    #[serde(default = "default_resolve_secs")]
    pub resolve_secs: u64,

    /// Delay between predicate evaluations, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

const fn default_load_secs() -> u64 {
    100
}

const fn default_sound_prompt_secs() -> u64 {
    20
}

const fn default_resolve_secs() -> u64 {
    1000
}

const fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            load_secs: default_load_secs(),
            sound_prompt_secs: default_sound_prompt_secs(),
            resolve_secs: default_resolve_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl TimeoutConfig {
    pub const fn load(&self) -> Duration {
        Duration::from_secs(self.load_secs)
    }

    pub const fn sound_prompt(&self) -> Duration {
        Duration::from_secs(self.sound_prompt_secs)
    }

    pub const fn resolve(&self) -> Duration {
        Duration::from_secs(self.resolve_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// WebDriver endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver server (chromedriver)
    #[serde(default = "default_webdriver_url")]
    pub url: String,

    /// User agent for windowed sessions; a mobile agent keeps games out of fullscreen
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Linux; Android 7.0; SAMSUNG SM-G610M Build/NRD90M) \
     AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/7.4 \
     Chrome/59.0.3071.125 Mobile Safari/537.36"
        .to_string()
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Ledger output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    /// CSV file the ledger is flushed to
    #[serde(default = "default_output_path")]
    pub path: String,

    /// Write a header row
    #[serde(default = "default_true")]
    pub header: bool,
}

fn default_output_path() -> String {
    "slot_results.csv".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            header: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Extra catalog entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogConfig {
    /// Aristocrat game name -> outer page address
    #[serde(default)]
    pub aristocrat: BTreeMap<String, String>,
}
