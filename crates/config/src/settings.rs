// Monitor settings
// Loaded from --config, $VOLSYNC_CONFIG, or ~/.config/volsync/volsync.toml

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use volsync_align::AlignConfig;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV_VAR: &str = "VOLSYNC_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    /// Settings file could not be read or written.
    Io(String),
    /// TOML syntax or type error.
    Parse(String),
    /// Values parsed but are out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Data source endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Snapshot endpoint URL (empty = not configured)
    pub url: String,

    /// Per-request timeout; expiry counts as a network failure
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

/// Labels and precision used by the table and chart output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub label_a: String,
    pub label_b: String,
    pub decimals: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            label_a: "GesBox 1".into(),
            label_b: "GesBox 2".into(),
            decimals: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub poll: PollSettings,
    pub align: AlignConfig,
    pub display: DisplaySettings,
}

impl Settings {
    /// Default settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("volsync");
        config_dir.join("volsync.toml")
    }

    /// Pick the settings file: explicit flag, then $VOLSYNC_CONFIG, then the
    /// default path if it exists. `None` means built-in defaults.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = Self::named_path(explicit) {
            return Some(path);
        }
        let default = Self::config_path();
        default.exists().then_some(default)
    }

    /// Where `init` writes: the same precedence as `resolve_path`, except
    /// the default path is used whether or not it exists yet.
    pub fn init_target(explicit: Option<&Path>) -> PathBuf {
        Self::named_path(explicit).unwrap_or_else(Self::config_path)
    }

    /// Explicit flag, then a non-empty $VOLSYNC_CONFIG.
    fn named_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let env_path = std::env::var(CONFIG_ENV_VAR).ok()?;
        let trimmed = env_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Resolve and load settings. Returns the file used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match Self::resolve_path(explicit) {
            Some(path) => {
                let settings = Self::load_from(&path)?;
                log::debug!("loaded settings from {}", path.display());
                Ok((settings, Some(path)))
            }
            None => {
                log::debug!("no settings file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::Invalid("poll.interval_secs must be at least 1".into()));
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Invalid("source.timeout_secs must be at least 1".into()));
        }
        let url = self.source.url.trim();
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "source.url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.display.decimals > 9 {
            return Err(ConfigError::Invalid("display.decimals must be between 0 and 9".into()));
        }
        self.align
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Configured endpoint, if any.
    pub fn source_url(&self) -> Option<&str> {
        let url = self.source.url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// Write the commented default settings file. Refuses to overwrite.
    pub fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::Io(format!("{} already exists", path.display())));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        fs::write(path, DEFAULT_FILE).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

const DEFAULT_FILE: &str = r#"# volsync settings

[source]
# Endpoint returning a JSON array of samples
url = ""
timeout_secs = 15

[poll]
interval_secs = 30

[align]
# nearest_forward | nearest_symmetric | forward_fill
strategy = "nearest_forward"
tolerance_seconds = 10
# Source driving the rows in the nearest strategies: "a" or "b"
reference_source = "a"
alert_threshold_percent = 8.0
# cumulative: values are totals; delta: values are increments
volume_mode = "cumulative"

[align.fields]
source = "gesBoxId"
timestamp = "timestamp"
volume = "volume"
source_a_id = "GesBox1"
source_b_id = "GesBox2"

[display]
label_a = "GesBox 1"
label_b = "GesBox 2"
decimals = 3
"#;
