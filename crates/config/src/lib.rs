// Configuration loading

pub mod settings;

pub use settings::{
    ConfigError, DisplaySettings, PollSettings, Settings, SourceSettings, CONFIG_ENV_VAR,
};
