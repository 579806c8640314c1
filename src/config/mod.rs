//! Configuration module for sqlbridge.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, ParserSettings, RenderSettings, Settings, SettingsError,
    ValidationSettings,
};
