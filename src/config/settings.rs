//! TOML-based configuration for sqlbridge.
//!
//! Supports a config file (sqlbridge.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [parser]
//! casing = "unchanged"
//! case_sensitive = false
//!
//! [catalog]
//! schema_dir = "${SCHEMA_HOME}/tables"
//! default_namespace = "default"
//! builtin_tables = true
//!
//! [validation]
//! enabled = true
//! unknown_functions = "reject"
//!
//! [render]
//! pretty = false
//! check_functions = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::{Casing, ParserOptions, UnparseOptions};
use crate::validation::UnknownFunctions;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub parser: ParserSettings,
    pub catalog: CatalogSettings,
    pub validation: ValidationSettings,
    pub render: RenderSettings,
}

/// How source text is parsed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Casing applied to unquoted identifiers.
    pub casing: Casing,

    /// Casing applied to quoted identifiers.
    pub quoted_casing: Casing,

    /// Match identifiers against the catalog case-sensitively.
    pub case_sensitive: bool,
}

impl ParserSettings {
    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            casing: self.casing,
            quoted_casing: self.quoted_casing,
            case_sensitive: self.case_sensitive,
        }
    }
}

/// Where table schemas come from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Directory of `*.json` schema documents (supports ${ENV_VAR} expansion).
    pub schema_dir: Option<String>,

    /// Namespace unqualified table names resolve in.
    pub default_namespace: String,

    /// Seed the catalog with the built-in fixture tables.
    pub builtin_tables: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            schema_dir: None,
            default_namespace: "default".to_string(),
            builtin_tables: true,
        }
    }
}

impl CatalogSettings {
    /// Get the schema directory with environment variables expanded.
    pub fn resolved_schema_dir(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.schema_dir
            .as_deref()
            .map(|dir| expand_env_vars(dir).map(PathBuf::from))
            .transpose()
    }
}

/// Validation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Check statements against the catalog before rewriting.
    pub enabled: bool,

    /// Whether functions missing from the function table are errors.
    pub unknown_functions: UnknownFunctions,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            unknown_functions: UnknownFunctions::Reject,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Start each clause on a new line.
    pub pretty: bool,

    /// Reject calls the target dialect has no function for.
    pub check_functions: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            pretty: false,
            check_functions: true,
        }
    }
}

impl RenderSettings {
    pub fn options(&self) -> UnparseOptions {
        UnparseOptions {
            pretty: self.pretty,
            check_functions: self.check_functions,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SQLBRIDGE_CONFIG`
    /// 2. `./sqlbridge.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("SQLBRIDGE_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("sqlbridge.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.catalog.default_namespace.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "catalog.default_namespace must not be empty".to_string(),
            ));
        }
        if !self.catalog.builtin_tables && self.catalog.schema_dir.is_none() {
            return Err(SettingsError::InvalidConfig(
                "catalog needs builtin_tables or a schema_dir".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.next_if_eq(&'{').is_some() {
            // ${VAR}
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
