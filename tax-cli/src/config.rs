//! CLI configuration file.
//!
//! ```toml
//! tax_year = 2024
//! log_level = "info"
//! log_file = "tax-filer.log"
//!
//! [api]
//! backend = "http"
//! endpoint = "https://tax.example.com/api"
//! timeout_secs = 30
//!
//! [credentials]
//! username = "pat"
//! ```
//!
//! Every key is optional. Command line flags override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tax_core::ApiConfig;

pub const DEFAULT_CONFIG_FILE: &str = "tax-filer.toml";
pub const DEFAULT_TAX_YEAR: i32 = 2024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    /// Prefer the `TAX_FILER_PASSWORD` environment variable over storing it here.
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub api: ApiConfig,
    pub tax_year: i32,
    /// Filter directive. Unset leaves the level to RUST_LOG.
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub credentials: CredentialsConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            tax_year: DEFAULT_TAX_YEAR,
            log_level: None,
            log_file: None,
            credentials: CredentialsConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    /// Load `path`. A missing file yields the defaults only when `required`
    /// is false (the implicit `tax-filer.toml` case).
    pub fn load(
        path: &Path,
        required: bool,
    ) -> Result<Self> {
        if !path.exists() && !required {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = CliConfig::from_toml_str("").unwrap();

        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn partial_api_table_keeps_other_defaults() {
        let config = CliConfig::from_toml_str(
            r#"
            tax_year = 2023

            [api]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.tax_year, 2023);
        assert_eq!(config.api.backend, "memory");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn log_level_is_unset_unless_the_file_names_one() {
        assert_eq!(CliConfig::default().log_level, None);

        let config = CliConfig::from_toml_str("log_level = \"debug\"").unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_value_type_is_an_error() {
        assert!(CliConfig::from_toml_str("tax_year = \"next\"").is_err());
    }

    #[test]
    fn missing_optional_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = CliConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE), false).unwrap();

        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(CliConfig::load(&dir.path().join("custom.toml"), true).is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "log_file = \"filer.log\"\n[api]\nendpoint = \"https://tax.example.com\"\n[credentials]\nusername = \"pat\""
        )
        .unwrap();

        let config = CliConfig::load(file.path(), true).unwrap();

        assert_eq!(config.api.endpoint, "https://tax.example.com");
        assert_eq!(config.log_file, Some(PathBuf::from("filer.log")));
        assert_eq!(config.credentials.username.as_deref(), Some("pat"));
    }
}
