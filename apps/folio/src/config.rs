//! # Configuration
//!
//! TOML configuration file for the Folio server.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [database]
//! path = "folio.db"
//!
//! [sources.annotations]
//! weight = "1/5"
//!
//! [sources.user-removes]
//! weight = 0.25
//! ```
//!
//! Every table and field is optional. CLI flags override `server` and
//! `database` values; HTTP hardening stays in environment variables
//! (`FOLIO_CORS_ORIGINS`, `FOLIO_RATE_LIMIT`).

use folio_core::FolioError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// CONFIG STRUCTURE
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Per-source overrides, keyed by source name.
    pub sources: BTreeMap<String, SourceConfig>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Tag store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("folio.db"),
        }
    }
}

/// Override for one named source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub weight: WeightSpec,
}

/// A weight written as a number (`0.2`) or a ratio string (`"1/5"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightSpec {
    Number(f64),
    Ratio(String),
}

impl WeightSpec {
    /// The numeric weight. Fails with `InvalidValue` for a malformed ratio.
    pub fn resolve(&self) -> Result<f64, FolioError> {
        match self {
            Self::Number(value) if value.is_finite() => Ok(*value),
            Self::Number(value) => Err(FolioError::InvalidValue(format!(
                "weight {} is not finite",
                value
            ))),
            Self::Ratio(text) => parse_ratio(text),
        }
    }
}

/// Parse `"n/d"` or a plain decimal into a finite weight.
pub fn parse_ratio(text: &str) -> Result<f64, FolioError> {
    let invalid = || FolioError::InvalidValue(format!("invalid ratio \"{}\"", text));
    let number = |part: &str| part.trim().parse::<f64>().map_err(|_| invalid());

    let value = match text.split_once('/') {
        Some((numerator, denominator)) => {
            let denominator = number(denominator)?;
            if denominator == 0.0 {
                return Err(invalid());
            }
            number(numerator)? / denominator
        }
        None => number(text)?,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid())
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl FolioConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, FolioError> {
        toml::from_str(text).map_err(|e| FolioError::ConfigError(e.to_string()))
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, FolioError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FolioError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, FolioError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Resolved per-source weight overrides.
    pub fn source_weights(&self) -> Result<BTreeMap<String, f64>, FolioError> {
        self.sources
            .iter()
            .map(|(name, source)| Ok((name.clone(), source.weight.resolve()?)))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = FolioConfig::from_toml_str("").expect("parse");
        assert_eq!(config, FolioConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, PathBuf::from("folio.db"));
    }

    #[test]
    fn full_file_parses() {
        let config = FolioConfig::from_toml_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            path = "/var/lib/folio/tags.db"

            [sources.annotations]
            weight = "1/5"

            [sources.third-party]
            weight = 2
            "#,
        )
        .expect("parse");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);

        let weights = config.source_weights().expect("weights");
        assert_eq!(weights["annotations"], 0.2);
        assert_eq!(weights["third-party"], 2.0);
    }

    #[test]
    fn unknown_field_rejected() {
        let err = FolioConfig::from_toml_str("[server]\nhots = \"x\"\n").expect_err("typo");
        assert!(matches!(err, FolioError::ConfigError(_)));
    }

    #[test]
    fn ratios() {
        assert_eq!(parse_ratio("1/5").expect("ratio"), 0.2);
        assert_eq!(parse_ratio(" 3 / 4 ").expect("ratio"), 0.75);
        assert_eq!(parse_ratio("0.5").expect("decimal"), 0.5);
        assert_eq!(parse_ratio("-1/5").expect("negative"), -0.2);
    }

    #[test]
    fn malformed_ratio_names_value() {
        for text in ["one/five", "1/0", "1/", "", "1/5/2"] {
            let result = parse_ratio(text);
            assert!(
                matches!(&result, Err(FolioError::InvalidValue(msg)) if msg.contains(text)),
                "{text:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn malformed_configured_weight_is_invalid_value() {
        let config =
            FolioConfig::from_toml_str("[sources.annotations]\nweight = \"a/b\"\n").expect("parse");
        assert!(matches!(
            config.source_weights(),
            Err(FolioError::InvalidValue(_))
        ));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = FolioConfig::load(Path::new("/nonexistent/folio.toml")).expect_err("missing");
        assert!(matches!(err, FolioError::ConfigError(_)));
    }
}
