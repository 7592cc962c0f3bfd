use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::{HarnessError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8083";

/// Development fallback used by the server when SERVICE_MASTER_KEY is unset.
pub const DEFAULT_SERVICE_KEY: &str = "default-service-master-key-please-change-in-production";

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    pub service_key: String,
}

/// Optional overrides from a `--config` JSON file.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
    service_key: Option<String>,
}

impl HarnessConfig {
    /// Resolves the effective configuration: defaults, then CLI flags, then
    /// config-file values on top (the file wins when both are given).
    pub fn resolve(
        url: Option<String>,
        service_key: Option<String>,
        config_path: Option<&Path>,
    ) -> Result<Self> {
        let mut base_url = url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut service_key = service_key.unwrap_or_else(|| DEFAULT_SERVICE_KEY.to_string());

        if let Some(path) = config_path {
            let file = load_file(path)?;
            if let Some(value) = file.base_url {
                base_url = value;
            }
            if let Some(value) = file.service_key {
                service_key = value;
            }
        }

        Ok(HarnessConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    /// True while the key is still the development placeholder, in which
    /// case the run must be confirmed interactively.
    pub fn uses_placeholder_key(&self) -> bool {
        self.service_key == DEFAULT_SERVICE_KEY
    }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let content = read_to_string(path).map_err(|err| HarnessError::ConfigLoad {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|err| HarnessError::ConfigLoad {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_when_nothing_given() {
        let config = HarnessConfig::resolve(None, None, None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.service_key, DEFAULT_SERVICE_KEY);
        assert!(config.uses_placeholder_key());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let config = HarnessConfig::resolve(
            Some("http://10.0.0.2:9000/".to_string()),
            Some("secret".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.service_key, "secret");
        assert!(!config.uses_placeholder_key());
    }

    #[test]
    fn file_values_take_precedence_over_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"base_url": "http://filehost:8083", "service_key": "from-file"}}"#
        )
        .unwrap();

        let config = HarnessConfig::resolve(
            Some("http://cli:1".to_string()),
            Some("from-cli".to_string()),
            Some(file.path()),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://filehost:8083");
        assert_eq!(config.service_key, "from-file");
    }

    #[test]
    fn partial_file_keeps_flag_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"service_key": "from-file"}}"#).unwrap();

        let config = HarnessConfig::resolve(
            Some("http://cli:1".to_string()),
            None,
            Some(file.path()),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://cli:1");
        assert_eq!(config.service_key, "from-file");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = HarnessConfig::resolve(None, None, Some(file.path())).unwrap_err();
        assert!(matches!(err, HarnessError::ConfigLoad { .. }));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err =
            HarnessConfig::resolve(None, None, Some(Path::new("/nonexistent/config.json")))
                .unwrap_err();
        assert!(matches!(err, HarnessError::ConfigLoad { .. }));
    }
}
