//! # Validator Configuration
//!
//! Loads [`ValidatorOptions`] from the file given with `--config`. YAML
//! (`.yaml`/`.yml`) and JSON are accepted; unknown keys are rejected.
//!
//! ```yaml
//! unknown_fields: strip
//! unique_ids: true
//! max_depth: 12
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use mkt_schema::ValidatorOptions;

/// Read validator options, or the defaults when no file is given.
pub fn load_options(path: Option<&Path>) -> Result<ValidatorOptions> {
    let Some(path) = path else {
        return Ok(ValidatorOptions::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;

    let options: ValidatorOptions = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML config {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON config {}", path.display()))?,
    };

    tracing::info!(config = %path.display(), ?options, "loaded validator options");
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkt_schema::UnknownFieldPolicy;

    #[test]
    fn defaults_without_file() {
        assert_eq!(load_options(None).unwrap(), ValidatorOptions::default());
    }

    #[test]
    fn loads_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkt.yaml");
        std::fs::write(&path, "unknown_fields: strip\nmax_depth: 4\n").unwrap();
        let options = load_options(Some(&path)).unwrap();
        assert_eq!(options.unknown_fields, UnknownFieldPolicy::Strip);
        assert_eq!(options.max_depth, Some(4));
        assert!(!options.unique_ids);
    }

    #[test]
    fn loads_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkt.json");
        std::fs::write(&path, r#"{"unique_ids": true}"#).unwrap();
        assert!(load_options(Some(&path)).unwrap().unique_ids);
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkt.yaml");
        std::fs::write(&path, "strict: true\n").unwrap();
        let err = load_options(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("invalid YAML config"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_options(Some(Path::new("/nonexistent/mkt.yaml"))).unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }
}
