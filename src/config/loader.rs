//! Configuration Loader
//!
//! Layers an optional TOML file under `PUBLIC_ITEMS__*` environment
//! variables, then validates the result.

use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::PublicItemsConfig;

const ENV_PREFIX: &str = "PUBLIC_ITEMS";
const CONFIG_PATH_VAR: &str = "PUBLIC_ITEMS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/public-items.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `PUBLIC_ITEMS_CONFIG` (or the default path) plus environment
    pub fn load() -> ConfigResult<PublicItemsConfig> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_file(&path)
    }

    /// Load from a specific file; a missing file is not an error
    pub fn load_from_file(path: &Path) -> ConfigResult<PublicItemsConfig> {
        debug!(path = %path.display(), "Loading public items configuration");

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(path.display().to_string(), e))?;

        Self::finish(settings, &path.display().to_string())
    }

    /// Load from an inline TOML document, ignoring the environment
    pub fn load_from_str(toml: &str) -> ConfigResult<PublicItemsConfig> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigurationError::load_error("inline", e))?;

        Self::finish(settings, "inline")
    }

    fn finish(settings: Config, source_name: &str) -> ConfigResult<PublicItemsConfig> {
        let config: PublicItemsConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::load_error(source_name, e))?;

        config.validate()?;

        info!(
            source = source_name,
            public_tag_id = %config.public_tag_id,
            published_tag_configured = config.published_tag_id.is_some(),
            max_connections = config.max_connections,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagId;
    use std::io::Write;

    #[test]
    fn test_load_from_str_applies_defaults() {
        let public = TagId::new();
        let config = ConfigLoader::load_from_str(&format!("public_tag_id = \"{public}\"")).unwrap();

        assert_eq!(config.public_tag_id, public);
        assert_eq!(config.published_tag_id, None);
        assert_eq!(config.files_path_prefix, "files");
        assert_eq!(config.batch_concurrency, 8);
    }

    #[test]
    fn test_load_from_file() {
        let public = TagId::new();
        let published = TagId::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            database_url = "sqlite::memory:"
            public_tag_id = "{public}"
            published_tag_id = "{published}"
            thumbnails_path_prefix = "thumbs"
            max_connections = 2
            busy_timeout_ms = 250
            "#
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.published_tag_id, Some(published));
        assert_eq!(config.thumbnails_path_prefix, "thumbs");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_missing_public_tag_is_an_error() {
        let result = ConfigLoader::load_from_str("max_connections = 4");
        assert!(matches!(result, Err(ConfigurationError::LoadError { .. })));
    }

    #[test]
    fn test_validation_runs_after_load() {
        let public = TagId::new();
        let result = ConfigLoader::load_from_str(&format!(
            "public_tag_id = \"{public}\"\nbatch_concurrency = 0"
        ));
        assert!(matches!(result, Err(ConfigurationError::InvalidValue { .. })));
    }
}
