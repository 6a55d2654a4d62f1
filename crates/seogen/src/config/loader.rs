use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` files are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content, ConfigFormat::from_path(path))
}

pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    validate_config(&config)?;

    Ok(config)
}

/// Startup validation. Nothing here is coerced: every violation is fatal.
/// Catalog contents and templates are validated again when the dimension
/// space and synthesizer are built from this config.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::validation(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    let generation = &config.generation;
    if generation.target <= 0 {
        return Err(ConfigError::validation(format!(
            "generation.target must be > 0, got {}",
            generation.target
        )));
    }
    if generation.batch_size <= 0 {
        return Err(ConfigError::validation(format!(
            "generation.batch_size must be > 0, got {}",
            generation.batch_size
        )));
    }
    if generation.worker_count == 0 {
        return Err(ConfigError::validation("generation.worker_count must be > 0"));
    }

    if config.catalogs.is_empty() {
        return Err(ConfigError::validation("at least one catalog is required"));
    }

    let mut names = HashSet::new();
    for catalog in &config.catalogs {
        if !names.insert(catalog.name.as_str()) {
            return Err(ConfigError::InvalidCatalog {
                name: catalog.name.clone(),
                reason: "Duplicate catalog name".to_string(),
            });
        }
        if catalog.values.is_empty() {
            return Err(ConfigError::InvalidCatalog {
                name: catalog.name.clone(),
                reason: "Catalog has no values".to_string(),
            });
        }
    }

    Ok(())
}
