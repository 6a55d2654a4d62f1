use std::collections::HashSet;

use crate::config::CatalogConfig;
use crate::error::ConfigError;

/// One ordered axis of variation, e.g. `language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    name: String,
    values: Vec<String>,
}

impl Catalog {
    /// Builds a catalog, rejecting empty catalogs, blank or duplicate values,
    /// and names that are not usable as template variables.
    pub fn new(name: &str, values: Vec<String>) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidCatalog {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if !is_identifier(name) {
            return Err(invalid(
                "Name must start with a lowercase letter and contain only [a-z0-9_]",
            ));
        }
        if values.is_empty() {
            return Err(invalid("Catalog has no values"));
        }

        let mut seen = HashSet::new();
        for value in &values {
            if value.trim().is_empty() {
                return Err(invalid("Catalog contains a blank value"));
            }
            if !seen.insert(value.as_str()) {
                return Err(ConfigError::InvalidCatalog {
                    name: name.to_string(),
                    reason: format!("Duplicate value '{}'", value),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            values,
        })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, ConfigError> {
        Self::new(&config.name, config.values.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }

    pub fn position_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
