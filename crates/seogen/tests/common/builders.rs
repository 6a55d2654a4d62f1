//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use seogen::config::{
    default_catalogs, CatalogConfig, Config, DatabaseConfig, GenerationConfig, LoggingConfig,
    TemplateConfig,
};

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    version: String,
    target: i64,
    batch_size: i64,
    worker_count: usize,
    catalogs: Vec<CatalogConfig>,
    templates: TemplateConfig,
}

impl ConfigBuilder {
    /// Defaults: built-in catalogs and templates, one worker.
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            target: 100,
            batch_size: 25,
            worker_count: 1,
            catalogs: default_catalogs(),
            templates: TemplateConfig::default(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn target(mut self, target: i64) -> Self {
        self.target = target;
        self
    }

    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Replace the catalog list.
    pub fn catalogs(mut self, catalogs: Vec<CatalogConfig>) -> Self {
        self.catalogs = catalogs;
        self
    }

    /// Add a catalog after the existing ones.
    pub fn catalog(mut self, name: &str, values: &[&str]) -> Self {
        self.catalogs.push(CatalogConfig::new(name, values));
        self
    }

    pub fn templates(mut self, templates: TemplateConfig) -> Self {
        self.templates = templates;
        self
    }

    pub fn title_template(mut self, template: &str) -> Self {
        self.templates.title = template.to_string();
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.templates.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn build(self) -> Config {
        Config {
            version: self.version,
            generation: GenerationConfig {
                target: self.target,
                batch_size: self.batch_size,
                worker_count: self.worker_count,
            },
            catalogs: self.catalogs,
            templates: self.templates,
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
