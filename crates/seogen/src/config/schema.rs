use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub generation: GenerationConfig,
    #[serde(default = "default_catalogs")]
    pub catalogs: Vec<CatalogConfig>,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Used when the binary runs without a config file.
impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            generation: GenerationConfig::default(),
            catalogs: default_catalogs(),
            templates: TemplateConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Target and batching parameters. Signed so that negative values reach
/// validation instead of failing inside the deserializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub target: i64,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            batch_size: default_batch_size(),
            worker_count: default_worker_count(),
        }
    }
}

fn default_target() -> i64 {
    1000
}

fn default_batch_size() -> i64 {
    1000
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub name: String,
    pub values: Vec<String>,
}

impl CatalogConfig {
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Built-in catalogs, ordered fastest-cycling first. Reordering them changes
/// every generated slug.
pub fn default_catalogs() -> Vec<CatalogConfig> {
    vec![
        CatalogConfig::new(
            "theme",
            &[
                "AI Chatbot",
                "Code Assistant",
                "Content Writer",
                "Image Generator",
                "Data Analyzer",
            ],
        ),
        CatalogConfig::new("language", &["English", "Spanish", "German", "Japanese"]),
        CatalogConfig::new("platform", &["Web", "iOS", "Android", "Desktop"]),
        CatalogConfig::new("audience", &["Developers", "Marketers", "Students"]),
    ]
}

/// Copy templates. `$<catalog>` expands to the catalog value,
/// `$<catalog>_slug` to its slug form, `$index` to the raw index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_features")]
    pub features: Vec<String>,
    #[serde(default = "default_examples")]
    pub examples: Vec<String>,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

fn default_title() -> String {
    "$theme for $audience: The $language Guide to $theme on $platform".to_string()
}

fn default_description() -> String {
    "Discover how $audience use $theme on $platform. A complete $language guide covering features, real examples and best practices."
        .to_string()
}

fn default_features() -> Vec<String> {
    vec![
        "$theme built for $platform".to_string(),
        "Native $language interface and output".to_string(),
        "Workflows tailored to $audience".to_string(),
        "Set up on $platform in minutes".to_string(),
    ]
}

fn default_examples() -> Vec<String> {
    vec![
        "How $audience use $theme to ship faster".to_string(),
        "Getting started with $theme on $platform in $language".to_string(),
        "$theme templates every $audience team needs".to_string(),
    ]
}

fn default_keywords() -> Vec<String> {
    vec![
        "$theme_slug".to_string(),
        "$theme_slug-$platform_slug".to_string(),
        "$theme_slug-for-$audience_slug".to_string(),
        "$language_slug-$theme_slug".to_string(),
    ]
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
            features: default_features(),
            examples: default_examples(),
            keywords: default_keywords(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. Falls back to `~/.seogen/data/seogen.db`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: LogLevel::Info,
        }
    }
}
