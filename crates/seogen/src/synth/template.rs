use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::config::TemplateConfig;
use crate::dimension::{DimensionSpace, DimensionTuple};
use crate::error::ConfigError;

use super::slug::slugify;

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$([a-z][a-z0-9_]*)").expect("valid variable pattern"))
}

/// A copy template whose variables were checked against the dimension space.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    fn compile(field: &str, source: &str, known: &HashSet<String>) -> Result<Self, ConfigError> {
        for caps in variable_pattern().captures_iter(source) {
            let name = &caps[1];
            if !known.contains(name) {
                return Err(ConfigError::InvalidTemplate {
                    field: field.to_string(),
                    reason: format!("Unknown variable '${}'", name),
                });
            }
        }

        Ok(Self {
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, vars: &TemplateVars) -> String {
        let rendered: Cow<'_, str> =
            variable_pattern().replace_all(&self.source, |caps: &Captures<'_>| {
                vars.get(&caps[1]).unwrap_or(&caps[0]).to_string()
            });
        rendered.into_owned()
    }
}

/// Variables available to one record: `$<catalog>`, `$<catalog>_slug`, `$index`.
#[derive(Debug, Clone)]
pub struct TemplateVars {
    values: HashMap<String, String>,
}

impl TemplateVars {
    pub fn new(tuple: &DimensionTuple, index: u64) -> Self {
        let mut values = HashMap::with_capacity(tuple.len() * 2 + 1);
        for entry in tuple.entries() {
            values.insert(entry.catalog.clone(), entry.value.clone());
            values.insert(format!("{}_slug", entry.catalog), slugify(&entry.value));
        }
        values.insert("index".to_string(), index.to_string());
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// All templates a record is built from.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub title: Template,
    pub description: Template,
    pub features: Vec<Template>,
    pub examples: Vec<Template>,
    pub keywords: Vec<Template>,
}

impl TemplateSet {
    pub fn compile(config: &TemplateConfig, space: &DimensionSpace) -> Result<Self, ConfigError> {
        let known = known_variables(space);

        if config.title.trim().is_empty() {
            return Err(ConfigError::InvalidTemplate {
                field: "title".to_string(),
                reason: "Title template is empty".to_string(),
            });
        }

        let compile_list = |field: &str, sources: &[String]| {
            sources
                .iter()
                .enumerate()
                .map(|(i, source)| Template::compile(&format!("{}[{}]", field, i), source, &known))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            title: Template::compile("title", &config.title, &known)?,
            description: Template::compile("description", &config.description, &known)?,
            features: compile_list("features", &config.features)?,
            examples: compile_list("examples", &config.examples)?,
            keywords: compile_list("keywords", &config.keywords)?,
        })
    }
}

fn known_variables(space: &DimensionSpace) -> HashSet<String> {
    let mut known = HashSet::new();
    for catalog in space.catalogs() {
        known.insert(catalog.name().to_string());
        known.insert(format!("{}_slug", catalog.name()));
    }
    known.insert("index".to_string());
    known
}
