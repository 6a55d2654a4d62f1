use crate::config::TemplateConfig;
use crate::dimension::{DimensionSpace, DimensionTuple};
use crate::error::ConfigError;

use super::record::{ContentRecord, ContentStatus, QualityMetrics, SeoFields};
use super::slug::record_slug;
use super::template::{Template, TemplateSet, TemplateVars};

const META_TITLE_MAX_CHARS: usize = 60;
const META_DESCRIPTION_MAX_CHARS: usize = 160;

/// `base + mix(index ^ salt) % span`. `base + span - 1` must stay within 100.
struct ScoreRange {
    salt: u64,
    base: u8,
    span: u8,
}

const READABILITY: ScoreRange = ScoreRange {
    salt: 0x5EED_0001,
    base: 62,
    span: 35,
};
const SEO_SCORE: ScoreRange = ScoreRange {
    salt: 0x5EED_0002,
    base: 70,
    span: 30,
};
const UNIQUENESS: ScoreRange = ScoreRange {
    salt: 0x5EED_0003,
    base: 55,
    span: 45,
};
const ENGAGEMENT: ScoreRange = ScoreRange {
    salt: 0x5EED_0004,
    base: 48,
    span: 50,
};

/// Turns a dimension tuple and its index into a complete record.
///
/// Synthesis is pure: the output depends only on the templates, the tuple and
/// the index, which is what lets an interrupted run be replayed safely.
#[derive(Debug, Clone)]
pub struct ContentSynthesizer {
    templates: TemplateSet,
}

impl ContentSynthesizer {
    pub fn new(config: &TemplateConfig, space: &DimensionSpace) -> Result<Self, ConfigError> {
        Ok(Self {
            templates: TemplateSet::compile(config, space)?,
        })
    }

    pub fn synthesize(&self, tuple: &DimensionTuple, index: u64) -> ContentRecord {
        let vars = TemplateVars::new(tuple, index);
        let slug = record_slug(tuple, index);

        let title = self.templates.title.render(&vars);
        let description = self.templates.description.render(&vars);
        let features = render_all(&self.templates.features, &vars);
        let examples = render_all(&self.templates.examples, &vars);
        let keywords = dedup_keywords(render_all(&self.templates.keywords, &vars));

        let seo = SeoFields {
            meta_title: truncate_chars(&title, META_TITLE_MAX_CHARS),
            meta_description: truncate_chars(&description, META_DESCRIPTION_MAX_CHARS),
            canonical_path: format!("/{}", slug),
            keywords,
        };

        ContentRecord {
            slug,
            index,
            dimensions: tuple.clone(),
            title,
            description,
            features,
            examples,
            seo,
            status: ContentStatus::Generated,
            quality: quality_for(index),
        }
    }
}

fn render_all(templates: &[Template], vars: &TemplateVars) -> Vec<String> {
    templates.iter().map(|t| t.render(vars)).collect()
}

fn dedup_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let keyword = keyword.trim().to_string();
        if !keyword.is_empty() && !out.contains(&keyword) {
            out.push(keyword);
        }
    }
    out
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

fn quality_for(index: u64) -> QualityMetrics {
    QualityMetrics {
        readability: score(index, &READABILITY),
        seo_score: score(index, &SEO_SCORE),
        uniqueness: score(index, &UNIQUENESS),
        engagement: score(index, &ENGAGEMENT),
    }
}

fn score(index: u64, range: &ScoreRange) -> u8 {
    range.base + (mix(index ^ range.salt) % range.span as u64) as u8
}

// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_catalogs, CatalogConfig};
    use std::collections::HashSet;

    fn setup() -> (DimensionSpace, ContentSynthesizer) {
        let space = DimensionSpace::from_config(&default_catalogs()).unwrap();
        let synthesizer = ContentSynthesizer::new(&TemplateConfig::default(), &space).unwrap();
        (space, synthesizer)
    }

    #[test]
    fn test_synthesize_is_byte_identical() {
        let (space, synthesizer) = setup();
        for index in [0u64, 1, 239, 240, 99_999] {
            let tuple = space.decompose(index);
            let a = serde_json::to_vec(&synthesizer.synthesize(&tuple, index)).unwrap();
            let b = serde_json::to_vec(&synthesizer.synthesize(&tuple, index)).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_record_fields_follow_tuple() {
        let (space, synthesizer) = setup();
        let record = synthesizer.synthesize(&space.decompose(0), 0);

        assert_eq!(record.slug, "ai-chatbot-english-web-developers-0");
        assert_eq!(record.index, 0);
        assert_eq!(record.status, ContentStatus::Generated);
        assert!(record.title.contains("AI Chatbot"));
        assert!(record.title.contains("Developers"));
        assert_eq!(record.features.len(), 4);
        assert_eq!(record.examples.len(), 3);
        assert_eq!(record.seo.canonical_path, "/ai-chatbot-english-web-developers-0");
        assert_eq!(record.seo.keywords[0], "ai-chatbot");
    }

    #[test]
    fn test_slugs_unique_across_periods() {
        let (space, synthesizer) = setup();
        let mut slugs = HashSet::new();
        for index in 0..(space.size() * 3) {
            let record = synthesizer.synthesize(&space.decompose(index), index);
            assert!(slugs.insert(record.slug), "duplicate slug at {}", index);
        }
    }

    #[test]
    fn test_wrapped_index_shares_tuple_not_slug() {
        let (space, synthesizer) = setup();
        let first = synthesizer.synthesize(&space.decompose(0), 0);
        let wrapped = synthesizer.synthesize(&space.decompose(240), 240);
        assert_eq!(first.dimensions, wrapped.dimensions);
        assert_eq!(first.title, wrapped.title);
        assert_ne!(first.slug, wrapped.slug);
    }

    #[test]
    fn test_quality_within_range() {
        for index in 0..10_000u64 {
            let quality = quality_for(index);
            assert!(quality.is_within_range());
            assert!((62..=96).contains(&quality.readability));
            assert!((70..=99).contains(&quality.seo_score));
            assert!((55..=99).contains(&quality.uniqueness));
            assert!((48..=97).contains(&quality.engagement));
        }
    }

    #[test]
    fn test_meta_fields_truncated() {
        let (space, synthesizer) = setup();
        let record = synthesizer.synthesize(&space.decompose(3), 3);
        assert!(record.seo.meta_title.chars().count() <= META_TITLE_MAX_CHARS);
        assert!(record.seo.meta_description.chars().count() <= META_DESCRIPTION_MAX_CHARS);
        assert!(record.title.starts_with(&record.seo.meta_title));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("日本語のガイド", 3), "日本語");
        assert_eq!(truncate_chars("short", 60), "short");
        assert_eq!(truncate_chars("ab cd", 3), "ab");
    }

    #[test]
    fn test_keywords_deduplicated() {
        let space = DimensionSpace::from_config(&[CatalogConfig::new("theme", &["Chat"])]).unwrap();
        let config = TemplateConfig {
            title: "$theme".to_string(),
            description: "$theme".to_string(),
            features: vec![],
            examples: vec![],
            keywords: vec![
                "$theme_slug".to_string(),
                " $theme_slug ".to_string(),
                "".to_string(),
                "$theme_slug-$index".to_string(),
            ],
        };
        let synthesizer = ContentSynthesizer::new(&config, &space).unwrap();
        let record = synthesizer.synthesize(&space.decompose(4), 4);
        assert_eq!(record.seo.keywords, vec!["chat", "chat-4"]);
    }
}
