//! Deterministic content synthesis.

pub mod record;
pub mod slug;
pub mod synthesizer;
pub mod template;

pub use record::{ContentRecord, ContentStatus, QualityMetrics, SeoFields};
pub use slug::{record_slug, slug_index, slugify};
pub use synthesizer::ContentSynthesizer;
pub use template::{Template, TemplateSet, TemplateVars};
