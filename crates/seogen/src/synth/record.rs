//! The persisted unit: one generated page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dimension::DimensionTuple;

/// Publication state. The generator only ever writes `Generated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Generated,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Generated => "generated",
            ContentStatus::Published => "published",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generated" => Ok(ContentStatus::Generated),
            "published" => Ok(ContentStatus::Published),
            other => Err(format!("unknown content status '{}'", other)),
        }
    }
}

/// Synthetic quality scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub readability: u8,
    pub seo_score: u8,
    pub uniqueness: u8,
    pub engagement: u8,
}

impl QualityMetrics {
    /// Integer mean of the four scores.
    pub fn overall(&self) -> u8 {
        let sum = self.readability as u16
            + self.seo_score as u16
            + self.uniqueness as u16
            + self.engagement as u16;
        (sum / 4) as u8
    }

    pub fn is_within_range(&self) -> bool {
        [
            self.readability,
            self.seo_score,
            self.uniqueness,
            self.engagement,
        ]
        .iter()
        .all(|score| *score <= 100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoFields {
    pub meta_title: String,
    pub meta_description: String,
    pub canonical_path: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Globally unique key: slugified tuple values plus the raw index.
    pub slug: String,
    /// Generation index this record was synthesized from.
    pub index: u64,
    pub dimensions: DimensionTuple,
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    pub examples: Vec<String>,
    pub seo: SeoFields,
    pub status: ContentStatus,
    pub quality: QualityMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [ContentStatus::Generated, ContentStatus::Published] {
            assert_eq!(status.as_str().parse::<ContentStatus>(), Ok(status));
        }
        assert!("draft".parse::<ContentStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ContentStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
    }

    #[test]
    fn test_overall_quality() {
        let quality = QualityMetrics {
            readability: 80,
            seo_score: 90,
            uniqueness: 70,
            engagement: 61,
        };
        assert_eq!(quality.overall(), 75);
        assert!(quality.is_within_range());

        let broken = QualityMetrics {
            uniqueness: 101,
            ..quality
        };
        assert!(!broken.is_within_range());
    }
}
