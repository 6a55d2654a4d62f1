use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::error::ConfigError;

use super::catalog::Catalog;

/// A single coordinate of a tuple: which catalog, where in it, and the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionValue {
    pub catalog: String,
    pub position: usize,
    pub value: String,
}

/// An ordered selection of one value per catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionTuple {
    entries: Vec<DimensionValue>,
}

impl DimensionTuple {
    pub fn entries(&self) -> &[DimensionValue] {
        &self.entries
    }

    /// Value selected for `catalog`, if the tuple has that axis.
    pub fn get(&self, catalog: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.catalog == catalog)
            .map(|e| e.value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.value.as_str())
    }

    pub fn positions(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.position).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The finite product of all catalogs, addressed by a linear index.
///
/// Indices map to tuples by mixed-radix decomposition with the first catalog
/// as the least significant digit. Indices past [`DimensionSpace::size`] wrap
/// around: `decompose(i) == decompose(i % size)`.
#[derive(Debug, Clone)]
pub struct DimensionSpace {
    catalogs: Vec<Catalog>,
    size: u64,
}

impl DimensionSpace {
    pub fn new(catalogs: Vec<Catalog>) -> Result<Self, ConfigError> {
        if catalogs.is_empty() {
            return Err(ConfigError::validation(
                "dimension space needs at least one catalog",
            ));
        }

        let mut names = HashSet::new();
        let mut size: u64 = 1;
        for catalog in &catalogs {
            if !names.insert(catalog.name()) {
                return Err(ConfigError::InvalidCatalog {
                    name: catalog.name().to_string(),
                    reason: "Duplicate catalog name".to_string(),
                });
            }
            if catalog.is_empty() {
                return Err(ConfigError::InvalidCatalog {
                    name: catalog.name().to_string(),
                    reason: "Catalog has no values".to_string(),
                });
            }
            size = size.checked_mul(catalog.len() as u64).ok_or_else(|| {
                ConfigError::validation("combinatorial space size overflows u64")
            })?;
        }

        Ok(Self { catalogs, size })
    }

    pub fn from_config(catalogs: &[CatalogConfig]) -> Result<Self, ConfigError> {
        let catalogs = catalogs
            .iter()
            .map(Catalog::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(catalogs)
    }

    /// Number of distinct tuples (`P`).
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn catalogs(&self) -> &[Catalog] {
        &self.catalogs
    }

    pub fn catalog(&self, name: &str) -> Option<&Catalog> {
        self.catalogs.iter().find(|c| c.name() == name)
    }

    pub fn decompose(&self, index: u64) -> DimensionTuple {
        let mut remainder = index;
        let entries = self
            .catalogs
            .iter()
            .map(|catalog| {
                let radix = catalog.len() as u64;
                let position = (remainder % radix) as usize;
                remainder /= radix;
                DimensionValue {
                    catalog: catalog.name().to_string(),
                    position,
                    value: catalog.values()[position].clone(),
                }
            })
            .collect();

        DimensionTuple { entries }
    }

    /// Inverse of [`decompose`](Self::decompose) on `[0, size)`.
    ///
    /// Returns `None` when the tuple was not produced by this space.
    pub fn compose(&self, tuple: &DimensionTuple) -> Option<u64> {
        if tuple.len() != self.catalogs.len() {
            return None;
        }

        let mut index = 0u64;
        let mut stride = 1u64;
        for (catalog, entry) in self.catalogs.iter().zip(tuple.entries()) {
            let matches = entry.catalog == catalog.name()
                && catalog.get(entry.position) == Some(entry.value.as_str());
            if !matches {
                return None;
            }
            index += entry.position as u64 * stride;
            stride = stride.saturating_mul(catalog.len() as u64);
        }

        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_catalogs;

    fn default_space() -> DimensionSpace {
        DimensionSpace::from_config(&default_catalogs()).unwrap()
    }

    #[test]
    fn test_default_space_size() {
        assert_eq!(default_space().size(), 240);
    }

    #[test]
    fn test_decompose_zero_is_first_of_every_catalog() {
        let tuple = default_space().decompose(0);
        let values: Vec<&str> = tuple.values().collect();
        assert_eq!(values, vec!["AI Chatbot", "English", "Web", "Developers"]);
        assert_eq!(tuple.positions(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_first_catalog_cycles_fastest() {
        let space = default_space();
        assert_eq!(space.decompose(1).positions(), vec![1, 0, 0, 0]);
        assert_eq!(space.decompose(5).positions(), vec![0, 1, 0, 0]);
        assert_eq!(space.decompose(20).positions(), vec![0, 0, 1, 0]);
        assert_eq!(space.decompose(80).positions(), vec![0, 0, 0, 1]);
        assert_eq!(space.decompose(239).positions(), vec![4, 3, 3, 2]);
    }

    #[test]
    fn test_decompose_is_bijective_on_space() {
        let space = default_space();
        let mut seen = HashSet::new();
        for i in 0..space.size() {
            let tuple = space.decompose(i);
            assert_eq!(space.compose(&tuple), Some(i));
            assert!(seen.insert(tuple), "duplicate tuple at index {}", i);
        }
        assert_eq!(seen.len() as u64, space.size());
    }

    #[test]
    fn test_decompose_is_periodic() {
        let space = default_space();
        for i in [0u64, 1, 17, 239, 240, 241, 1000, 123_456_789, u64::MAX] {
            assert_eq!(space.decompose(i), space.decompose(i % space.size()));
        }
    }

    #[test]
    fn test_tuple_get_by_catalog() {
        let tuple = default_space().decompose(8);
        assert_eq!(tuple.get("theme"), Some("Image Generator"));
        assert_eq!(tuple.get("language"), Some("Spanish"));
        assert_eq!(tuple.get("missing"), None);
    }

    #[test]
    fn test_compose_rejects_foreign_tuple() {
        let space = default_space();
        let other = DimensionSpace::from_config(&[CatalogConfig::new("theme", &["X"])]).unwrap();
        assert_eq!(space.compose(&other.decompose(0)), None);
    }

    #[test]
    fn test_empty_space_rejected() {
        assert!(DimensionSpace::new(vec![]).is_err());
    }

    #[test]
    fn test_duplicate_catalog_name_rejected() {
        let catalogs = vec![
            CatalogConfig::new("theme", &["A"]),
            CatalogConfig::new("theme", &["B"]),
        ];
        assert!(matches!(
            DimensionSpace::from_config(&catalogs),
            Err(ConfigError::InvalidCatalog { .. })
        ));
    }

    #[test]
    fn test_size_overflow_rejected() {
        let wide: Vec<String> = (0..65_536).map(|i| format!("v{}", i)).collect();
        let catalogs: Vec<Catalog> = (0..5)
            .map(|i| Catalog::new(&format!("axis{}", i), wide.clone()).unwrap())
            .collect();
        assert!(DimensionSpace::new(catalogs).is_err());
    }
}
