//! Catalogs and the index-to-tuple mapping over their product.

pub mod catalog;
pub mod space;

pub use catalog::Catalog;
pub use space::{DimensionSpace, DimensionTuple, DimensionValue};
