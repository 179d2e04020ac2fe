//! SKU to brand resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resolves SKUs to brands.
///
/// Implementations are shared across parallel previews.
pub trait BrandLookup: Send + Sync {
    /// Brand owning `sku`, if known.
    fn brand_for_sku(&self, sku: &str) -> Option<String>;

    /// Every known brand, in the order allocations should list them.
    fn all_brands(&self) -> Vec<String>;
}

/// In-memory brand lookup.
///
/// `all_brands` returns the explicit brand list followed by any brand that
/// only appears in the SKU map, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticBrandLookup {
    /// SKU to brand.
    #[serde(default)]
    pub skus: BTreeMap<String, String>,
    /// Preferred brand order.
    #[serde(default)]
    pub brands: Vec<String>,
}

impl StaticBrandLookup {
    /// Creates a lookup from `(sku, brand)` pairs.
    pub fn from_pairs<I, S, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, B)>,
        S: Into<String>,
        B: Into<String>,
    {
        Self {
            skus: pairs
                .into_iter()
                .map(|(sku, brand)| (sku.into(), brand.into()))
                .collect(),
            brands: Vec::new(),
        }
    }

    /// Sets the preferred brand order.
    #[must_use]
    pub fn with_brand_order<I, B>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<String>,
    {
        self.brands = brands.into_iter().map(Into::into).collect();
        self
    }
}

impl BrandLookup for StaticBrandLookup {
    fn brand_for_sku(&self, sku: &str) -> Option<String> {
        self.skus.get(sku).cloned()
    }

    fn all_brands(&self) -> Vec<String> {
        let mut brands = self.brands.clone();
        let mut rest: Vec<&String> = self
            .skus
            .values()
            .filter(|brand| !brands.contains(brand))
            .collect();
        rest.sort();
        rest.dedup();
        brands.extend(rest.into_iter().cloned());
        brands
    }
}
