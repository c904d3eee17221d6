//! Static entity tables and id resolution.
//!
//! A [`Catalog`] is built once and never mutated, so it is shared through an
//! `Arc` without locking. Every lookup resolves its id the same way: an
//! explicit id (bound at construction or passed as a tool argument) wins,
//! otherwise the id comes from the ambient [`RequestContext`].
//!
//! [`RequestContext`]: crate::domain::conversation::RequestContext

pub mod seed;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::conversation::RequestContext;
use crate::errors::LookupError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Supplier,
    Company,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Supplier => "Supplier",
            Self::Company => "Company",
        }
    }

    /// Name of the id field in tool arguments and serialized records.
    pub fn id_field(&self) -> &'static str {
        match self {
            Self::Product => "productId",
            Self::Supplier => "supplierId",
            Self::Company => "companyId",
        }
    }

    pub fn context_id<'a>(&self, context: &'a RequestContext) -> Option<&'a str> {
        match self {
            Self::Product => context.product_id.as_deref(),
            Self::Supplier => context.supplier_id.as_deref(),
            Self::Company => context.company_id.as_deref(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Product => "product",
            Self::Supplier => "supplier",
            Self::Company => "company",
        })
    }
}

pub trait CatalogEntity: Clone + Send + Sync + 'static {
    type Summary: Serialize + Clone + Send;

    const KIND: EntityKind;

    fn id(&self) -> &str;
    /// Field matched by [`Catalog::search_by_keyword`].
    fn search_text(&self) -> &str;
    fn summary(&self) -> Self::Summary;
}

/// Where a lookup takes its explicit id from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IdBinding {
    /// Fixed when the lookup is built. Authoritative over arguments and context.
    Fixed(String),
    /// Read from the call's arguments, falling back to the context.
    #[default]
    Argument,
}

impl IdBinding {
    /// Picks the explicit id for one call: a fixed binding beats the argument.
    pub fn explicit_id<'a>(&'a self, argument: Option<&'a str>) -> Option<&'a str> {
        match self {
            Self::Fixed(id) => Some(id.as_str()),
            Self::Argument => argument,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Catalog<T> {
    entries: Vec<T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: CatalogEntity> Catalog<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self { entries }
    }

    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Resolves one record. `context_id` is only consulted when no explicit id
    /// is given; blank ids count as absent.
    pub fn resolve<F>(&self, explicit_id: Option<&str>, context_id: F) -> Result<&T, LookupError>
    where
        F: FnOnce() -> Option<String>,
    {
        let id = match non_blank(explicit_id) {
            Some(id) => id.to_string(),
            None => context_id()
                .filter(|id| !id.trim().is_empty())
                .ok_or(LookupError::MissingIdentifier { kind: T::KIND })?,
        };
        let id = id.trim();

        self.find(id).ok_or_else(|| LookupError::NotFound { kind: T::KIND, id: id.to_string() })
    }

    /// Resolution against a request context.
    pub fn resolve_in(
        &self,
        explicit_id: Option<&str>,
        context: &RequestContext,
    ) -> Result<&T, LookupError> {
        self.resolve(explicit_id, || T::KIND.context_id(context).map(str::to_string))
    }

    pub fn list_all(&self) -> Vec<T::Summary> {
        self.entries.iter().map(CatalogEntity::summary).collect()
    }

    pub fn search_by_keyword(&self, keyword: &str) -> Vec<T::Summary> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| entry.search_text().to_lowercase().contains(&needle))
            .map(CatalogEntity::summary)
            .collect()
    }
}

fn non_blank(id: Option<&str>) -> Option<&str> {
    id.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rust_decimal::Decimal;

    use super::seed::{seed_products, seed_suppliers};
    use super::{Catalog, EntityKind, IdBinding};
    use crate::domain::conversation::RequestContext;
    use crate::domain::product::{Product, ProductId};
    use crate::domain::supplier::Supplier;
    use crate::errors::LookupError;

    fn products() -> Catalog<Product> {
        Catalog::new(seed_products())
    }

    #[test]
    fn explicit_id_wins_over_context_id() {
        let catalog = products();

        let product = catalog
            .resolve(Some("PROD-002"), || Some("PROD-001".to_string()))
            .expect("explicit id resolves");

        assert_eq!(product.product_id, ProductId("PROD-002".to_string()));
    }

    #[test]
    fn context_is_not_consulted_when_explicit_id_present() {
        let catalog = products();
        let consulted = Cell::new(false);

        catalog
            .resolve(Some("PROD-001"), || {
                consulted.set(true);
                None
            })
            .expect("explicit id resolves");

        assert!(!consulted.get());
    }

    #[test]
    fn missing_identifier_when_neither_source_has_an_id() {
        let catalog = products();

        let error = catalog.resolve(None, || None).expect_err("no id anywhere");

        assert_eq!(error, LookupError::MissingIdentifier { kind: EntityKind::Product });
    }

    #[test]
    fn blank_explicit_id_falls_back_to_context() {
        let catalog = products();

        let product = catalog
            .resolve(Some("  "), || Some("PROD-001".to_string()))
            .expect("context id resolves");

        assert_eq!(product.product_id.0, "PROD-001");
    }

    #[test]
    fn unknown_context_id_is_not_found() {
        let catalog = products();

        let error =
            catalog.resolve(None, || Some("UNKNOWN-ID".to_string())).expect_err("unknown id");

        assert_eq!(
            error,
            LookupError::NotFound { kind: EntityKind::Product, id: "UNKNOWN-ID".to_string() }
        );
    }

    #[test]
    fn resolves_seed_product_from_context() {
        let catalog = products();
        let context = RequestContext::new("PROD-001", "CCSI-910-S", "COMP-001");

        let product = catalog.resolve_in(None, &context).expect("seed product");

        assert_eq!(product.product_name, "Advanced Polymer Resin (APR-200)");
        assert_eq!(product.standard_cost_per_kg, Decimal::new(185, 1));

        let json = serde_json::to_value(product).expect("serialize");
        assert_eq!(json["productId"], "PROD-001");
        assert_eq!(json["standardCostPerKG"], 18.5);

        let missing = catalog
            .resolve_in(None, &RequestContext { product_id: Some("PROD-999".into()), ..context })
            .expect_err("unknown product");
        assert_eq!(
            missing,
            LookupError::NotFound { kind: EntityKind::Product, id: "PROD-999".to_string() }
        );
    }

    #[test]
    fn fixed_binding_beats_call_argument() {
        let fixed = IdBinding::Fixed("PROD-001".to_string());
        assert_eq!(fixed.explicit_id(Some("PROD-002")), Some("PROD-001"));
        assert_eq!(IdBinding::Argument.explicit_id(Some("PROD-002")), Some("PROD-002"));
        assert_eq!(IdBinding::Argument.explicit_id(None), None);
    }

    #[test]
    fn keyword_search_is_case_insensitive_substring() {
        let catalog: Catalog<Supplier> = Catalog::new(seed_suppliers());

        let hits = catalog.search_by_keyword("CHEMICAL");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].supplier_id.0, "CCSI-910-S");

        assert!(catalog.search_by_keyword("nonexistent").is_empty());
        assert!(catalog.search_by_keyword("   ").is_empty());
    }

    #[test]
    fn list_all_keeps_table_order_and_is_recomputed() {
        let catalog = products();

        let first = catalog.list_all();
        let second = catalog.list_all();

        assert_eq!(first, second);
        let ids: Vec<_> = first.iter().map(|summary| summary.product_id.0.as_str()).collect();
        assert_eq!(ids, vec!["PROD-001", "PROD-002"]);
    }
}
