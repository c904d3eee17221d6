use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntity, EntityKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub unit_of_measure: String,
    #[serde(rename = "standardCostPerKG", with = "rust_decimal::serde::float")]
    pub standard_cost_per_kg: Decimal,
    /// Days.
    pub manufacturing_lead_time: u32,
    pub raw_material1: String,
    pub raw_material2: String,
    pub raw_material3: String,
    pub storage_requirements: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    #[serde(rename = "costPerKG", with = "rust_decimal::serde::float")]
    pub cost_per_kg: Decimal,
}

impl CatalogEntity for Product {
    type Summary = ProductSummary;

    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &str {
        &self.product_id.0
    }

    fn search_text(&self) -> &str {
        &self.category
    }

    fn summary(&self) -> ProductSummary {
        ProductSummary {
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            category: self.category.clone(),
            cost_per_kg: self.standard_cost_per_kg,
        }
    }
}
