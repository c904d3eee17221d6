use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntity, EntityKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub primary_contact: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub certification: String,
    pub payment_terms_accepted: String,
    pub product_focus: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSummary {
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub product_focus: String,
    pub certification: String,
}

impl CatalogEntity for Supplier {
    type Summary = SupplierSummary;

    const KIND: EntityKind = EntityKind::Supplier;

    fn id(&self) -> &str {
        &self.supplier_id.0
    }

    fn search_text(&self) -> &str {
        &self.product_focus
    }

    fn summary(&self) -> SupplierSummary {
        SupplierSummary {
            supplier_id: self.supplier_id.clone(),
            supplier_name: self.supplier_name.clone(),
            product_focus: self.product_focus.clone(),
            certification: self.certification.clone(),
        }
    }
}
