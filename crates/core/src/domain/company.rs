use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogEntity, EntityKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Buyer-side organisation the procurement agent works for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub company_id: CompanyId,
    pub company_name: String,
    pub division: String,
    pub procurement_agent: String,
    pub agent_id: String,
    pub default_payment_terms: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub annual_budget: Decimal,
    pub primary_location: String,
    pub industry_focus: String,
    pub erp_system: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub company_id: CompanyId,
    pub company_name: String,
    pub division: String,
    pub primary_location: String,
}

impl CatalogEntity for Company {
    type Summary = CompanySummary;

    const KIND: EntityKind = EntityKind::Company;

    fn id(&self) -> &str {
        &self.company_id.0
    }

    fn search_text(&self) -> &str {
        &self.industry_focus
    }

    fn summary(&self) -> CompanySummary {
        CompanySummary {
            company_id: self.company_id.clone(),
            company_name: self.company_name.clone(),
            division: self.division.clone(),
            primary_location: self.primary_location.clone(),
        }
    }
}
