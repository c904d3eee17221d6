use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use procura_core::catalog::{Catalog, CatalogEntity, EntityKind, IdBinding};
use procura_core::{Session, Supplier};
use serde::Serialize;
use serde_json::{json, Value};

use super::{string_argument, Tool};

/// `get_<kind>_info`: one full record, resolved from a bound id, the call
/// argument, or the session context, in that order.
pub struct EntityInfoTool<T> {
    catalog: Arc<Catalog<T>>,
    binding: IdBinding,
}

impl<T: CatalogEntity> EntityInfoTool<T> {
    pub fn new(catalog: Arc<Catalog<T>>, binding: IdBinding) -> Self {
        Self { catalog, binding }
    }

    pub fn context_scoped(catalog: Arc<Catalog<T>>) -> Self {
        Self::new(catalog, IdBinding::Argument)
    }

    pub fn bound_to(catalog: Arc<Catalog<T>>, id: impl Into<String>) -> Self {
        Self::new(catalog, IdBinding::Fixed(id.into()))
    }
}

#[async_trait]
impl<T> Tool for EntityInfoTool<T>
where
    T: CatalogEntity + Serialize,
{
    fn name(&self) -> &'static str {
        match T::KIND {
            EntityKind::Product => "get_product_info",
            EntityKind::Supplier => "get_supplier_info",
            EntityKind::Company => "get_company_info",
        }
    }

    fn description(&self) -> String {
        let scope = match self.binding {
            IdBinding::Fixed(_) => "the configured",
            IdBinding::Argument => "the given or current",
        };
        match T::KIND {
            EntityKind::Product => format!(
                "Get complete product information including price, raw material composition, manufacturing lead time, and storage requirements for {scope} product."
            ),
            EntityKind::Supplier => format!(
                "Get detailed supplier information including contact details, certifications, payment terms, and product focus for {scope} supplier."
            ),
            EntityKind::Company => format!(
                "Get internal company information including procurement agent details, budget, payment terms, and ERP system for {scope} company."
            ),
        }
    }

    fn parameters(&self) -> Value {
        match self.binding {
            IdBinding::Fixed(_) => json!({ "type": "object", "properties": {} }),
            IdBinding::Argument => {
                let field = T::KIND.id_field();
                json!({
                    "type": "object",
                    "properties": {
                        field: {
                            "type": "string",
                            "description": format!(
                                "{} ID. Omit to use the {} of the current conversation.",
                                T::KIND.label(),
                                T::KIND
                            ),
                        }
                    }
                })
            }
        }
    }

    async fn execute(&self, input: Value, session: &Session) -> Result<String> {
        let argument = string_argument(&input, T::KIND.id_field());
        let explicit_id = self.binding.explicit_id(argument);

        match self.catalog.resolve_in(explicit_id, &session.context()) {
            Ok(record) => Ok(serde_json::to_string_pretty(record)?),
            Err(error) => Ok(error.to_string()),
        }
    }
}

/// `list_all_<kind>s`: summaries of every record in table order.
pub struct ListEntitiesTool<T> {
    catalog: Arc<Catalog<T>>,
}

impl<T: CatalogEntity> ListEntitiesTool<T> {
    pub fn new(catalog: Arc<Catalog<T>>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl<T: CatalogEntity> Tool for ListEntitiesTool<T> {
    fn name(&self) -> &'static str {
        match T::KIND {
            EntityKind::Product => "list_all_products",
            EntityKind::Supplier => "list_all_suppliers",
            EntityKind::Company => "list_all_companies",
        }
    }

    fn description(&self) -> String {
        format!("List all available {}s with their basic information", T::KIND)
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value, _session: &Session) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.catalog.list_all())?)
    }
}

pub struct SearchSuppliersTool {
    catalog: Arc<Catalog<Supplier>>,
}

impl SearchSuppliersTool {
    pub fn new(catalog: Arc<Catalog<Supplier>>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for SearchSuppliersTool {
    fn name(&self) -> &'static str {
        "search_suppliers_by_product"
    }

    fn description(&self) -> String {
        "Search suppliers whose product focus mentions a keyword (case-insensitive), e.g. `epoxy` or `solvents`."
            .to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": { "type": "string", "description": "Product or material keyword" }
            },
            "required": ["keyword"]
        })
    }

    async fn execute(&self, input: Value, _session: &Session) -> Result<String> {
        let keyword = string_argument(&input, "keyword")
            .ok_or_else(|| anyhow!("missing required argument `keyword`"))?;

        let matches = self.catalog.search_by_keyword(keyword);
        if matches.is_empty() {
            return Ok(format!("No suppliers found matching \"{keyword}\""));
        }
        Ok(serde_json::to_string_pretty(&matches)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use procura_core::{Catalogs, RequestContext, Session, SessionId};
    use serde_json::{json, Value};

    use super::{EntityInfoTool, ListEntitiesTool, SearchSuppliersTool};
    use crate::tools::Tool;

    fn session(context: RequestContext) -> Session {
        Session::new(SessionId("lookup-test".to_string()), context)
    }

    fn bound_session() -> Session {
        session(RequestContext::new("PROD-001", "CCSI-910-S", "COMP-001"))
    }

    #[tokio::test]
    async fn context_scoped_lookup_reads_session_context() {
        let catalogs = Catalogs::seeded();
        let tool = EntityInfoTool::context_scoped(Arc::new(catalogs.products));

        let output = tool.execute(json!({}), &bound_session()).await.expect("execute");
        let record: Value = serde_json::from_str(&output).expect("json product");

        assert_eq!(record["productId"], "PROD-001");
        assert_eq!(record["productName"], "Advanced Polymer Resin (APR-200)");
        assert_eq!(record["standardCostPerKG"], 18.5);
    }

    #[tokio::test]
    async fn argument_id_wins_over_context() {
        let catalogs = Catalogs::seeded();
        let tool = EntityInfoTool::context_scoped(Arc::new(catalogs.suppliers));

        let output = tool
            .execute(json!({ "supplierId": "GPL-445-S" }), &bound_session())
            .await
            .expect("execute");

        assert!(output.contains("Global Polymers Ltd."));
    }

    #[tokio::test]
    async fn bound_id_wins_over_argument_and_context() {
        let catalogs = Catalogs::seeded();
        let tool = EntityInfoTool::bound_to(Arc::new(catalogs.companies), "COMP-002");

        let output = tool
            .execute(json!({ "companyId": "COMP-001" }), &bound_session())
            .await
            .expect("execute");

        assert!(output.contains("Emma Schmidt"));
        assert_eq!(tool.parameters()["properties"], json!({}));
    }

    #[tokio::test]
    async fn unknown_and_missing_ids_return_descriptive_text() {
        let catalogs = Catalogs::seeded();
        let tool = EntityInfoTool::context_scoped(Arc::new(catalogs.products));

        let unknown = tool
            .execute(json!({}), &session(RequestContext {
                product_id: Some("PROD-999".to_string()),
                ..RequestContext::default()
            }))
            .await
            .expect("execute");
        assert_eq!(unknown, "Product ID: PROD-999 not found");

        let missing =
            tool.execute(json!({}), &session(RequestContext::default())).await.expect("execute");
        assert_eq!(missing, "No productId available to look up the product");
    }

    #[tokio::test]
    async fn list_tool_returns_summaries() {
        let catalogs = Catalogs::seeded();
        let tool = ListEntitiesTool::new(Arc::new(catalogs.products));

        let output = tool.execute(json!({}), &bound_session()).await.expect("execute");
        let summaries: Value = serde_json::from_str(&output).expect("json list");

        assert_eq!(summaries.as_array().map(Vec::len), Some(2));
        assert_eq!(summaries[1]["productId"], "PROD-002");
        assert_eq!(summaries[1]["costPerKG"], 22.75);
    }

    #[tokio::test]
    async fn supplier_search_matches_product_focus() {
        let catalogs = Catalogs::seeded();
        let tool = SearchSuppliersTool::new(Arc::new(catalogs.suppliers));

        let hits = tool.execute(json!({ "keyword": "chemical" }), &bound_session()).await.expect("hits");
        let hits: Value = serde_json::from_str(&hits).expect("json hits");
        assert_eq!(hits.as_array().map(Vec::len), Some(1));
        assert_eq!(hits[0]["supplierId"], "CCSI-910-S");

        let none = tool
            .execute(json!({ "keyword": "nonexistent" }), &bound_session())
            .await
            .expect("no hits");
        assert_eq!(none, "No suppliers found matching \"nonexistent\"");

        assert!(tool.execute(json!({}), &bound_session()).await.is_err());
    }
}
