//! Named operations the model can call.
//!
//! Every tool returns text. Failures a user should hear about (unknown id,
//! invalid status) come back as an ordinary result string; anything else is
//! turned into text by [`ToolRegistry::invoke`], so the loop never aborts on a
//! bad tool call.

pub mod document;
pub mod lookup;
pub mod status;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use procura_core::catalog::IdBinding;
use procura_core::{Catalogs, Session};
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::ToolDefinition;

pub use document::ReadDocumentTool;
pub use lookup::{EntityInfoTool, ListEntitiesTool, SearchSuppliersTool};
pub use status::UpdateConversationStatusTool;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> String;
    /// JSON schema of the argument object.
    fn parameters(&self) -> Value;
    async fn execute(&self, input: Value, session: &Session) -> Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with every procurement tool. Lookups take their id from the
    /// call arguments and fall back to the session context.
    pub fn procurement(catalogs: &Catalogs) -> Self {
        Self::procurement_with_bindings(catalogs, LookupBindings::default())
    }

    pub fn procurement_with_bindings(catalogs: &Catalogs, bindings: LookupBindings) -> Self {
        let products = Arc::new(catalogs.products.clone());
        let suppliers = Arc::new(catalogs.suppliers.clone());
        let companies = Arc::new(catalogs.companies.clone());

        let mut registry = Self::default();
        registry.register(EntityInfoTool::new(Arc::clone(&products), bindings.product));
        registry.register(EntityInfoTool::new(Arc::clone(&suppliers), bindings.supplier));
        registry.register(EntityInfoTool::new(companies, bindings.company));
        registry.register(ListEntitiesTool::new(products));
        registry.register(ListEntitiesTool::new(Arc::clone(&suppliers)));
        registry.register(SearchSuppliersTool::new(suppliers));
        registry.register(UpdateConversationStatusTool);
        registry.register(ReadDocumentTool);
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Registry limited to `names`; unknown names are skipped.
    pub fn subset(&self, names: &[&str]) -> Self {
        let tools = names
            .iter()
            .filter_map(|name| self.tools.get(*name).map(|tool| (name.to_string(), Arc::clone(tool))))
            .collect();
        Self { tools }
    }

    pub async fn invoke(&self, name: &str, input: Value, session: &Session) -> String {
        let Some(tool) = self.tools.get(name) else {
            warn!(
                event_name = "agent.tool.unknown",
                thread_id = %session.id(),
                tool = name,
                "model requested an unknown tool"
            );
            return format!("Unknown tool `{name}`. Available tools: {}", self.names().join(", "));
        };

        match tool.execute(input, session).await {
            Ok(output) => {
                debug!(
                    event_name = "agent.tool.completed",
                    thread_id = %session.id(),
                    tool = name,
                    "tool call completed"
                );
                output
            }
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    thread_id = %session.id(),
                    tool = name,
                    error = %error,
                    "tool call failed"
                );
                format!("Tool `{name}` failed: {error}")
            }
        }
    }
}

/// Per-kind id bindings for the lookup tools.
#[derive(Clone, Debug, Default)]
pub struct LookupBindings {
    pub product: IdBinding,
    pub supplier: IdBinding,
    pub company: IdBinding,
}

impl LookupBindings {
    /// Binds every lookup to the ids of a fixed context, so the tools take no
    /// arguments. Missing ids keep the argument binding.
    pub fn fixed(context: &procura_core::RequestContext) -> Self {
        let bind = |id: &Option<String>| match id {
            Some(id) => IdBinding::Fixed(id.clone()),
            None => IdBinding::Argument,
        };
        Self {
            product: bind(&context.product_id),
            supplier: bind(&context.supplier_id),
            company: bind(&context.company_id),
        }
    }
}

/// Reads an optional string argument; absent, null and non-object inputs all
/// count as missing.
pub(crate) fn string_argument<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}
