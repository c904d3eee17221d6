use anyhow::{Context as _, Result};
use procura_core::ConversationRecord;
use serde::Serialize;
use tera::{Context, Tera};

use crate::llm::ToolDefinition;
use crate::subagents::SubAgent;

const MAIN_PROMPT: &str = "main_prompt.txt";

const MAIN_PROMPT_TEMPLATE: &str = r#"You are an expert procurement agent for {{ company_name }}.
Your role is to assist with procurement decisions and provide information about:
- Products: specifications, pricing, raw materials, lead times, and storage requirements
- Suppliers: contact information, certifications, payment terms, and product focus
- Company: internal procurement policies and ERP system

Current Context:
- Product ID: {{ product_id }}
- Supplier ID: {{ supplier_id }}
- Company ID: {{ company_id }}
- Conversation Status: {{ status }}
{% if note %}- Note: {{ note }}
{% endif %}
Available tools:
{% for tool in tools %}- {{ tool }}
{% endfor %}{% if subagents %}
Delegate focused work with the `task` tool to one of these sub-agents:
{% for agent in subagents %}- {{ agent.name }}: {{ agent.description }}
{% endfor %}{% endif %}
Always provide accurate, data-driven recommendations based on the available information.
When comparing options, consider cost, lead time, certifications, and supplier reliability.
Track the conversation status and update it appropriately as the negotiation progresses using the update_conversation_status tool."#;

#[derive(Serialize)]
struct SubAgentLine<'a> {
    name: &'a str,
    description: &'a str,
}

pub struct PromptRenderer {
    tera: Tera,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(MAIN_PROMPT, MAIN_PROMPT_TEMPLATE)
            .context("main prompt template failed to compile")?;
        Ok(Self { tera })
    }

    pub fn main_prompt(
        &self,
        company_name: &str,
        record: &ConversationRecord,
        tools: &[ToolDefinition],
        subagents: &[SubAgent],
    ) -> Result<String> {
        let unset = "<not set>";
        let mut context = Context::new();
        context.insert("company_name", company_name);
        context.insert("product_id", record.product_id.as_deref().unwrap_or(unset));
        context.insert("supplier_id", record.supplier_id.as_deref().unwrap_or(unset));
        context.insert("company_id", record.company_id.as_deref().unwrap_or(unset));
        context.insert("status", record.status.as_str());
        context.insert("note", &record.note);
        context.insert("tools", &tools.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>());
        context.insert(
            "subagents",
            &subagents
                .iter()
                .map(|agent| SubAgentLine { name: agent.name, description: agent.description })
                .collect::<Vec<_>>(),
        );

        self.tera.render(MAIN_PROMPT, &context).context("main prompt failed to render")
    }
}
