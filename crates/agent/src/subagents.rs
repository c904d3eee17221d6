//! Sub-agents the main loop can hand a focused task to.
//!
//! A sub-agent runs with its own system prompt and a subset of the tools, and
//! only its final answer flows back into the main conversation.

use serde_json::{json, Value};

use crate::llm::ToolDefinition;

pub const TASK_TOOL: &str = "task";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubAgent {
    pub name: &'static str,
    pub description: &'static str,
    pub system_prompt: &'static str,
    pub tools: &'static [&'static str],
}

const NEGOTIATION_PROMPT: &str = "You are a Negotiation Agent working for the buyer's procurement interests. \
Secure the best price and terms (maximum value, minimum cost and risk) while keeping a professional, collaborative tone. \
Open 10-15% below the supplier's first offer, look for trade-offs beyond price (quantity, delivery timeline, payment terms, certifications, warranty), \
never accept unfavorable terms without proposing an alternative, and stay within the company budget. \
Answer with: NEGOTIATION STATUS, CURRENT POSITION (supplier offer, our counter, gap), NEGOTIATION POINTS, RECOMMENDED RESPONSE, NEXT STEPS. \
Keep responses under 300 words and always propose specific numbers.";

const HUMAN_CENTRIC_CHAT_PROMPT: &str = "You are the HumanCentricChat Agent. \
Gather the customer's procurement requirements through warm, natural conversation. \
First establish the product name or SKU and the required quantity, then gradually ask about price expectations, delivery timeline, payment preferences and other requirements. \
Never quote prices or discuss contract terms; if asked about pricing, explain it will be covered during negotiation. \
Finish with a short summary of the information collected so far.";

const DOCUMENT_SUMMARY_PROMPT: &str = "You are a Document Analysis Agent. \
Use read_document to obtain the text, then classify the document (quote, specifications, catalog, certificate, commercial_proposal, general), \
extract date, parties, amount, product, quantity, delivery timeline and payment terms, and summarize it in bullet points. \
Only report information found in the document; write \"Not found\" otherwise. Keep the answer under 400 words.";

pub fn default_subagents() -> Vec<SubAgent> {
    vec![
        SubAgent {
            name: "negotiation",
            description: "Handles price and terms negotiation with the supplier and proposes counter-offers with concrete numbers.",
            system_prompt: NEGOTIATION_PROMPT,
            tools: &["get_product_info", "get_supplier_info", "get_company_info"],
        },
        SubAgent {
            name: "human-centric-chat",
            description: "Gathers product, quantity, delivery and payment requirements from the customer through friendly conversation.",
            system_prompt: HUMAN_CENTRIC_CHAT_PROMPT,
            tools: &[],
        },
        SubAgent {
            name: "document-summary",
            description: "Classifies and summarizes an uploaded document (RFQ, quote, specification) into key facts.",
            system_prompt: DOCUMENT_SUMMARY_PROMPT,
            tools: &["read_document"],
        },
    ]
}

/// Definition of the `task` tool offered to the main agent.
pub fn task_tool_definition(subagents: &[SubAgent]) -> ToolDefinition {
    let names: Vec<&str> = subagents.iter().map(|agent| agent.name).collect();
    ToolDefinition {
        name: TASK_TOOL.to_string(),
        description: "Delegate a focused task to a sub-agent and receive its final answer.".to_string(),
        parameters: task_parameters(&names),
    }
}

fn task_parameters(names: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": {
            "subagent": { "type": "string", "enum": names, "description": "Sub-agent to run" },
            "description": { "type": "string", "description": "Self-contained description of the task" }
        },
        "required": ["subagent", "description"]
    })
}

pub fn find<'a>(subagents: &'a [SubAgent], name: &str) -> Option<&'a SubAgent> {
    subagents.iter().find(|agent| agent.name == name)
}

#[cfg(test)]
mod tests {
    use super::{default_subagents, find, task_tool_definition, TASK_TOOL};

    #[test]
    fn task_tool_lists_every_subagent() {
        let subagents = default_subagents();
        let definition = task_tool_definition(&subagents);

        assert_eq!(definition.name, TASK_TOOL);
        let names = definition.parameters["properties"]["subagent"]["enum"]
            .as_array()
            .map(|names| names.len());
        assert_eq!(names, Some(3));
        assert!(find(&subagents, "document-summary").is_some());
        assert!(find(&subagents, "pricing-oracle").is_none());
    }
}
