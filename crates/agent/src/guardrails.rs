use procura_core::config::AgentConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailIntent<'a> {
    Query { text: &'a str },
    ToolCalls { used: usize, requested: usize },
    Delegation { subagent: &'a str, known: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, user_message: String, fallback_path: &'static str },
    Degrade { reason_code: &'static str, user_message: String, fallback_path: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub max_query_chars: usize,
    pub max_tool_calls_per_turn: usize,
    pub delegation_enabled: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { max_query_chars: 4_000, max_tool_calls_per_turn: 24, delegation_enabled: true }
    }
}

impl GuardrailPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_query_chars: config.max_query_chars,
            max_tool_calls_per_turn: (config.max_steps as usize).saturating_mul(3),
            ..Self::default()
        }
    }

    pub fn evaluate(&self, intent: &GuardrailIntent<'_>) -> GuardrailDecision {
        match intent {
            GuardrailIntent::Query { text } if text.trim().is_empty() => GuardrailDecision::Deny {
                reason_code: "empty_query",
                user_message: "Please include a question or instruction.".to_string(),
                fallback_path: "request_query_text",
            },
            GuardrailIntent::Query { text } if text.chars().count() > self.max_query_chars => {
                GuardrailDecision::Deny {
                    reason_code: "query_too_long",
                    user_message: format!(
                        "That message is too long; please keep it under {} characters.",
                        self.max_query_chars
                    ),
                    fallback_path: "shorten_query",
                }
            }
            GuardrailIntent::Query { .. } => GuardrailDecision::Allow,
            GuardrailIntent::ToolCalls { used, requested }
                if used + requested > self.max_tool_calls_per_turn =>
            {
                GuardrailDecision::Degrade {
                    reason_code: "tool_call_budget_exhausted",
                    user_message: "I could not finish gathering information for this request. Please narrow the question."
                        .to_string(),
                    fallback_path: "answer_without_tools",
                }
            }
            GuardrailIntent::ToolCalls { .. } => GuardrailDecision::Allow,
            GuardrailIntent::Delegation { .. } if !self.delegation_enabled => {
                GuardrailDecision::Degrade {
                    reason_code: "delegation_disabled",
                    user_message: "Sub-agent delegation is disabled; handle the task directly."
                        .to_string(),
                    fallback_path: "main_agent_only",
                }
            }
            GuardrailIntent::Delegation { subagent, known: false } => GuardrailDecision::Deny {
                reason_code: "unknown_subagent",
                user_message: format!("There is no sub-agent named `{subagent}`."),
                fallback_path: "main_agent_only",
            },
            GuardrailIntent::Delegation { .. } => GuardrailDecision::Allow,
        }
    }
}
