//! Agent runtime for the procurement assistant.
//!
//! The runtime drives a bounded tool-calling loop against an OpenAI-compatible
//! chat model:
//! 1. **Guardrails** (`guardrails`) - reject empty or oversized queries, bound tool use
//! 2. **Prompting** (`prompts`) - render the system prompt from the session record
//! 3. **Tools** (`tools`) - catalog lookups, status updates, document reading
//! 4. **Delegation** (`subagents`) - hand focused work to a sub-agent via `task`
//!
//! The model never mutates state directly. Every change to a conversation goes
//! through a tool and therefore through the session's status tracker.

pub mod guardrails;
pub mod llm;
pub mod prompts;
pub mod runtime;
pub mod subagents;
pub mod tools;

pub use llm::{LlmClient, OpenAiCompatibleClient};
pub use runtime::{AgentEvent, AgentReply, AgentRuntime, AgentSettings, ToolTrace};
pub use tools::{Tool, ToolRegistry};
