use std::sync::Arc;

use anyhow::Result;
use procura_core::config::AppConfig;
use procura_core::{
    ApplicationError, Catalogs, ConversationStatus, Session, TrackerState, TurnRole,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::guardrails::{GuardrailDecision, GuardrailIntent, GuardrailPolicy};
use crate::llm::{
    ChatMessage, ChatReply, ChatRequest, LlmClient, OpenAiCompatibleClient, ToolCall,
    ToolDefinition,
};
use crate::prompts::PromptRenderer;
use crate::subagents::{self, default_subagents, task_tool_definition, SubAgent, TASK_TOOL};
use crate::tools::{string_argument, ToolRegistry};

const EVENT_BUFFER: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSettings {
    pub company_name: String,
    pub max_steps: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { company_name: "Stellar Manufacturing Corp.".to_string(), max_steps: 8 }
    }
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { company_name: config.agent.company_name.clone(), max_steps: config.agent.max_steps }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolTrace {
    pub name: String,
    pub arguments: Value,
    pub output: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub message: String,
    pub status: TrackerState,
    pub tool_calls: Vec<ToolTrace>,
    pub steps: u32,
}

/// Progress of one streamed turn. `Done` or `Error` is always the last event.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    ToolCall { name: String, arguments: Value },
    ToolResult { name: String, output: String },
    Message { content: String },
    Done { status: ConversationStatus, note: Option<String> },
    Error { message: String },
}

impl AgentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Message { .. } => "message",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    prompts: PromptRenderer,
    subagents: Vec<SubAgent>,
    guardrails: GuardrailPolicy,
    settings: AgentSettings,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, settings: AgentSettings) -> Result<Self> {
        Ok(Self {
            llm,
            tools,
            prompts: PromptRenderer::new()?,
            subagents: default_subagents(),
            guardrails: GuardrailPolicy::default(),
            settings,
        })
    }

    /// Runtime backed by the configured chat-completions endpoint and the
    /// full procurement tool set.
    pub fn from_config(config: &AppConfig, catalogs: &Catalogs) -> Result<Self> {
        let llm = OpenAiCompatibleClient::from_config(&config.llm)?;
        Ok(Self::new(
            Arc::new(llm),
            ToolRegistry::procurement(catalogs),
            AgentSettings::from_config(config),
        )?
        .with_guardrails(GuardrailPolicy::from_config(&config.agent)))
    }

    pub fn with_guardrails(mut self, guardrails: GuardrailPolicy) -> Self {
        self.guardrails = guardrails;
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Tools offered to the main agent, including `task` when delegation is
    /// available.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.tools.definitions();
        if self.delegation_available() {
            definitions.push(task_tool_definition(&self.subagents));
        }
        definitions
    }

    pub async fn handle_query(
        &self,
        session: &Session,
        query: &str,
    ) -> Result<AgentReply, ApplicationError> {
        self.run_turn(session, query, None).await
    }

    /// Runs the turn on a background task and returns its event stream.
    pub fn stream_query(
        self: Arc<Self>,
        session: Arc<Session>,
        query: String,
    ) -> mpsc::Receiver<AgentEvent> {
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(async move {
            let last = match self.run_turn(&session, &query, Some(&sender)).await {
                Ok(reply) => AgentEvent::Done { status: reply.status.status, note: reply.status.note },
                Err(error) => AgentEvent::Error { message: error.to_string() },
            };
            let _ = sender.send(last).await;
        });
        receiver
    }

    async fn run_turn(
        &self,
        session: &Session,
        query: &str,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<AgentReply, ApplicationError> {
        if let GuardrailDecision::Deny { reason_code, user_message, .. }
        | GuardrailDecision::Degrade { reason_code, user_message, .. } =
            self.guardrails.evaluate(&GuardrailIntent::Query { text: query })
        {
            info!(
                event_name = "agent.guardrail.query_rejected",
                thread_id = %session.id(),
                reason_code,
                "query rejected by guardrail"
            );
            return Err(ApplicationError::Rejected(user_message));
        }

        let definitions = self.tool_definitions();
        let subagents: &[SubAgent] = if self.delegation_available() { &self.subagents } else { &[] };
        let system_prompt = self
            .prompts
            .main_prompt(&self.settings.company_name, &session.record(), &definitions, subagents)
            .map_err(|error| ApplicationError::Configuration(format!("{error:#}")))?;

        let mut messages = vec![ChatMessage::system(system_prompt)];
        messages.extend(session.turns().into_iter().map(|turn| match turn.role {
            TurnRole::User => ChatMessage::user(turn.content),
            TurnRole::Assistant => ChatMessage::assistant(turn.content),
        }));
        messages.push(ChatMessage::user(query));

        info!(
            event_name = "agent.turn.started",
            thread_id = %session.id(),
            history_turns = messages.len() - 2,
            "agent turn started"
        );

        let mut trace: Vec<ToolTrace> = Vec::new();
        for step in 1..=self.settings.max_steps {
            let request = ChatRequest { messages: messages.clone(), tools: definitions.clone() };
            let reply = self.llm.chat(&request).await.map_err(|error| {
                warn!(
                    event_name = "agent.llm.failed",
                    thread_id = %session.id(),
                    error = %error,
                    "language model request failed"
                );
                ApplicationError::Integration(format!("language model request failed: {error:#}"))
            })?;

            let calls = match reply {
                ChatReply::Message(content) => {
                    return Ok(self.finish(session, query, content, trace, step, events).await);
                }
                ChatReply::ToolCalls(calls) => calls,
            };

            let intent = GuardrailIntent::ToolCalls { used: trace.len(), requested: calls.len() };
            if let GuardrailDecision::Deny { reason_code, user_message, .. }
            | GuardrailDecision::Degrade { reason_code, user_message, .. } =
                self.guardrails.evaluate(&intent)
            {
                warn!(
                    event_name = "agent.guardrail.tool_budget",
                    thread_id = %session.id(),
                    reason_code,
                    "tool call budget exhausted"
                );
                let content = self.answer_without_tools(messages, user_message).await;
                return Ok(self.finish(session, query, content, trace, step, events).await);
            }

            messages.push(ChatMessage::assistant_tool_calls(calls.clone()));
            for call in calls {
                emit(events, AgentEvent::ToolCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                })
                .await;

                let output = self.dispatch(session, &call).await;

                emit(events, AgentEvent::ToolResult { name: call.name.clone(), output: output.clone() })
                    .await;
                messages.push(ChatMessage::tool_result(call.id, output.clone()));
                trace.push(ToolTrace { name: call.name, arguments: call.arguments, output });
            }
        }

        warn!(
            event_name = "agent.turn.step_budget_exhausted",
            thread_id = %session.id(),
            max_steps = self.settings.max_steps,
            "agent did not produce an answer"
        );
        Err(ApplicationError::Integration(format!(
            "the agent did not produce an answer within {} steps",
            self.settings.max_steps
        )))
    }

    async fn finish(
        &self,
        session: &Session,
        query: &str,
        content: String,
        tool_calls: Vec<ToolTrace>,
        steps: u32,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> AgentReply {
        session.push_turn(TurnRole::User, query);
        session.push_turn(TurnRole::Assistant, content.clone());
        emit(events, AgentEvent::Message { content: content.clone() }).await;

        let status = session.tracker().state();
        info!(
            event_name = "agent.turn.completed",
            thread_id = %session.id(),
            steps,
            tool_calls = tool_calls.len(),
            status = %status.status,
            "agent turn completed"
        );
        AgentReply { message: content, status, tool_calls, steps }
    }

    /// One last call with no tools offered; falls back to `fallback` if the
    /// model still asks for tools or fails.
    async fn answer_without_tools(&self, mut messages: Vec<ChatMessage>, fallback: String) -> String {
        messages.push(ChatMessage::system(
            "The tool call budget for this turn is exhausted. Answer with the information gathered so far.",
        ));
        let request = ChatRequest { messages, tools: Vec::new() };
        match self.llm.chat(&request).await {
            Ok(ChatReply::Message(content)) => content,
            Ok(ChatReply::ToolCalls(_)) | Err(_) => fallback,
        }
    }

    async fn dispatch(&self, session: &Session, call: &ToolCall) -> String {
        if call.name == TASK_TOOL && self.delegation_available() {
            return self.delegate(session, &call.arguments).await;
        }
        self.tools.invoke(&call.name, call.arguments.clone(), session).await
    }

    async fn delegate(&self, session: &Session, arguments: &Value) -> String {
        let name = string_argument(arguments, "subagent").unwrap_or_default();
        let Some(description) = string_argument(arguments, "description") else {
            return format!("Tool `{TASK_TOOL}` failed: missing required argument `description`");
        };
        let agent = subagents::find(&self.subagents, name);

        let intent = GuardrailIntent::Delegation { subagent: name, known: agent.is_some() };
        match (self.guardrails.evaluate(&intent), agent) {
            (GuardrailDecision::Allow, Some(agent)) => self.run_subagent(agent, session, description).await,
            (GuardrailDecision::Deny { user_message, .. }, _)
            | (GuardrailDecision::Degrade { user_message, .. }, _) => user_message,
            (GuardrailDecision::Allow, None) => format!("There is no sub-agent named `{name}`."),
        }
    }

    /// Sub-agent loop. Its tool subset never includes `task`, so delegation
    /// is one level deep.
    async fn run_subagent(&self, agent: &SubAgent, session: &Session, description: &str) -> String {
        info!(
            event_name = "agent.subagent.started",
            thread_id = %session.id(),
            subagent = agent.name,
            "sub-agent started"
        );

        let tools = self.tools.subset(agent.tools);
        let record = session.record();
        let context_line = format!(
            "Current Context: product {}, supplier {}, company {}, status {}.",
            record.product_id.as_deref().unwrap_or("<not set>"),
            record.supplier_id.as_deref().unwrap_or("<not set>"),
            record.company_id.as_deref().unwrap_or("<not set>"),
            record.status,
        );
        let mut messages = vec![
            ChatMessage::system(format!("{}\n\n{context_line}", agent.system_prompt)),
            ChatMessage::user(description),
        ];

        for _ in 0..self.settings.max_steps {
            let request = ChatRequest { messages: messages.clone(), tools: tools.definitions() };
            match self.llm.chat(&request).await {
                Ok(ChatReply::Message(content)) => return content,
                Ok(ChatReply::ToolCalls(calls)) => {
                    messages.push(ChatMessage::assistant_tool_calls(calls.clone()));
                    for call in calls {
                        let output = tools.invoke(&call.name, call.arguments, session).await;
                        messages.push(ChatMessage::tool_result(call.id, output));
                    }
                }
                Err(error) => return format!("Sub-agent `{}` failed: {error:#}", agent.name),
            }
        }
        format!("Sub-agent `{}` did not finish within {} steps", agent.name, self.settings.max_steps)
    }

    fn delegation_available(&self) -> bool {
        self.guardrails.delegation_enabled && !self.subagents.is_empty()
    }
}

async fn emit(events: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) {
    if let Some(sender) = events {
        // A dropped receiver only means nobody is listening any more.
        let _ = sender.send(event).await;
    }
}
