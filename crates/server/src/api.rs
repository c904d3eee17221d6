//! Agent HTTP API.
//!
//! - `GET    /`                          - liveness banner
//! - `POST   /agent/query`               - run one agent turn, JSON reply
//! - `POST   /agent/stream`              - run one agent turn, server-sent events
//! - `GET    /agent/session/{threadId}`  - conversation record for a thread
//! - `DELETE /agent/session/{threadId}`  - end a conversation

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use procura_agent::AgentRuntime;
use procura_core::{
    ConversationRecord, ConversationStatus, InterfaceError, RequestContext, Session, SessionId,
    SessionRegistry,
};
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionRegistry>,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: Option<String>,
    pub thread_id: Option<String>,
    pub product_id: Option<String>,
    pub supplier_id: Option<String>,
    pub company_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    pub message: String,
    pub thread_id: String,
    pub status: ConversationStatus,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub thread_id: String,
    #[serde(flatten)]
    pub record: ConversationRecord,
    /// Display hint; a terminal conversation still accepts status updates.
    pub terminal: bool,
    pub turn_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub success: bool,
    pub error: String,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ApiErrorBody>);

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/agent/query", post(query))
        .route("/agent/stream", post(stream))
        .route("/agent/session/{thread_id}", get(session_record).delete(close_session))
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Procurement Deep Agent API is running!" }))
}

async fn query(
    State(state): State<ApiState>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let correlation_id = correlation_id();
    let (session, query) = open_session(&state.sessions, body, &correlation_id)?;

    info!(
        event_name = "server.agent.query_received",
        correlation_id = %correlation_id,
        thread_id = %session.id(),
        "agent query received"
    );

    let reply = state
        .runtime
        .handle_query(&session, &query)
        .await
        .map_err(|error| error_response(error.into_interface(correlation_id.as_str())))?;

    Ok(Json(QueryResponse {
        success: true,
        message: reply.message,
        thread_id: session.id().to_string(),
        status: reply.status.status,
        note: reply.status.note,
    }))
}

async fn stream(
    State(state): State<ApiState>,
    Json(body): Json<QueryRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let correlation_id = correlation_id();
    let (session, query) = open_session(&state.sessions, body, &correlation_id)?;

    info!(
        event_name = "server.agent.stream_opened",
        correlation_id = %correlation_id,
        thread_id = %session.id(),
        "agent stream opened"
    );

    let events = Arc::clone(&state.runtime).stream_query(session, query);
    let stream = ReceiverStream::new(events).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().event(event.name()).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping")))
}

async fn session_record(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let Some(session) = state.sessions.get(&SessionId(thread_id.clone())) else {
        return Err(not_found(&thread_id));
    };

    let record = session.record();
    Ok(Json(SessionView {
        thread_id,
        terminal: record.status.is_terminal(),
        record,
        turn_count: session.turns().len(),
    }))
}

async fn close_session(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.close(&SessionId(thread_id.clone())) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&thread_id))
    }
}

/// Validates the request body and returns the session it addresses. A new
/// thread needs all three ids; an existing one may rebind any subset.
fn open_session(
    sessions: &SessionRegistry,
    body: QueryRequest,
    correlation_id: &str,
) -> Result<(Arc<Session>, String), ApiError> {
    let (Some(query), Some(thread_id)) = (present(body.query), present(body.thread_id)) else {
        return Err(bad_request("query and threadId are required", correlation_id));
    };

    let context = RequestContext {
        product_id: present(body.product_id),
        supplier_id: present(body.supplier_id),
        company_id: present(body.company_id),
    };
    let id = SessionId(thread_id);
    if sessions.get(&id).is_none() && !context.is_complete() {
        return Err(bad_request(
            "productId, supplierId, and companyId are required to start a conversation",
            correlation_id,
        ));
    }

    Ok((sessions.open(id, context), query))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn bad_request(message: &str, correlation_id: &str) -> ApiError {
    error_response(InterfaceError::BadRequest {
        message: message.to_string(),
        correlation_id: correlation_id.to_string(),
    })
}

fn not_found(thread_id: &str) -> ApiError {
    error_response(InterfaceError::NotFound {
        message: format!("no conversation for threadId `{thread_id}`"),
        correlation_id: correlation_id(),
    })
}

fn error_response(error: InterfaceError) -> ApiError {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &error {
        InterfaceError::BadRequest { message, .. } | InterfaceError::NotFound { message, .. } => {
            message.clone()
        }
        InterfaceError::ServiceUnavailable { .. } | InterfaceError::Internal { .. } => {
            error.user_message().to_string()
        }
    };

    if status.is_server_error() {
        warn!(
            event_name = "server.agent.request_failed",
            correlation_id = %error.correlation_id(),
            error = %error,
            "agent request failed"
        );
    }

    (
        status,
        Json(ApiErrorBody {
            success: false,
            error: message,
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use procura_agent::llm::{ChatReply, ChatRequest, LlmClient, ToolCall};
    use procura_agent::{AgentRuntime, AgentSettings, ToolRegistry};
    use procura_core::{Catalogs, SessionRegistry};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, ApiState};

    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<ChatReply>>>,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat(&self, _request: &ChatRequest) -> Result<ChatReply> {
            self.replies
                .lock()
                .expect("replies lock")
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("model endpoint unreachable")))
        }
    }

    fn app(replies: Vec<Result<ChatReply>>) -> (Router, Arc<SessionRegistry>) {
        let llm = Arc::new(ScriptedLlm { replies: Mutex::new(replies.into()) });
        let runtime = AgentRuntime::new(
            llm,
            ToolRegistry::procurement(&Catalogs::seeded()),
            AgentSettings::default(),
        )
        .expect("runtime");
        let sessions = Arc::new(SessionRegistry::new());
        let state = ApiState { sessions: Arc::clone(&sessions), runtime: Arc::new(runtime) };
        (router(state), sessions)
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn full_body(query: &str) -> Value {
        json!({
            "query": query,
            "threadId": "thread-42",
            "productId": "PROD-001",
            "supplierId": "CCSI-910-S",
            "companyId": "COMP-001"
        })
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn root_reports_running() {
        let (app, _) = app(Vec::new());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Procurement Deep Agent API is running!" })
        );
    }

    #[tokio::test]
    async fn query_runs_agent_and_returns_status() {
        let (app, sessions) = app(vec![
            Ok(ChatReply::ToolCalls(vec![ToolCall {
                id: "call-1".to_string(),
                name: "update_conversation_status".to_string(),
                arguments: json!({
                    "status": "QUOTATION_REQUEST_SUBMITTED",
                    "note": "asked for quote"
                }),
            }])),
            Ok(ChatReply::Message("I submitted the quotation request.".to_string())),
        ]);

        let response =
            app.oneshot(post("/agent/query", full_body("Request a quote"))).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "I submitted the quotation request.");
        assert_eq!(body["threadId"], "thread-42");
        assert_eq!(body["status"], "QUOTATION_REQUEST_SUBMITTED");
        assert_eq!(body["note"], "asked for quote");
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn session_view_flags_terminal_status() {
        let (app, _) = app(vec![
            Ok(ChatReply::ToolCalls(vec![ToolCall {
                id: "call-1".to_string(),
                name: "update_conversation_status".to_string(),
                arguments: json!({ "status": "FINAL_AGREEMENT_READY" }),
            }])),
            Ok(ChatReply::Message("Agreement reached.".to_string())),
        ]);

        let response =
            app.clone().oneshot(post("/agent/query", full_body("close it"))).await.expect("query");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/agent/session/thread-42").body(Body::empty()).expect("get"))
            .await
            .expect("get");
        let body = json_body(response).await;
        assert_eq!(body["status"], "FINAL_AGREEMENT_READY");
        assert_eq!(body["terminal"], true);
    }

    #[tokio::test]
    async fn invalid_status_literal_leaves_status_unchanged() {
        let (app, _) = app(vec![
            Ok(ChatReply::ToolCalls(vec![ToolCall {
                id: "call-1".to_string(),
                name: "update_conversation_status".to_string(),
                arguments: json!({ "status": "INITIAL_OFFER", "note": "asked for quote" }),
            }])),
            Ok(ChatReply::Message("That status is not available.".to_string())),
        ]);

        let response =
            app.oneshot(post("/agent/query", full_body("Request a quote"))).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "INITIAL_RESEARCH");
        assert_eq!(body["note"], Value::Null);
    }

    #[tokio::test]
    async fn query_without_thread_id_is_bad_request() {
        let (app, _) = app(Vec::new());

        let response = app
            .oneshot(post("/agent/query", json!({ "query": "hello" })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "query and threadId are required");
    }

    #[tokio::test]
    async fn new_thread_without_all_ids_is_bad_request() {
        let (app, sessions) = app(Vec::new());

        let response = app
            .oneshot(post(
                "/agent/query",
                json!({ "query": "hello", "threadId": "t-1", "productId": "PROD-001" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn model_failure_is_service_unavailable() {
        let (app, _) = app(Vec::new());

        let response = app.oneshot(post("/agent/query", full_body("hello"))).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert!(body["correlationId"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn session_can_be_read_and_closed() {
        let (app, _) = app(vec![Ok(ChatReply::Message("hi".to_string()))]);

        let response =
            app.clone().oneshot(post("/agent/query", full_body("hello"))).await.expect("query");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/agent/session/thread-42").body(Body::empty()).expect("get"))
            .await
            .expect("get");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["threadId"], "thread-42");
        assert_eq!(body["supplierId"], "CCSI-910-S");
        assert_eq!(body["status"], "INITIAL_RESEARCH");
        assert_eq!(body["terminal"], false);
        assert_eq!(body["turnCount"], 2);

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri("/agent/session/thread-42")
                .body(Body::empty())
                .expect("delete")
        };
        let response = app.clone().oneshot(delete()).await.expect("delete");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(delete()).await.expect("delete again");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (app, _) = app(Vec::new());

        let response = app
            .oneshot(Request::builder().uri("/agent/session/missing").body(Body::empty()).expect("get"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stream_emits_agent_events() {
        let (app, _) = app(vec![
            Ok(ChatReply::ToolCalls(vec![ToolCall {
                id: "call-1".to_string(),
                name: "get_supplier_info".to_string(),
                arguments: json!({}),
            }])),
            Ok(ChatReply::Message("Supplier is ISO 9001 certified.".to_string())),
        ]);

        let response =
            app.oneshot(post("/agent/stream", full_body("Who is the supplier?"))).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        let tool_call = text.find("event: tool_call").expect("tool_call event");
        let message = text.find("event: message").expect("message event");
        let done = text.find("event: done").expect("done event");
        assert!(tool_call < message && message < done);
        assert!(text.contains("Supplier is ISO 9001 certified."));
    }
}
