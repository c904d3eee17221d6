//! Session-keyed conversation state.
//!
//! Sessions live for the life of the process. There is no expiry or size cap;
//! callers end a conversation explicitly with [`SessionRegistry::close`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::conversation::{ConversationRecord, RequestContext};
use crate::tracker::ConversationStatusTracker;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: TurnRole,
    pub content: String,
    pub recorded_at: DateTime<Utc>,
}

/// One conversation: its bound context, status tracker and chat transcript.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    context: RwLock<RequestContext>,
    tracker: ConversationStatusTracker,
    transcript: Mutex<Vec<TranscriptTurn>>,
}

impl Session {
    pub fn new(id: SessionId, context: RequestContext) -> Self {
        Self {
            id,
            context: RwLock::new(context),
            tracker: ConversationStatusTracker::new(),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Copy of the context for one invocation.
    pub fn context(&self) -> RequestContext {
        self.context.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn tracker(&self) -> &ConversationStatusTracker {
        &self.tracker
    }

    pub fn record(&self) -> ConversationRecord {
        let context = self.context();
        let state = self.tracker.state();
        ConversationRecord {
            product_id: context.product_id,
            supplier_id: context.supplier_id,
            company_id: context.company_id,
            status: state.status,
            note: state.note,
        }
    }

    pub fn push_turn(&self, role: TurnRole, content: impl Into<String>) {
        let turn = TranscriptTurn { role, content: content.into(), recorded_at: Utc::now() };
        self.transcript.lock().unwrap_or_else(|p| p.into_inner()).push(turn);
    }

    pub fn turns(&self) -> Vec<TranscriptTurn> {
        self.transcript.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn rebind(&self, update: &RequestContext) {
        let mut context = self.context.write().unwrap_or_else(|p| p.into_inner());
        *context = context.merged_with(update);
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `id`, creating it when absent. An existing
    /// session keeps its tracker and transcript; ids present in `context`
    /// replace the bound ones.
    pub fn open(&self, id: SessionId, context: RequestContext) -> Arc<Session> {
        if let Some(session) = self.get(&id) {
            if !context.is_empty() {
                session.rebind(&context);
            }
            return session;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(|p| p.into_inner());
        let session = sessions
            .entry(id.clone())
            .or_insert_with(|| {
                info!(
                    event_name = "core.session.opened",
                    thread_id = %id,
                    "conversation session opened"
                );
                Arc::new(Session::new(id.clone(), context.clone()))
            })
            .clone();
        drop(sessions);

        // Another opener may have inserted first; its session wins and takes our ids.
        if session.context() != context && !context.is_empty() {
            session.rebind(&context);
        }
        session
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.read().unwrap_or_else(|p| p.into_inner()).get(id).cloned()
    }

    pub fn close(&self, id: &SessionId) -> bool {
        let removed =
            self.sessions.write().unwrap_or_else(|p| p.into_inner()).remove(id).is_some();
        if removed {
            info!(event_name = "core.session.closed", thread_id = %id, "conversation session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> =
            self.sessions.read().unwrap_or_else(|p| p.into_inner()).keys().cloned().collect();
        ids.sort_by(|left, right| left.0.cmp(&right.0));
        ids
    }
}
