//! Conversation sessions and the request-level research service.
//!
//! [`SessionStore`] is the persistence seam for conversation history;
//! [`MemorySessionStore`] keeps sessions in process. [`ResearchService`]
//! ties a store to a [`ResearchPipeline`] and a [`ModeRouter`]: it loads the
//! caller's history, runs the routed pipeline and records the exchange.
//!
//! # Examples
//!
//! ```
//! use sift::session::MemorySessionStore;
//!
//! let store = MemorySessionStore::new();
//! assert!(format!("{store:?}").contains("MemorySessionStore"));
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::error::{Result, SiftError};
use crate::mode::{ModeRequest, ModeRouter, ResearchMode};
use crate::pipeline::ResearchPipeline;
use crate::types::{PipelineOutcome, Query, Turn};

/// Turns kept per session; older turns are dropped first.
pub const MAX_STORED_TURNS: usize = 50;

/// Titles listed in an assistant summary turn.
const SUMMARY_TITLES: usize = 3;

/// One user's conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// An empty session with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn, dropping the oldest turns beyond [`MAX_STORED_TURNS`].
    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
        if self.history.len() > MAX_STORED_TURNS {
            let excess = self.history.len() - MAX_STORED_TURNS;
            self.history.drain(..excess);
        }
        self.updated_at = Utc::now();
    }

    /// The last `window` turns.
    pub fn recent(&self, window: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }
}

/// Async session storage backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session. `Ok(None)` if it does not exist.
    async fn get(&self, id: &str) -> Result<Option<Session>>;

    /// Save (overwrite) a session under its id.
    async fn put(&self, session: Session) -> Result<()>;

    /// Delete a session. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// In-memory session store.
///
/// The map lock is held only to find or insert a slot; each session sits
/// behind its own mutex so writers to different sessions never contend.
/// Cheaply cloneable; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>> {
        let slot = self.sessions.read().await.get(id).cloned();
        match slot {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, session: Session) -> Result<()> {
        let slot = {
            let mut sessions = self.sessions.write().await;
            match sessions.entry(session.id.clone()) {
                Entry::Occupied(slot) => Arc::clone(slot.get()),
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Mutex::new(session)));
                    return Ok(());
                }
            }
        };
        *slot.lock().await = session;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }
}

/// Result of one [`ResearchService::research`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReply {
    pub session_id: String,
    pub mode: ResearchMode,
    pub outcome: PipelineOutcome,
}

/// Request-level entry point: session history in, routed pipeline run,
/// exchange recorded.
pub struct ResearchService {
    pipeline: Arc<ResearchPipeline>,
    router: ModeRouter,
    store: Arc<dyn SessionStore>,
    history_window: usize,
    // One request at a time per session, so turns are never lost. An entry
    // lives only while a turn for that session is running or queued.
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for ResearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchService")
            .field("pipeline", &self.pipeline)
            .field("router", &self.router)
            .field("history_window", &self.history_window)
            .finish_non_exhaustive()
    }
}

impl ResearchService {
    pub fn new(
        pipeline: Arc<ResearchPipeline>,
        router: ModeRouter,
        store: Arc<dyn SessionStore>,
        history_window: usize,
    ) -> Self {
        Self {
            pipeline,
            router,
            store,
            history_window,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Answer-ready evidence for `question` within session `session_id`.
    ///
    /// A missing id starts a new session with a generated one. The user
    /// turn and an assistant summary of the evidence are appended to the
    /// session after the pipeline runs.
    ///
    /// # Errors
    ///
    /// [`SiftError::Session`] for a blank question or a failing store.
    pub async fn research(
        &self,
        session_id: Option<&str>,
        question: &str,
        request: ModeRequest,
    ) -> Result<ResearchReply> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SiftError::Session("question must not be empty".into()));
        }

        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let lock = self.turn_lock(&id).await;
        let reply = {
            let _guard = lock.lock().await;
            self.run_turn(id.clone(), question, request).await
        };
        self.release_turn_lock(&id, lock).await;
        reply
    }

    async fn run_turn(&self, id: String, question: &str, request: ModeRequest) -> Result<ResearchReply> {
        let mut session = self
            .store
            .get(&id)
            .await?
            .unwrap_or_else(|| Session::new(id.clone()));

        let query = Query::new(question).with_history(session.recent(self.history_window).to_vec());

        let mode = self.router.resolve(request, &query).await;
        tracing::info!(session = %id, %mode, "research request");

        let outcome = match mode {
            ResearchMode::Simple => self.pipeline.process_simple(&query).await?,
            ResearchMode::Pro => self.pipeline.process(&query).await?,
        };

        session.push(Turn::user(question));
        session.push(Turn::assistant(summarize(&outcome)));
        self.store.put(session).await?;

        Ok(ResearchReply {
            session_id: id,
            mode,
            outcome,
        })
    }

    /// Forget a session and its history.
    pub async fn end_session(&self, id: &str) -> Result<bool> {
        self.turn_locks.lock().await.remove(id);
        self.store.delete(id).await
    }

    async fn turn_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    /// Drop the map entry for `id` unless another turn already holds a
    /// clone of `lock`. Clones are only taken under the map lock, so the
    /// count cannot grow while it is being checked.
    async fn release_turn_lock(&self, id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.turn_locks.lock().await;
        let unshared = Arc::strong_count(&lock) <= 2;
        if unshared && locks.get(id).is_some_and(|held| Arc::ptr_eq(held, &lock)) {
            locks.remove(id);
        }
    }
}

/// Short assistant turn describing what a run found.
fn summarize(outcome: &PipelineOutcome) -> String {
    match outcome {
        PipelineOutcome::NoInformation(_) => "No relevant information found.".to_string(),
        PipelineOutcome::Evidence(set) => {
            let titles: Vec<&str> = set
                .display
                .iter()
                .take(SUMMARY_TITLES)
                .map(|c| c.title.as_str())
                .collect();
            format!("Found {} sources: {}", set.selection.len(), titles.join("; "))
        }
    }
}
