//! Caller-owned evaluation sessions and supersession.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mitra_core::{EvalError, EvaluationRequest};
use mitra_render::{DocumentNode, IncrementalRenderer};
use tracing::{debug, info};
use uuid::Uuid;

use crate::EvaluationClient;

/// Unique identifier of one evaluation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    Streaming,
    Completed,
    Failed,
}

/// One in-flight or finished evaluation and its accumulated text.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    request: EvaluationRequest,
    text: String,
    status: SessionStatus,
    last_error: Option<String>,
    renderer: IncrementalRenderer,
}

impl Session {
    fn new(request: EvaluationRequest) -> Self {
        Self {
            id: SessionId::new(),
            request,
            text: String::new(),
            status: SessionStatus::Pending,
            last_error: None,
            renderer: IncrementalRenderer::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn request(&self) -> &EvaluationRequest {
        &self.request
    }

    /// Concatenation of every chunk applied so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Present only when the session failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, SessionStatus::Completed | SessionStatus::Failed)
    }

    /// Rendered document for the accumulated text.
    pub fn document(&self) -> Vec<DocumentNode> {
        self.renderer.document()
    }

    fn append(&mut self, chunk: &str) {
        if self.status == SessionStatus::Pending {
            self.status = SessionStatus::Streaming;
        }
        self.text.push_str(chunk);
        self.renderer.push(chunk);
    }
}

/// Holds the single active session; starting a new one supersedes the old.
///
/// Every update carries the [`SessionId`] it belongs to and is dropped when
/// that id is no longer current, so a superseded stream can never write into
/// the new session's text.
#[derive(Debug, Default)]
pub struct SessionSlot {
    current: Option<Session>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, request: EvaluationRequest) -> SessionId {
        let session = Session::new(request);
        let id = session.id;
        if let Some(previous) = self.current.replace(session) {
            if !previous.is_finished() {
                info!("Session {} superseded by {}", previous.id, id);
            }
        }
        id
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.current.as_ref().is_some_and(|s| s.id == id)
    }

    fn active_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.current
            .as_mut()
            .filter(|s| s.id == id && !s.is_finished())
    }

    /// Appends a chunk. Returns false if `id` is stale or already finished.
    pub fn apply_chunk(&mut self, id: SessionId, chunk: &str) -> bool {
        let Some(session) = self.active_mut(id) else {
            debug!("Dropping {} byte chunk for inactive session {}", chunk.len(), id);
            return false;
        };
        session.append(chunk);
        true
    }

    /// Marks the session failed. Returns false if `id` is stale or already finished.
    pub fn fail(&mut self, id: SessionId, error: &EvalError) -> bool {
        let Some(session) = self.active_mut(id) else {
            return false;
        };
        session.status = SessionStatus::Failed;
        session.last_error = Some(error.to_string());
        true
    }

    /// Marks the session completed. A failed session stays failed.
    pub fn finish(&mut self, id: SessionId) -> bool {
        let Some(session) = self.active_mut(id) else {
            return false;
        };
        session.status = SessionStatus::Completed;
        true
    }
}

fn lock(slot: &Mutex<SessionSlot>) -> MutexGuard<'_, SessionSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EvaluationClient {
    /// Runs an evaluation into a shared slot, superseding whatever session it held.
    ///
    /// `repaint` is called synchronously after every applied chunk and once
    /// more when the session ends, while this session is still current.
    pub async fn run_session<U>(
        &self,
        slot: &Mutex<SessionSlot>,
        request: EvaluationRequest,
        mut repaint: U,
    ) -> SessionId
    where
        U: FnMut(&Session),
    {
        let id = lock(slot).begin(request.clone());

        self.run(
            &request,
            |chunk| {
                let mut guard = lock(slot);
                if guard.apply_chunk(id, chunk) {
                    if let Some(session) = guard.current() {
                        repaint(session);
                    }
                }
            },
            |err| {
                lock(slot).fail(id, &err);
            },
            || {
                lock(slot).finish(id);
            },
        )
        .await;

        let guard = lock(slot);
        if let Some(session) = guard.current().filter(|s| s.id == id) {
            repaint(session);
        }
        id
    }
}
