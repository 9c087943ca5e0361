//! Test doubles for the store and completion seams.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::chat::completion::{
    ChatMessage, CompletionBackend, CompletionFuture, CompletionSettings,
};
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::SessionId;
use crate::chat::store::{InMemoryTurnStore, StoreFuture, TurnStore};
use crate::chat::turn::Turn;

type RecordedCall = (Vec<ChatMessage>, CompletionSettings);

/// Completion backend answering every call with the same candidates.
pub struct ScriptedCompletion {
    candidates: Option<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn replying(candidates: &[&str]) -> Self {
        Self {
            candidates: Some(candidates.iter().map(ToString::to_string).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            candidates: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl CompletionBackend for ScriptedCompletion {
    fn complete<'a>(
        &'a self,
        history: &'a [ChatMessage],
        settings: CompletionSettings,
    ) -> CompletionFuture<'a, ChatResult<Vec<String>>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((history.to_vec(), settings));
            self.candidates.clone().ok_or_else(|| ChatError::CompletionStatus {
                status: 503,
                body: "model unavailable".to_string(),
            })
        })
    }
}

/// In-memory store whose n-th insert (1-based) fails.
pub struct FailingInsertStore {
    pub inner: InMemoryTurnStore,
    fail_on: usize,
    inserts: AtomicUsize,
}

impl FailingInsertStore {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: InMemoryTurnStore::new(),
            fail_on,
            inserts: AtomicUsize::new(0),
        }
    }
}

impl TurnStore for FailingInsertStore {
    fn query_session(&self, session_id: SessionId) -> StoreFuture<'_, ChatResult<Vec<Turn>>> {
        self.inner.query_session(session_id)
    }

    fn insert(&self, turn: Turn) -> StoreFuture<'_, ChatResult<()>> {
        let attempt = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Box::pin(async { Err(ChatError::Store("insert rejected".to_string())) });
        }
        self.inner.insert(turn)
    }
}

/// In-memory store whose session reads always fail.
#[derive(Default)]
pub struct FailingQueryStore {
    pub inner: InMemoryTurnStore,
}

impl TurnStore for FailingQueryStore {
    fn query_session(&self, _session_id: SessionId) -> StoreFuture<'_, ChatResult<Vec<Turn>>> {
        Box::pin(async { Err(ChatError::Store("query rejected".to_string())) })
    }

    fn insert(&self, turn: Turn) -> StoreFuture<'_, ChatResult<()>> {
        self.inner.insert(turn)
    }
}
