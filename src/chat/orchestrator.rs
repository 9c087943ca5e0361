//! Conversation orchestration: history assembly, turn persistence and the
//! completion call.
//!
//! Every request runs the same straight-line sequence: read the session's
//! turns, persist the new user turn, complete, persist the reply. Nothing is
//! retried or rolled back; a failed completion leaves the user turn behind
//! without a matching reply.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::chat::completion::{ChatMessage, CompletionBackend, CompletionSettings};
use crate::chat::core::errors::ChatResult;
use crate::chat::core::ids::SessionId;
use crate::chat::store::TurnStore;
use crate::chat::turn::{Turn, TurnRole};

/// Reply used when the completion service returns no candidate.
pub const NO_RESPONSE: &str = "No response generated.";

/// Session-scoped chat over a turn store and a completion backend.
pub struct Conversation {
    store: Arc<dyn TurnStore>,
    completion: Arc<dyn CompletionBackend>,
    settings: CompletionSettings,
}

impl Conversation {
    /// Create a conversation orchestrator.
    #[must_use]
    pub fn new(
        store: Arc<dyn TurnStore>,
        completion: Arc<dyn CompletionBackend>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            store,
            completion,
            settings,
        }
    }

    /// Answer `user_message` in the context of `session_id`.
    ///
    /// # Errors
    /// Returns the store or completion error that aborted the sequence,
    /// after logging it.
    pub async fn respond(&self, session_id: &SessionId, user_message: &str) -> ChatResult<String> {
        match self.run(session_id, user_message).await {
            Ok(answer) => Ok(answer),
            Err(err) => {
                error!(session_id = %session_id, error = %err, "failed to process chat request");
                Err(err)
            }
        }
    }

    /// Insert one turn with a fresh id and the current UTC time.
    ///
    /// # Errors
    /// Returns an error if the store insert fails.
    pub async fn persist(
        &self,
        session_id: &SessionId,
        message: &str,
        role: TurnRole,
    ) -> ChatResult<()> {
        self.store
            .insert(Turn::new(session_id.clone(), role, message))
            .await
    }

    async fn run(&self, session_id: &SessionId, user_message: &str) -> ChatResult<String> {
        let turns = self.store.query_session(session_id.clone()).await?;
        debug!(session_id = %session_id, turns = turns.len(), "loaded session history");

        let mut history = build_history(turns);
        history.push(ChatMessage::user(user_message));
        self.persist(session_id, user_message, TurnRole::User).await?;

        let candidates = self.completion.complete(&history, self.settings).await?;
        let answer = first_candidate(candidates);

        self.persist(session_id, &answer, TurnRole::Assistant).await?;
        info!(session_id = %session_id, history = history.len(), "answered chat request");

        Ok(answer)
    }
}

/// Rebuild the model history from stored turns, in store delivery order.
///
/// Roles outside user/assistant are skipped.
#[must_use]
pub fn build_history(turns: Vec<Turn>) -> Vec<ChatMessage> {
    turns
        .into_iter()
        .filter_map(|turn| match turn.known_role() {
            Some(TurnRole::User) => Some(ChatMessage::user(turn.message)),
            Some(TurnRole::Assistant) => Some(ChatMessage::assistant(turn.message)),
            None => None,
        })
        .collect()
}

fn first_candidate(candidates: Vec<String>) -> String {
    candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| NO_RESPONSE.to_string())
}
