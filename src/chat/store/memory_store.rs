//! Process-local turn store.

use tokio::sync::RwLock;

use crate::chat::core::errors::ChatResult;
use crate::chat::core::ids::SessionId;
use crate::chat::store::turn_store::{StoreFuture, TurnStore};
use crate::chat::turn::Turn;

/// In-memory document container, delivering turns in insertion order.
#[derive(Default)]
pub struct InMemoryTurnStore {
    turns: RwLock<Vec<Turn>>,
}

impl InMemoryTurnStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with documents.
    #[must_use]
    pub fn with_turns(turns: Vec<Turn>) -> Self {
        Self {
            turns: RwLock::new(turns),
        }
    }

    /// Snapshot every stored turn, across all sessions.
    pub async fn all(&self) -> Vec<Turn> {
        self.turns.read().await.clone()
    }
}

impl TurnStore for InMemoryTurnStore {
    fn query_session(&self, session_id: SessionId) -> StoreFuture<'_, ChatResult<Vec<Turn>>> {
        Box::pin(async move {
            let turns = self.turns.read().await;
            Ok(turns
                .iter()
                .filter(|turn| turn.session_id == session_id)
                .cloned()
                .collect())
        })
    }

    fn insert(&self, turn: Turn) -> StoreFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            self.turns.write().await.push(turn);
            Ok(())
        })
    }
}
