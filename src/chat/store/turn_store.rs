//! Turn store abstraction and its `SQLite` document container.

use std::future::Future;
use std::pin::Pin;

use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use crate::chat::core::config::StoreConfig;
use crate::chat::core::errors::{ChatError, ChatResult};
use crate::chat::core::ids::SessionId;
use crate::chat::turn::Turn;

/// Boxed future type for turn store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Document store holding conversation turns.
pub trait TurnStore: Send + Sync {
    /// Load every turn of a session, in store delivery order.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn query_session(&self, session_id: SessionId) -> StoreFuture<'_, ChatResult<Vec<Turn>>>;
    /// Insert a single turn.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn insert(&self, turn: Turn) -> StoreFuture<'_, ChatResult<()>>;
}

/// `SQLite` implementation of the document container.
///
/// Each turn is stored as its JSON document next to an indexed `session_id`
/// column. Reads carry no ordering clause; callers must not assume
/// chronological delivery.
pub struct SqliteTurnStore {
    conn: Connection,
    table: String,
}

impl SqliteTurnStore {
    /// Open (or create) the container described by `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the table created.
    pub async fn new(config: &StoreConfig) -> ChatResult<Self> {
        let conn = Connection::open(config.sqlite_path()).await?;
        let table = config.container.clone();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    document TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table_name}_session
                    ON {table_name} (session_id);"
            ))?;
            Ok(())
        })
        .await?;

        debug!(table = %table, path = %config.sqlite_path().display(), "opened turn container");
        Ok(Self { conn, table })
    }
}

impl TurnStore for SqliteTurnStore {
    fn query_session(&self, session_id: SessionId) -> StoreFuture<'_, ChatResult<Vec<Turn>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let session = session_id.to_string();
            let documents = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT document FROM {table} WHERE session_id = ?1"
                    ))?;
                    let rows = stmt
                        .query_map(rusqlite::params![session], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;

            let mut turns = Vec::with_capacity(documents.len());
            for document in documents {
                match serde_json::from_str::<Turn>(&document) {
                    Ok(turn) => turns.push(turn),
                    Err(err) => {
                        warn!(session_id = %session_id, error = %err, "skipping unreadable turn document");
                    }
                }
            }
            Ok(turns)
        })
    }

    fn insert(&self, turn: Turn) -> StoreFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let id = turn.id.to_string();
            let session = turn.session_id.to_string();
            let document = serde_json::to_string(&turn)?;

            let inserted = self
                .conn
                .call(move |conn| {
                    let count = conn.execute(
                        &format!(
                            "INSERT INTO {table} (id, session_id, document) VALUES (?1, ?2, ?3)"
                        ),
                        rusqlite::params![id, session, document],
                    )?;
                    Ok(count)
                })
                .await?;

            if inserted != 1 {
                return Err(ChatError::Store(format!(
                    "expected to insert one document, inserted {inserted}"
                )));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::completion::{ChatMessage, CompletionSettings};
    use crate::chat::core::ids::TurnId;
    use crate::chat::orchestrator::Conversation;
    use crate::chat::testing::ScriptedCompletion;
    use crate::chat::turn::TurnRole;

    fn config_in(dir: &tempfile::TempDir) -> StoreConfig {
        StoreConfig {
            endpoint: dir.path().to_path_buf(),
            ..StoreConfig::default()
        }
    }

    #[tokio::test]
    async fn test_insert_then_query_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTurnStore::new(&config_in(&dir)).await.unwrap();
        let session = SessionId::from("s-1");

        let user = Turn::new(session.clone(), TurnRole::User, "Bonjour");
        let assistant = Turn::new(session.clone(), TurnRole::Assistant, "Salut");
        store.insert(user.clone()).await.unwrap();
        store.insert(assistant.clone()).await.unwrap();
        store
            .insert(Turn::new(SessionId::from("s-2"), TurnRole::User, "other"))
            .await
            .unwrap();

        let mut turns = store.query_session(session).await.unwrap();
        turns.sort_by_key(|turn| turn.timestamp);
        assert_eq!(turns, vec![user, assistant]);
    }

    #[tokio::test]
    async fn test_unknown_session_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTurnStore::new(&config_in(&dir)).await.unwrap();

        let turns = store.query_session(SessionId::from("missing")).await.unwrap();
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn test_reopen_keeps_documents() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let session = SessionId::from("s-1");

        {
            let store = SqliteTurnStore::new(&config).await.unwrap();
            store
                .insert(Turn::new(session.clone(), TurnRole::User, "persisted"))
                .await
                .unwrap();
        }

        let store = SqliteTurnStore::new(&config).await.unwrap();
        let turns = store.query_session(session).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].message, "persisted");
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTurnStore::new(&config_in(&dir)).await.unwrap();
        let turn = Turn::new(SessionId::from("s-1"), TurnRole::User, "once");

        store.insert(turn.clone()).await.unwrap();
        assert!(store.insert(turn).await.is_err());
    }

    async fn insert_raw(store: &SqliteTurnStore, id: &str, session: &str, document: &str) {
        let table = store.table.clone();
        let (id, session, document) = (id.to_string(), session.to_string(), document.to_string());
        store
            .conn
            .call(move |conn| {
                conn.execute(
                    &format!("INSERT INTO {table} (id, session_id, document) VALUES (?1, ?2, ?3)"),
                    rusqlite::params![id, session, document],
                )?;
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_foreign_documents_do_not_fail_the_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTurnStore::new(&config_in(&dir)).await.unwrap();
        let valid_id = TurnId::new().to_string();

        insert_raw(
            &store,
            &valid_id,
            "s",
            &format!(
                r#"{{"id":"{valid_id}","sessionId":"s","role":null,"message":"x","timestamp":"2026-01-01T00:00:00Z"}}"#
            ),
        )
        .await;
        insert_raw(&store, "not-a-uuid", "s", r#"{"id":"not-a-uuid","sessionId":"s","role":"user"}"#).await;
        insert_raw(&store, "garbage", "s", "{not json").await;
        store
            .insert(Turn::new(SessionId::from("s"), TurnRole::User, "kept"))
            .await
            .unwrap();

        let turns = store.query_session(SessionId::from("s")).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert!(turns.iter().any(|turn| turn.role.is_empty() && turn.message == "x"));
        assert!(turns.iter().any(|turn| turn.message == "kept"));
    }

    #[tokio::test]
    async fn test_null_role_document_still_answers() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTurnStore::new(&config_in(&dir)).await.unwrap();
        let id = TurnId::new().to_string();
        insert_raw(
            &store,
            &id,
            "s",
            &format!(
                r#"{{"id":"{id}","sessionId":"s","role":null,"message":"ignored","timestamp":"2026-01-01T00:00:00Z"}}"#
            ),
        )
        .await;

        let completion = Arc::new(ScriptedCompletion::replying(&["fine"]));
        let chat = Conversation::new(
            Arc::new(store),
            completion.clone(),
            CompletionSettings::default(),
        );

        let answer = chat.respond(&SessionId::from("s"), "hi").await.unwrap();
        assert_eq!(answer, "fine");
        assert_eq!(completion.calls()[0].0, vec![ChatMessage::user("hi")]);
    }

    #[tokio::test]
    async fn test_missing_endpoint_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            endpoint: dir.path().join("does/not/exist"),
            ..StoreConfig::default()
        };

        assert!(SqliteTurnStore::new(&config).await.is_err());
    }
}
