//! Persisted conversation turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chat::core::ids::{SessionId, TurnId};

/// Role of a turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

impl TurnRole {
    /// Stable string form for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(value.to_string()),
        }
    }
}

/// One stored message of a session.
///
/// The role stays a plain string: documents written by other producers may
/// carry roles this relay does not understand, and those must still load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Unique document identifier.
    pub id: TurnId,
    /// Session the turn belongs to.
    pub session_id: SessionId,
    /// `user`, `assistant`, or anything another writer stored.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub role: String,
    /// Message text.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub message: String,
    /// Creation time, assigned by the writer.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Build a new turn stamped with a fresh id and the current UTC time.
    #[must_use]
    pub fn new(session_id: SessionId, role: TurnRole, message: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            session_id,
            role: role.as_str().to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Parsed role, or `None` for roles outside the user/assistant set.
    #[must_use]
    pub fn known_role(&self) -> Option<TurnRole> {
        self.role.parse().ok()
    }
}

/// Null and non-string values read back as an empty string.
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_shape() {
        let turn = Turn::new(SessionId::from("s-1"), TurnRole::User, "Hello");
        let value = serde_json::to_value(&turn).unwrap();

        assert_eq!(value["sessionId"], "s-1");
        assert_eq!(value["role"], "user");
        assert_eq!(value["message"], "Hello");
        assert_eq!(value["id"], turn.id.to_string());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_missing_fields_default() {
        let turn: Turn = serde_json::from_value(serde_json::json!({
            "id": TurnId::new(),
            "sessionId": "s-1",
            "timestamp": "2026-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(turn.message, "");
        assert_eq!(turn.known_role(), None);
    }

    #[test]
    fn test_null_and_non_string_fields_read_as_empty() {
        let turn: Turn = serde_json::from_value(serde_json::json!({
            "id": TurnId::new(),
            "sessionId": "s-1",
            "role": null,
            "message": 42,
            "timestamp": "2026-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(turn.role, "");
        assert_eq!(turn.message, "");
        assert_eq!(turn.known_role(), None);
    }

    #[test]
    fn test_unknown_role_is_not_an_error() {
        let mut turn = Turn::new(SessionId::from("s-1"), TurnRole::Assistant, "x");
        assert_eq!(turn.known_role(), Some(TurnRole::Assistant));

        turn.role = "system".to_string();
        assert_eq!(turn.known_role(), None);
        assert_eq!("tool".parse::<TurnRole>(), Err("tool".to_string()));
    }
}
