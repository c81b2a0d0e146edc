//! Uniform response wrapper for tool actions.

use crate::error::DbResult;
use serde::Serialize;
use tracing::error;

/// Either an action's success payload or `{"error": message}`, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Success(T),
    Failure { error: String },
}

impl<T> Envelope<T> {
    /// Wrap a handler result, logging failures against the action name.
    pub fn from_result(action: &str, result: DbResult<T>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(e) => {
                error!(action, error = %e, "Tool action failed");
                Self::failure(e.to_string())
            }
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Payload {
        affected_rows: u64,
    }

    #[test]
    fn test_success_serializes_payload_only() {
        let envelope = Envelope::from_result("run_update", Ok(Payload { affected_rows: 2 }));
        assert!(envelope.is_success());
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"affected_rows": 2})
        );
    }

    #[test]
    fn test_failure_serializes_error_only() {
        let err = DbError::validation("Table name is required");
        let envelope: Envelope<Payload> = Envelope::from_result("describe_table", Err(err));
        assert_eq!(envelope.error(), Some("Table name is required"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"error": "Table name is required"})
        );
        assert!(envelope.success().is_none());
    }
}
