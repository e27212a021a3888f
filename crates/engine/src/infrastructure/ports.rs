//! Error types at the upstream dispatch boundary.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("upstream unreachable: {0}")]
    Connect(String),
    #[error("upstream request timed out after {0}s")]
    Timeout(u64),
    /// Non-2xx from the upstream. Carries the upstream's own error payload
    /// when one was readable, for diagnostics.
    #[error("upstream returned status {status}")]
    UpstreamStatus { status: u16, body: Option<Value> },
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl DispatchError {
    /// HTTP status to report to the client: the upstream's own status when
    /// we have one, a generic server error otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::UpstreamStatus { status, .. } => *status,
            _ => 500,
        }
    }

    /// The upstream's error payload, when present.
    pub fn upstream_body(&self) -> Option<&Value> {
        match self {
            DispatchError::UpstreamStatus { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_code_passes_upstream_status_through() {
        let error = DispatchError::UpstreamStatus {
            status: 404,
            body: Some(json!({"error": "model not found"})),
        };
        assert_eq!(error.status_code(), 404);
        assert!(error.upstream_body().is_some());
    }

    #[test]
    fn test_other_errors_default_to_500() {
        assert_eq!(DispatchError::Connect("refused".into()).status_code(), 500);
        assert_eq!(DispatchError::Timeout(90).status_code(), 500);
        assert!(DispatchError::Timeout(90).upstream_body().is_none());
    }
}
