/// Errors surfaced by a gateway client.
///
/// `Protocol` carries the gateway's own error message unchanged; callers show
/// it to the user verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{message}")]
    Protocol { code: String, message: String },

    #[error("RPC call '{method}' timed out after {ms}ms")]
    Timeout { method: String, ms: u128 },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Build a rejection as the gateway would report it.
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<clawpanel_protocol::ErrorShape> for ClientError {
    fn from(shape: clawpanel_protocol::ErrorShape) -> Self {
        Self::Protocol {
            code: shape.code,
            message: shape.message,
        }
    }
}
