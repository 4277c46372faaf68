//! Gateway RPC protocol definitions used by the console.
//!
//! All communication uses JSON frames over WebSocket.
//!
//! Frame types:
//! - `RequestFrame`  — console → gateway RPC call
//! - `ResponseFrame` — gateway → console RPC result
//! - `InboundFrame`  — anything the gateway pushes, responses and events

pub mod skills;

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

pub const PROTOCOL_VERSION: u32 = 3;
pub const HANDSHAKE_TIMEOUT_MS: u64 = 10_000; // 10s
/// Transport timeout hint for dependency installs, which can run for minutes.
pub const INSTALL_TIMEOUT_MS: u64 = 120_000;

// ── Method names ─────────────────────────────────────────────────────────────

pub mod methods {
    pub const CONNECT: &str = "connect";
    pub const CONFIG_GET: &str = "config.get";
    pub const CONFIG_PATCH: &str = "config.patch";
    pub const SKILLS_STATUS: &str = "skills.status";
    pub const SKILLS_UPDATE: &str = "skills.update";
    pub const SKILLS_INSTALL: &str = "skills.install";
    pub const SKILLS_FILE_READ: &str = "skills.file.read";
    pub const SKILLS_FILE_WRITE: &str = "skills.file.write";
    pub const SKILLS_FILE_CREATE: &str = "skills.file.create";
    pub const SKILLS_FILE_DELETE: &str = "skills.file.delete";
}

// ── Error codes ──────────────────────────────────────────────────────────────

pub mod error_codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    /// The `baseHash` sent with a `config.patch` no longer matches the document.
    pub const CONFLICT: &str = "CONFLICT";
}

// ── Error shape ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(rename = "retryAfterMs", skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl ErrorShape {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: None,
            retry_after_ms: None,
        }
    }
}

// ── Frames ───────────────────────────────────────────────────────────────────

/// Console → gateway RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    pub r#type: String, // always "req"
    pub id: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl RequestFrame {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            r#type: "req".into(),
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// Gateway → console RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub r#type: String, // always "res"
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl ResponseFrame {
    pub fn err(id: impl Into<String>, error: ErrorShape) -> Self {
        Self {
            r#type: "res".into(),
            id: id.into(),
            ok: false,
            payload: None,
            error: Some(error),
        }
    }
}

/// Any frame the gateway may push down the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "res")]
    Response {
        id: String,
        ok: bool,
        #[serde(default)]
        payload: Option<serde_json::Value>,
        #[serde(default)]
        error: Option<ErrorShape>,
    },
    #[serde(rename = "event")]
    Event {
        event: String,
        #[serde(default)]
        payload: Option<serde_json::Value>,
        #[serde(default)]
        seq: Option<u64>,
    },
}

impl InboundFrame {
    /// Convert a response variant back into a [`ResponseFrame`].
    pub fn into_response(self) -> Option<ResponseFrame> {
        match self {
            Self::Response {
                id,
                ok,
                payload,
                error,
            } => Some(ResponseFrame {
                r#type: "res".into(),
                id,
                ok,
                payload,
                error,
            }),
            Self::Event { .. } => None,
        }
    }
}

// ── Connect handshake ────────────────────────────────────────────────────────

/// Parameters sent by the console in the initial `connect` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "minProtocol")]
    pub min_protocol: u32,
    #[serde(rename = "maxProtocol")]
    pub max_protocol: u32,
    pub client: ClientInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<ConnectAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: String,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub version: String,
    pub platform: String,
    pub mode: String,
    #[serde(rename = "instanceId", skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Sent by the gateway after a successful handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloOk {
    pub r#type: String, // always "hello-ok"
    pub protocol: u32,
    pub server: ServerInfo,
    #[serde(default)]
    pub features: Features,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(rename = "connId")]
    pub conn_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

// ── Roles and scopes ─────────────────────────────────────────────────────────

pub mod scopes {
    pub const ADMIN: &str = "operator.admin";
    pub const READ: &str = "operator.read";
    pub const WRITE: &str = "operator.write";
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_response_parses_error_shape() {
        let raw = r#"{"type":"res","id":"7","ok":false,"error":{"code":"CONFLICT","message":"config changed since last load"}}"#;
        let frame: InboundFrame = serde_json::from_str(raw).unwrap();
        let res = frame.into_response().unwrap();
        assert!(!res.ok);
        let err = res.error.unwrap();
        assert_eq!(err.code, error_codes::CONFLICT);
        assert_eq!(err.message, "config changed since last load");
    }

    #[test]
    fn inbound_event_is_not_a_response() {
        let raw = r#"{"type":"event","event":"tick","seq":4}"#;
        let frame: InboundFrame = serde_json::from_str(raw).unwrap();
        assert!(frame.into_response().is_none());
    }

    #[test]
    fn request_frame_serializes_type_tag() {
        let frame = RequestFrame::new("1", methods::SKILLS_STATUS, serde_json::json!({}));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "req");
        assert_eq!(json["method"], "skills.status");
    }
}
