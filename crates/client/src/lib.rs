//! Gateway RPC client.
//!
//! [`GatewayClient`] is the seam the console controllers talk to: a
//! promise-style `request(method, params)` that resolves with the response
//! payload or rejects with a [`ClientError`]. [`WsGatewayClient`] implements
//! it over the gateway WebSocket.

mod connection;
pub mod error;
mod rpc;

use std::time::Duration;

use {async_trait::async_trait, serde_json::Value};

pub use {
    connection::ConnectOptions,
    error::ClientError,
    rpc::WsGatewayClient,
};

#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Send an RPC request and wait for its payload.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ClientError>;

    /// Same as [`GatewayClient::request`], with an explicit transport timeout
    /// for calls known to run long.
    async fn request_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let _ = timeout;
        self.request(method, params).await
    }

    /// Whether the transport currently has a live gateway session.
    fn is_connected(&self) -> bool {
        true
    }
}
