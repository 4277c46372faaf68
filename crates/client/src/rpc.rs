use {
    crate::{
        ClientError, GatewayClient,
        connection::{ConnectOptions, PendingMap, connection_loop},
    },
    async_trait::async_trait,
    clawpanel_protocol::{RequestFrame, ResponseFrame},
    serde_json::Value,
    std::{collections::HashMap, sync::Arc, time::Duration},
    tokio::sync::{Mutex, mpsc, oneshot, watch},
    tracing::debug,
};

/// WebSocket gateway client. Correlates RPC request/response pairs by id.
///
/// The connection runs in a background task that reconnects on its own;
/// dropping the client shuts it down.
pub struct WsGatewayClient {
    write_tx: mpsc::UnboundedSender<String>,
    pending: PendingMap,
    connected: watch::Receiver<bool>,
    rpc_timeout: Duration,
}

impl WsGatewayClient {
    /// Spawn the connection task and return immediately.
    pub fn spawn(options: ConnectOptions) -> Self {
        let (write_tx, write_rx) = mpsc::unbounded_channel::<String>();
        let (connected_tx, connected) = watch::channel(false);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let rpc_timeout = options.rpc_timeout;

        tokio::spawn(connection_loop(
            options,
            Arc::clone(&pending),
            connected_tx,
            write_rx,
        ));

        Self {
            write_tx,
            pending,
            connected,
            rpc_timeout,
        }
    }

    /// Wait until the handshake has completed, or fail after `timeout`.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<(), ClientError> {
        let mut rx = self.connected.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|up| *up)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(ClientError::Connection("connection task exited".into())),
            Err(_) => Err(ClientError::Connection(format!(
                "gateway not reachable after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn call(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let id = uuid::Uuid::new_v4().to_string();
        let frame = RequestFrame::new(id.clone(), method, params);
        let json = serde_json::to_string(&frame)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        if self.write_tx.send(json).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ClientError::Connection("connection task exited".into()));
        }
        debug!(method, id = %id, "rpc request sent");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => into_payload(response),
            Ok(Err(_)) => {
                self.pending.lock().await.remove(&id);
                Err(ClientError::Connection(
                    "connection closed during RPC call".into(),
                ))
            },
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(ClientError::Timeout {
                    method: method.to_string(),
                    ms: timeout.as_millis(),
                })
            },
        }
    }
}

/// Unwrap a response frame into its payload or the gateway's error.
fn into_payload(response: ResponseFrame) -> Result<Value, ClientError> {
    if response.ok {
        return Ok(response.payload.unwrap_or(Value::Null));
    }
    Err(match response.error {
        Some(shape) => shape.into(),
        None => ClientError::rejected(
            clawpanel_protocol::error_codes::UNAVAILABLE,
            "unknown RPC error",
        ),
    })
}

#[async_trait]
impl GatewayClient for WsGatewayClient {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        self.call(method, params, self.rpc_timeout).await
    }

    async fn request_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        self.call(method, params, timeout.max(self.rpc_timeout)).await
    }

    fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }
}
