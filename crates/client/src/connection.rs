use {
    crate::ClientError,
    clawpanel_protocol::{
        ClientInfo, ConnectAuth, ConnectParams, HelloOk, InboundFrame, PROTOCOL_VERSION,
        RequestFrame, ResponseFrame, methods, scopes,
    },
    futures::{SinkExt, StreamExt},
    std::{collections::HashMap, sync::Arc, time::Duration},
    tokio::sync::{Mutex, mpsc, oneshot, watch},
    tokio_tungstenite::{Connector, connect_async_tls_with_config, tungstenite::Message},
    tracing::{debug, error, info, warn},
};

/// Maximum reconnect backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Callers waiting on a response, keyed by request id.
pub(crate) type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseFrame>>>>;

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub url: String,
    pub auth: ConnectAuth,
    pub locale: Option<String>,
    /// Default per-call timeout.
    pub rpc_timeout: Duration,
}

/// Build the `ConnectParams` for the protocol v3 handshake.
pub(crate) fn build_connect_params(options: &ConnectOptions) -> ConnectParams {
    ConnectParams {
        min_protocol: PROTOCOL_VERSION,
        max_protocol: PROTOCOL_VERSION,
        client: ClientInfo {
            id: "clawpanel".into(),
            display_name: Some("Clawpanel Console".into()),
            version: env!("CARGO_PKG_VERSION").into(),
            platform: std::env::consts::OS.into(),
            mode: "operator".into(),
            instance_id: Some(uuid::Uuid::new_v4().to_string()),
        },
        role: Some("operator".into()),
        scopes: Some(vec![
            scopes::ADMIN.into(),
            scopes::READ.into(),
            scopes::WRITE.into(),
        ]),
        auth: Some(options.auth.clone()),
        locale: options.locale.clone(),
        user_agent: Some(format!("clawpanel/{}", env!("CARGO_PKG_VERSION"))),
    }
}

/// Main connection loop with auto-reconnect.
///
/// Exits when every sender of `write_rx` has been dropped.
pub(crate) async fn connection_loop(
    options: ConnectOptions,
    pending: PendingMap,
    connected: watch::Sender<bool>,
    mut write_rx: mpsc::UnboundedReceiver<String>,
) {
    let mut backoff = Duration::from_secs(1);

    loop {
        info!(url = %options.url, "connecting to gateway");

        let outcome = connect_and_run(&options, &pending, &connected, &mut write_rx).await;
        let was_connected = *connected.borrow();
        let _ = connected.send(false);
        // Dropping the senders wakes every waiting caller with a connection error.
        pending.lock().await.clear();

        match outcome {
            Ok(RunEnd::Shutdown) => {
                debug!("client dropped, closing gateway connection");
                return;
            },
            Ok(RunEnd::Closed) => debug!("connection closed by gateway"),
            Err(e) => error!(error = %e, "connection error"),
        }

        if write_rx.is_closed() {
            return;
        }
        // Requests queued while offline have no waiter left; don't replay them.
        while write_rx.try_recv().is_ok() {}

        if was_connected {
            backoff = Duration::from_secs(1);
        }
        info!(delay_ms = backoff.as_millis(), "reconnecting after delay");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

enum RunEnd {
    Closed,
    Shutdown,
}

/// Build a TLS connector that also trusts a locally installed gateway CA.
fn build_tls_connector() -> Connector {
    let mut root_store = rustls::RootCertStore::empty();

    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = root_store.add(cert);
    }

    if let Some(config_dir) = clawpanel_config::config_dir() {
        let ca_path = config_dir.join("certs").join("ca.pem");
        if let Ok(pem_data) = std::fs::read(&ca_path) {
            let mut reader = std::io::BufReader::new(pem_data.as_slice());
            for cert in rustls_pemfile::certs(&mut reader).flatten() {
                let _ = root_store.add(cert);
            }
            debug!(path = %ca_path.display(), "loaded gateway CA cert");
        }
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Connector::Rustls(Arc::new(config))
}

/// Single connection attempt: connect, handshake, then forward frames.
async fn connect_and_run(
    options: &ConnectOptions,
    pending: &PendingMap,
    connected: &watch::Sender<bool>,
    write_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<RunEnd, ClientError> {
    let connector = build_tls_connector();
    let (ws_stream, _response) =
        connect_async_tls_with_config(options.url.as_str(), None, false, Some(connector)).await?;
    let (mut ws_sink, mut ws_reader) = ws_stream.split();

    let connect_id = uuid::Uuid::new_v4().to_string();
    let connect_frame = RequestFrame::new(
        connect_id.clone(),
        methods::CONNECT,
        serde_json::to_value(build_connect_params(options))?,
    );
    let connect_json = serde_json::to_string(&connect_frame)?;
    ws_sink.send(Message::Text(connect_json.into())).await?;

    let hello_ok = wait_for_hello(&mut ws_reader, &connect_id).await?;
    info!(
        server_version = %hello_ok.server.version,
        conn_id = %hello_ok.server.conn_id,
        "connected to gateway"
    );
    let _ = connected.send(true);

    loop {
        tokio::select! {
            msg = ws_reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => route_inbound(pending, text.as_str()).await,
                    Some(Ok(Message::Close(_))) | None => return Ok(RunEnd::Closed),
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(ClientError::WebSocket(e)),
                }
            },
            json = write_rx.recv() => {
                match json {
                    Some(text) => {
                        ws_sink.send(Message::Text(text.into())).await?;
                    },
                    None => {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        return Ok(RunEnd::Shutdown);
                    },
                }
            },
        }
    }
}

/// Hand a response frame to whoever is waiting for it; events are only logged.
pub(crate) async fn route_inbound(pending: &PendingMap, text: &str) {
    match serde_json::from_str::<InboundFrame>(text) {
        Ok(InboundFrame::Event { event, seq, .. }) => {
            debug!(event = %event, seq = ?seq, "gateway event");
        },
        Ok(frame) => {
            if let Some(response) = frame.into_response() {
                let waiter = pending.lock().await.remove(&response.id);
                match waiter {
                    // The caller may have timed out and dropped the receiver.
                    Some(tx) => {
                        let _ = tx.send(response);
                    },
                    None => debug!(id = %response.id, "response for unknown request"),
                }
            }
        },
        Err(e) => warn!(error = %e, "unparseable frame from gateway"),
    }
}

/// Wait for the `hello-ok` response frame from the gateway.
async fn wait_for_hello(
    reader: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
    connect_id: &str,
) -> Result<HelloOk, ClientError> {
    let timeout = Duration::from_millis(clawpanel_protocol::HANDSHAKE_TIMEOUT_MS);

    let result = tokio::time::timeout(timeout, async {
        while let Some(msg) = reader.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Ok(frame) = serde_json::from_str::<ResponseFrame>(text.as_str())
                        && frame.id == connect_id
                    {
                        if !frame.ok {
                            let msg = frame
                                .error
                                .map(|e| e.message)
                                .unwrap_or_else(|| "unknown error".into());
                            return Err(ClientError::Auth(msg));
                        }
                        let payload = frame.payload.ok_or_else(|| {
                            ClientError::Connection("hello-ok response missing payload".into())
                        })?;
                        return Ok(serde_json::from_value::<HelloOk>(payload)?);
                    }
                },
                Ok(Message::Close(_)) => {
                    return Err(ClientError::Connection(
                        "server closed connection during handshake".into(),
                    ));
                },
                Ok(_) => {},
                Err(e) => return Err(ClientError::WebSocket(e)),
            }
        }
        Err(ClientError::Connection(
            "connection closed before handshake".into(),
        ))
    })
    .await;

    match result {
        Ok(inner) => inner,
        Err(_) => Err(ClientError::Connection("handshake timed out".into())),
    }
}
