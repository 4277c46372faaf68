use std::sync::{Arc, Mutex};

use {
    clawpanel_client::GatewayClient,
    serde::de::DeserializeOwned,
    serde_json::Value,
};

use crate::{error::Result, i18n::Locale, state::SkillsConfigState};

/// Drives the skills panel: owns the shared state and the gateway client.
///
/// State is locked only between suspension points, never across an `.await`,
/// so a render loop can take snapshots while a flow is in flight. Busy flags
/// are checked and set under the same lock; a call that finds its flag set
/// is dropped.
#[derive(Clone)]
pub struct SkillsController {
    client: Arc<dyn GatewayClient>,
    state: Arc<Mutex<SkillsConfigState>>,
    locale: Locale,
}

impl SkillsController {
    pub fn new(client: Arc<dyn GatewayClient>, locale: Locale) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(SkillsConfigState::new())),
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Run `f` with exclusive access to the state.
    ///
    /// This is how synchronous edits (`edits::*`, `allowlist::*`) are applied.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SkillsConfigState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Clone of the current state for rendering.
    pub fn snapshot(&self) -> SkillsConfigState {
        self.with_state(|s| s.clone())
    }

    pub(crate) fn connected(&self) -> bool {
        self.client.is_connected()
    }

    pub(crate) fn client(&self) -> &dyn GatewayClient {
        self.client.as_ref()
    }

    pub(crate) async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let payload = self.client.request(method, params).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Call a method whose payload is only an acknowledgement.
    pub(crate) async fn call_ack(&self, method: &str, params: Value) -> Result<()> {
        self.client.request(method, params).await?;
        Ok(())
    }
}
