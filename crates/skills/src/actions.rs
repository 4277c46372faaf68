//! Per-skill actions that go straight to the gateway, bypassing the edit buffer.

use std::time::Duration;

use {
    clawpanel_protocol::{INSTALL_TIMEOUT_MS, methods, skills::SkillInstallResult},
    serde_json::json,
    tracing::{debug, info, warn},
};

use crate::{
    controller::SkillsController,
    edits,
    error::{Result, SkillsError},
    i18n::{Text, text},
    loader::LoadOptions,
    state::SkillMessage,
};

impl SkillsController {
    /// Claim `busy_skill` for `skill_key`. Returns false when another direct
    /// action is still running.
    fn begin_skill_action(&self, skill_key: &str) -> bool {
        let claimed = self.with_state(|s| {
            if s.busy_skill.is_some() {
                return false;
            }
            s.busy_skill = Some(skill_key.to_string());
            s.error = None;
            true
        });
        if !claimed {
            debug!(skill = skill_key, "another skill action in flight, dropping");
        }
        claimed
    }

    /// Release `busy_skill` and record the outcome. Reloads on success.
    async fn finish_skill_action(&self, skill_key: &str, action: &str, outcome: Result<String>) {
        let ok = self.with_state(|s| {
            s.busy_skill = None;
            match outcome {
                Ok(message) => {
                    s.set_message(skill_key, SkillMessage::success(message));
                    true
                },
                Err(e) => {
                    warn!(skill = skill_key, action, error = %e, "skill action failed");
                    let message = e.to_string();
                    s.set_message(skill_key, SkillMessage::error(message.clone()));
                    s.error = Some(message);
                    false
                },
            }
        });
        if ok {
            info!(skill = skill_key, action, "skill action completed");
            self.load_skills_status(LoadOptions::default()).await;
        }
    }

    /// Enable or disable a skill immediately.
    pub async fn update_skill_enabled(&self, skill_key: &str, enabled: bool) {
        if !self.begin_skill_action(skill_key) {
            return;
        }
        let outcome = self
            .call_ack(
                methods::SKILLS_UPDATE,
                json!({ "skillKey": skill_key, "enabled": enabled }),
            )
            .await
            .map(|()| {
                let key = if enabled {
                    Text::SkillEnabled
                } else {
                    Text::SkillDisabled
                };
                text(self.locale(), key).to_string()
            });
        self.finish_skill_action(skill_key, "enable", outcome).await;
    }

    /// Send the buffered API key for one skill now and drop it from the buffer.
    ///
    /// Nothing happens when no key is buffered.
    pub async fn save_skill_api_key(&self, skill_key: &str) {
        let api_key = self.with_state(|s| s.edits.get(skill_key).and_then(|e| e.api_key.clone()));
        let Some(api_key) = api_key else {
            debug!(skill = skill_key, "no buffered api key to save");
            return;
        };
        if !self.begin_skill_action(skill_key) {
            return;
        }
        let result = self
            .call_ack(
                methods::SKILLS_UPDATE,
                json!({ "skillKey": skill_key, "apiKey": api_key }),
            )
            .await;
        if result.is_ok() {
            self.with_state(|s| edits::clear_skill_api_key_edit(s, skill_key));
        }
        let outcome = result.map(|()| text(self.locale(), Text::ApiKeySaved).to_string());
        self.finish_skill_action(skill_key, "api-key", outcome).await;
    }

    /// Run one of a skill's dependency installers.
    ///
    /// Installs can take minutes, so the call carries its own timeout both as
    /// a param for the gateway and as the transport deadline.
    pub async fn install_skill(&self, skill_key: &str, name: &str, install_id: &str) {
        if !self.begin_skill_action(skill_key) {
            return;
        }
        let outcome = self.run_install(name, install_id).await;
        self.finish_skill_action(skill_key, "install", outcome).await;
    }

    async fn run_install(&self, name: &str, install_id: &str) -> Result<String> {
        let payload = self
            .client()
            .request_with_timeout(
                methods::SKILLS_INSTALL,
                json!({ "name": name, "installId": install_id, "timeoutMs": INSTALL_TIMEOUT_MS }),
                Duration::from_millis(INSTALL_TIMEOUT_MS),
            )
            .await?;
        let result: SkillInstallResult = if payload.is_null() {
            SkillInstallResult::default()
        } else {
            serde_json::from_value(payload)?
        };
        let locale = self.locale();
        if result.ok == Some(false) {
            let message = result
                .message
                .unwrap_or_else(|| text(locale, Text::InstallFailed).to_string());
            return Err(SkillsError::Install(message));
        }
        Ok(result
            .message
            .unwrap_or_else(|| text(locale, Text::Installed).to_string()))
    }
}
