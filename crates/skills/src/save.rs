//! Committing changes: merge-patch writes and the buffered-edit flush.

use {
    clawpanel_protocol::methods,
    serde_json::{Value, json},
    tracing::{debug, info, warn},
};

use crate::{
    allowlist,
    controller::SkillsController,
    edits::{self, PendingUpdate},
    error::{Result, SkillsError},
    i18n::{Text, text},
    loader::LoadOptions,
    patch::{GlobalSetting, build_skills_patch, field_path, normalize_extra_dirs},
    state::SkillMessage,
};

impl SkillsController {
    /// Write one field of the `skills` sub-tree. `None` deletes the field.
    ///
    /// `field` may be dotted (`load.extraDirs`). A blank field is refused
    /// with an error in state rather than patching the whole sub-tree.
    pub async fn update_skills_config_field(&self, field: &str, value: Option<Value>) {
        let path = field_path(field);
        if path.is_empty() {
            warn!(field, "refusing config patch without a field name");
            self.with_state(|s| s.error = Some(SkillsError::EmptyField.to_string()));
            return;
        }
        let patch = build_skills_patch(&path, value);
        self.run_patch(field, patch).await;
    }

    pub async fn update_global_setting(&self, setting: GlobalSetting) {
        let path = setting.path();
        let patch = build_skills_patch(&path, setting.value());
        self.run_patch(&path.join("."), patch).await;
    }

    /// Replace `skills.load.extraDirs`. An empty list deletes it.
    pub async fn update_extra_dirs(&self, dirs: &[String]) {
        let value = normalize_extra_dirs(dirs).map(|dirs| json!(dirs));
        let patch = build_skills_patch(&["load", "extraDirs"], value);
        self.run_patch("load.extraDirs", patch).await;
    }

    async fn run_patch(&self, field: &str, patch: Value) {
        let base_hash = self.with_state(|s| {
            if s.saving {
                return None;
            }
            s.saving = true;
            s.error = None;
            Some(s.base_hash.clone())
        });
        let Some(base_hash) = base_hash else {
            debug!(field, "save in flight, dropping config patch");
            return;
        };

        let result = match base_hash {
            Some(hash) => self.send_patch(&patch, &hash).await,
            None => Err(SkillsError::MissingBaseHash),
        };

        let ok = self.with_state(|s| {
            s.saving = false;
            match &result {
                Ok(()) => true,
                Err(e) => {
                    warn!(field, error = %e, "config patch failed");
                    s.error = Some(e.to_string());
                    false
                },
            }
        });
        if ok {
            info!(field, "skills config patched");
            self.load_skills_status(LoadOptions::default()).await;
        }
    }

    pub(crate) async fn send_patch(&self, patch: &Value, base_hash: &str) -> Result<()> {
        let raw = serde_json::to_string(patch)?;
        self.call_ack(
            methods::CONFIG_PATCH,
            json!({ "raw": raw, "baseHash": base_hash }),
        )
        .await
    }

    /// Commit every buffered edit, then the allow-list.
    ///
    /// Per-skill writes go out one at a time in [`edits::pending_updates`]
    /// order. The first failure stops the flush and leaves `edits` intact;
    /// writes that already succeeded are not rolled back.
    ///
    /// `allowBundled` is only patched when the mode or the draft differs from
    /// what was loaded, so a save in "all" mode with an already-absent list
    /// sends no deletion. That patch needs the loaded hash; without one the
    /// save fails before any write goes out.
    pub async fn save_skills_config(&self) {
        let plan = self.with_state(|s| {
            if s.saving {
                return None;
            }
            s.saving = true;
            s.error = None;
            Some((
                edits::pending_updates(s),
                allowlist::allowlist_patch(s),
                s.base_hash.clone(),
                s.edits.keys().cloned().collect::<Vec<_>>(),
            ))
        });
        let Some((updates, allowlist_patch, base_hash, touched)) = plan else {
            debug!("save in flight, dropping save request");
            return;
        };

        let result = match (allowlist_patch, base_hash) {
            (Some(_), None) => Err((None, SkillsError::MissingBaseHash)),
            (allowlist_patch, base_hash) => {
                self.flush(&updates, allowlist_patch.zip(base_hash)).await
            },
        };
        let locale = self.locale();

        let ok = self.with_state(|s| {
            s.saving = false;
            match result {
                Ok(()) => {
                    s.edits.clear();
                    for key in &touched {
                        s.set_message(key, SkillMessage::success(text(locale, Text::ChangesSaved)));
                    }
                    true
                },
                Err((failed_key, e)) => {
                    warn!(skill = failed_key.as_deref(), error = %e, "saving skills config failed");
                    let message = e.to_string();
                    if let Some(key) = failed_key {
                        s.set_message(&key, SkillMessage::error(message.clone()));
                    }
                    s.error = Some(message);
                    false
                },
            }
        });
        if ok {
            info!(
                writes = updates.len(),
                skills = touched.len(),
                "skills config saved"
            );
            self.load_skills_status(LoadOptions {
                clear_messages: false,
            })
            .await;
        }
    }

    /// Run the flush. On failure, returns the skill whose write failed (if
    /// it was a per-skill write) with the error.
    async fn flush(
        &self,
        updates: &[PendingUpdate],
        allowlist_patch: Option<(Option<Vec<String>>, String)>,
    ) -> std::result::Result<(), (Option<String>, SkillsError)> {
        for update in updates {
            debug!(skill = %update.skill_key, "flushing skill update");
            self.call_ack(methods::SKILLS_UPDATE, update.params())
                .await
                .map_err(|e| (Some(update.skill_key.clone()), e))?;
        }

        if let Some((list, hash)) = allowlist_patch {
            let patch = build_skills_patch(&["allowBundled"], list.map(|l| json!(l)));
            self.send_patch(&patch, &hash).await.map_err(|e| (None, e))?;
        }
        Ok(())
    }
}
