//! Fetching the status report and config snapshot.

use {
    clawpanel_protocol::{
        methods,
        skills::{ConfigSnapshot, SkillStatusReport, SkillsConfig},
    },
    serde_json::json,
    tracing::{debug, warn},
};

use crate::{controller::SkillsController, error::Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Drop per-skill banners before loading.
    pub clear_messages: bool,
}

struct Fetched {
    report: SkillStatusReport,
    config: SkillsConfig,
    hash: Option<String>,
}

impl SkillsController {
    /// Fetch `skills.status` and `config.get` and rehydrate the baseline.
    ///
    /// Does nothing when disconnected or when a load is already running. On
    /// failure only `error` changes.
    pub async fn load_skills_status(&self, options: LoadOptions) {
        if !self.connected() {
            debug!("gateway not connected, skipping skills load");
            return;
        }
        let started = self.with_state(|s| {
            if s.loading {
                return false;
            }
            s.loading = true;
            s.error = None;
            if options.clear_messages {
                s.messages.clear();
            }
            true
        });
        if !started {
            debug!("skills load already in flight");
            return;
        }

        let result = self.fetch().await;

        self.with_state(|s| {
            s.loading = false;
            match result {
                Ok(fetched) => {
                    debug!(
                        skills = fetched.report.skills.len(),
                        has_hash = fetched.hash.is_some(),
                        "skills status loaded"
                    );
                    s.apply_snapshot(fetched.report, fetched.config, fetched.hash);
                },
                Err(e) => {
                    warn!(error = %e, "failed to load skills status");
                    s.error = Some(e.to_string());
                },
            }
        });
    }

    async fn fetch(&self) -> Result<Fetched> {
        let (report, snapshot) = tokio::try_join!(
            self.call::<SkillStatusReport>(methods::SKILLS_STATUS, json!({})),
            self.call::<ConfigSnapshot>(methods::CONFIG_GET, json!({})),
        )?;
        let config = snapshot.skills()?;
        Ok(Fetched {
            report,
            config,
            hash: snapshot.hash,
        })
    }
}
