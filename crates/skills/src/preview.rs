//! Read-only preview of a skill file.

use {
    clawpanel_protocol::{
        methods,
        skills::{SkillFileContent, SkillSource},
    },
    serde_json::json,
    tracing::{debug, warn},
};

use crate::{
    controller::SkillsController,
    state::{ModalStatus, PreviewSession, PreviewState, SkillsConfigState},
};

pub fn close_skill_preview(state: &mut SkillsConfigState) {
    state.preview = PreviewState::Closed;
}

impl SkillsController {
    pub async fn open_skill_preview(&self, skill_name: &str, source: SkillSource) {
        let opened = self.with_state(|s| {
            if s.preview != PreviewState::Closed {
                return false;
            }
            s.preview = PreviewState::Open(PreviewSession {
                skill_name: skill_name.to_string(),
                source,
                status: ModalStatus::Loading,
                content: String::new(),
                error: None,
            });
            true
        });
        if !opened {
            debug!(skill = skill_name, "preview already open");
            return;
        }

        let result = self
            .call::<SkillFileContent>(
                methods::SKILLS_FILE_READ,
                json!({ "skillName": skill_name, "source": source }),
            )
            .await;

        self.with_state(|s| {
            let PreviewState::Open(session) = &mut s.preview else {
                return;
            };
            if session.skill_name != skill_name || session.source != source {
                return;
            }
            match result {
                Ok(file) => {
                    session.content = file.content;
                    session.status = ModalStatus::Ready;
                },
                Err(e) => {
                    warn!(skill = skill_name, error = %e, "failed to load skill preview");
                    session.error = Some(e.to_string());
                    session.status = ModalStatus::Failed;
                },
            }
        });
    }
}
