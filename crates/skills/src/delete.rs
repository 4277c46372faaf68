//! Delete-skill confirmation modal.

use {
    clawpanel_protocol::{methods, skills::SkillSource},
    serde_json::json,
    tracing::{debug, info, warn},
};

use crate::{
    controller::SkillsController,
    error::SkillsError,
    i18n::{Text, text},
    loader::LoadOptions,
    state::{DeleteSession, DeleteState, EditorState, SkillMessage, SkillsConfigState},
};

/// Ask for confirmation before deleting a skill. Bundled skills cannot be
/// deleted; the request sets the top-level error instead of opening.
pub fn open_delete_skill(state: &mut SkillsConfigState, skill_name: &str, source: SkillSource) {
    if state.delete != DeleteState::Closed {
        return;
    }
    if !source.is_editable() {
        state.error = Some(SkillsError::ReadOnly(source).to_string());
        return;
    }
    state.delete = DeleteState::Open(DeleteSession {
        skill_name: skill_name.to_string(),
        source,
        deleting: false,
        error: None,
    });
}

pub fn close_delete_skill(state: &mut SkillsConfigState) {
    state.delete = DeleteState::Closed;
}

impl SkillsController {
    /// Delete the skill named in the open modal. On failure the modal stays
    /// open with the error.
    pub async fn confirm_delete_skill(&self) {
        let job = self.with_state(|s| {
            let session = s.delete.session_mut()?;
            if session.deleting {
                return None;
            }
            session.deleting = true;
            session.error = None;
            Some((session.skill_name.clone(), session.source))
        });
        let Some((skill_name, source)) = job else {
            debug!("no delete to confirm");
            return;
        };

        let result = self
            .call_ack(
                methods::SKILLS_FILE_DELETE,
                json!({ "skillName": skill_name, "source": source }),
            )
            .await;
        let locale = self.locale();

        let ok = self.with_state(|s| match result {
            Ok(()) => {
                s.delete = DeleteState::Closed;
                if s.editor
                    .session()
                    .is_some_and(|e| e.skill_name == skill_name && e.source == source)
                {
                    s.editor = EditorState::Closed;
                }
                s.set_message(&skill_name, SkillMessage::success(text(locale, Text::SkillDeleted)));
                true
            },
            Err(e) => {
                warn!(skill = %skill_name, error = %e, "failed to delete skill");
                if let Some(session) = s.delete.session_mut() {
                    session.deleting = false;
                    session.error = Some(e.to_string());
                }
                false
            },
        });
        if ok {
            info!(skill = %skill_name, source = source.as_str(), "skill deleted");
            self.load_skills_status(LoadOptions::default()).await;
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_skills_cannot_be_deleted() {
        let mut state = SkillsConfigState::new();
        open_delete_skill(&mut state, "web_search", SkillSource::Bundled);
        assert_eq!(state.delete, DeleteState::Closed);
        assert!(state.error.is_some());
    }

    #[test]
    fn open_only_from_closed() {
        let mut state = SkillsConfigState::new();
        open_delete_skill(&mut state, "notes", SkillSource::Workspace);
        open_delete_skill(&mut state, "other", SkillSource::Managed);
        assert_eq!(state.delete.session().unwrap().skill_name, "notes");
        close_delete_skill(&mut state);
        assert_eq!(state.delete, DeleteState::Closed);
    }
}
