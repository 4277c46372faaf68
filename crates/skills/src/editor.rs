//! The skill file editor modal.

use {
    clawpanel_protocol::{
        methods,
        skills::{SkillFileContent, SkillSource},
    },
    serde_json::json,
    tracing::{debug, info, warn},
};

use crate::{
    controller::SkillsController,
    error::SkillsError,
    i18n::{Text, text},
    loader::LoadOptions,
    state::{EditorSession, EditorState, ModalStatus, SkillMessage, SkillsConfigState},
};

/// Working copy differs from what the gateway last confirmed.
pub fn has_editor_changes(state: &SkillsConfigState) -> bool {
    state
        .editor
        .session()
        .is_some_and(|s| s.status == ModalStatus::Ready && s.content != s.original)
}

/// Replace the working copy. Ignored unless the editor is loaded and idle.
pub fn update_editor_content(state: &mut SkillsConfigState, content: impl Into<String>) {
    if let Some(session) = state.editor.session_mut()
        && session.status == ModalStatus::Ready
        && !session.saving
    {
        session.content = content.into();
    }
}

pub fn close_skill_editor(state: &mut SkillsConfigState) {
    state.editor = EditorState::Closed;
}

fn is_editing(state: &SkillsConfigState, skill_name: &str, source: SkillSource) -> bool {
    state
        .editor
        .session()
        .is_some_and(|s| s.skill_name == skill_name && s.source == source)
}

impl SkillsController {
    /// Open the editor on a skill's `SKILL.md` and fetch its content.
    ///
    /// Only opens from the closed state.
    pub async fn open_skill_editor(&self, skill_name: &str, source: SkillSource) {
        let opened = self.with_state(|s| {
            if s.editor != EditorState::Closed {
                return false;
            }
            s.editor = EditorState::Open(EditorSession {
                skill_name: skill_name.to_string(),
                source,
                status: ModalStatus::Loading,
                content: String::new(),
                original: String::new(),
                path: None,
                saving: false,
                error: None,
            });
            true
        });
        if !opened {
            debug!(skill = skill_name, "editor already open");
            return;
        }

        let result = self
            .call::<SkillFileContent>(
                methods::SKILLS_FILE_READ,
                json!({ "skillName": skill_name, "source": source }),
            )
            .await;

        self.with_state(|s| {
            if !is_editing(s, skill_name, source) {
                return;
            }
            let Some(session) = s.editor.session_mut() else {
                return;
            };
            match result {
                Ok(file) => {
                    session.content = file.content.clone();
                    session.original = file.content;
                    session.path = file.path;
                    session.status = ModalStatus::Ready;
                },
                Err(e) => {
                    warn!(skill = skill_name, error = %e, "failed to read skill file");
                    session.error = Some(e.to_string());
                    session.status = ModalStatus::Failed;
                },
            }
        });
    }

    /// Write the working copy back. The baseline only moves on success.
    pub async fn save_skill_file(&self) {
        let job = self.with_state(|s| {
            let session = s.editor.session_mut()?;
            if session.status != ModalStatus::Ready || session.saving {
                return None;
            }
            if !session.source.is_editable() {
                session.error = Some(SkillsError::ReadOnly(session.source).to_string());
                return None;
            }
            session.saving = true;
            session.error = None;
            Some((
                session.skill_name.clone(),
                session.source,
                session.content.clone(),
            ))
        });
        let Some((skill_name, source, content)) = job else {
            debug!("editor not ready to save");
            return;
        };

        let result = self
            .call_ack(
                methods::SKILLS_FILE_WRITE,
                json!({ "skillName": skill_name, "source": source, "content": content }),
            )
            .await;
        let locale = self.locale();

        let ok = self.with_state(|s| {
            if is_editing(s, &skill_name, source)
                && let Some(session) = s.editor.session_mut()
            {
                session.saving = false;
                match &result {
                    Ok(()) => session.original = content,
                    Err(e) => session.error = Some(e.to_string()),
                }
            }
            match &result {
                Ok(()) => {
                    s.set_message(&skill_name, SkillMessage::success(text(locale, Text::FileSaved)));
                    true
                },
                Err(e) => {
                    warn!(skill = %skill_name, error = %e, "failed to save skill file");
                    false
                },
            }
        });
        if ok {
            info!(skill = %skill_name, source = source.as_str(), "skill file saved");
            self.load_skills_status(LoadOptions::default()).await;
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn ready(content: &str) -> SkillsConfigState {
        let mut state = SkillsConfigState::new();
        state.editor = EditorState::Open(EditorSession {
            skill_name: "notes".into(),
            source: SkillSource::Workspace,
            status: ModalStatus::Ready,
            content: content.into(),
            original: content.into(),
            path: None,
            saving: false,
            error: None,
        });
        state
    }

    #[test]
    fn edits_are_tracked_against_original() {
        let mut state = ready("# notes\n");
        assert!(!has_editor_changes(&state));
        update_editor_content(&mut state, "# notes\nmore\n");
        assert!(has_editor_changes(&state));
        update_editor_content(&mut state, "# notes\n");
        assert!(!has_editor_changes(&state));
    }

    #[test]
    fn content_is_frozen_while_saving() {
        let mut state = ready("a");
        state.editor.session_mut().unwrap().saving = true;
        update_editor_content(&mut state, "b");
        assert_eq!(state.editor.session().unwrap().content, "a");
    }

    #[test]
    fn close_resets_to_closed() {
        let mut state = ready("a");
        close_skill_editor(&mut state);
        assert_eq!(state.editor, EditorState::Closed);
        assert!(!has_editor_changes(&state));
    }
}
