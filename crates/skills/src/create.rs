//! New-skill modal: name validation and file creation.

use std::sync::OnceLock;

use {
    clawpanel_protocol::{methods, skills::SkillSource},
    regex::Regex,
    serde_json::json,
    tracing::{debug, info, warn},
};

use crate::{
    controller::SkillsController,
    i18n::{Locale, Text, skill_template, text},
    loader::LoadOptions,
    state::{CreateSession, CreateState, SkillMessage, SkillsConfigState},
};

pub const MAX_SKILL_NAME_LEN: usize = 64;

fn skill_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$")
            .unwrap_or_else(|err| panic!("valid skill name regex: {err}"))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameProblem {
    Required,
    TooLong,
    PathSeparator,
    Invalid,
}

impl NameProblem {
    pub fn message(self, locale: Locale) -> &'static str {
        let key = match self {
            Self::Required => Text::NameRequired,
            Self::TooLong => Text::NameTooLong,
            Self::PathSeparator => Text::NamePathSeparator,
            Self::Invalid => Text::NameInvalid,
        };
        text(locale, key)
    }
}

/// Check a proposed skill directory name: lowercase ASCII letters and digits
/// in hyphen-separated runs, at most 64 characters.
pub fn validate_skill_name(name: &str) -> Result<(), NameProblem> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NameProblem::Required);
    }
    if name.len() > MAX_SKILL_NAME_LEN {
        return Err(NameProblem::TooLong);
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(NameProblem::PathSeparator);
    }
    if !skill_name_regex().is_match(name) {
        return Err(NameProblem::Invalid);
    }
    Ok(())
}

/// Open the create modal with an empty form. Only opens from closed.
pub fn open_create_skill(state: &mut SkillsConfigState) {
    if state.create == CreateState::Closed {
        state.create = CreateState::Open(CreateSession::default());
    }
}

/// Update the name field, re-validating as the user types. An empty field
/// is not flagged until submission.
pub fn update_create_name(state: &mut SkillsConfigState, locale: Locale, name: impl Into<String>) {
    let Some(session) = state.create.session_mut() else {
        return;
    };
    if session.creating {
        return;
    }
    let name = name.into();
    session.name_error = match validate_skill_name(&name) {
        Ok(()) | Err(NameProblem::Required) => None,
        Err(problem) => Some(problem.message(locale).to_string()),
    };
    session.name = name;
}

pub fn close_create_skill(state: &mut SkillsConfigState) {
    state.create = CreateState::Closed;
}

impl SkillsController {
    /// Create the skill in the workspace from the starter template, then
    /// open it in the editor.
    ///
    /// An invalid name only sets the field error; no call is made.
    pub async fn confirm_create_skill(&self) {
        let locale = self.locale();
        let job = self.with_state(|s| {
            let session = s.create.session_mut()?;
            if session.creating {
                return None;
            }
            let name = session.name.trim().to_string();
            if let Err(problem) = validate_skill_name(&name) {
                session.name_error = Some(problem.message(locale).to_string());
                return None;
            }
            session.name_error = None;
            session.error = None;
            session.creating = true;
            Some(name)
        });
        let Some(name) = job else {
            debug!("create form not ready to submit");
            return;
        };

        let source = SkillSource::Workspace;
        let result = self
            .call_ack(
                methods::SKILLS_FILE_CREATE,
                json!({
                    "skillName": name,
                    "source": source,
                    "content": skill_template(locale, &name),
                }),
            )
            .await;

        let ok = self.with_state(|s| match result {
            Ok(()) => {
                s.create = CreateState::Closed;
                s.set_message(&name, SkillMessage::success(text(locale, Text::SkillCreated)));
                true
            },
            Err(e) => {
                warn!(skill = %name, error = %e, "failed to create skill");
                if let Some(session) = s.create.session_mut() {
                    session.creating = false;
                    session.error = Some(e.to_string());
                }
                false
            },
        });
        if ok {
            info!(skill = %name, "skill created");
            self.load_skills_status(LoadOptions::default()).await;
            self.open_skill_editor(&name, source).await;
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("daily-report")]
    #[case("a")]
    #[case("v2")]
    #[case("web-search-2")]
    fn accepts_valid_names(#[case] name: &str) {
        assert_eq!(validate_skill_name(name), Ok(()));
    }

    #[rstest]
    #[case("", NameProblem::Required)]
    #[case("   ", NameProblem::Required)]
    #[case("../etc", NameProblem::PathSeparator)]
    #[case("a/b", NameProblem::PathSeparator)]
    #[case("a\\b", NameProblem::PathSeparator)]
    #[case("a..b", NameProblem::PathSeparator)]
    #[case("Daily", NameProblem::Invalid)]
    #[case("-lead", NameProblem::Invalid)]
    #[case("trail-", NameProblem::Invalid)]
    #[case("double--hyphen", NameProblem::Invalid)]
    #[case("snake_case", NameProblem::Invalid)]
    #[case("日报", NameProblem::Invalid)]
    fn rejects_invalid_names(#[case] name: &str, #[case] problem: NameProblem) {
        assert_eq!(validate_skill_name(name), Err(problem));
    }

    #[test]
    fn rejects_overlong_names() {
        assert_eq!(validate_skill_name(&"a".repeat(64)), Ok(()));
        assert_eq!(
            validate_skill_name(&"a".repeat(65)),
            Err(NameProblem::TooLong)
        );
    }

    #[test]
    fn name_errors_are_field_scoped() {
        let mut state = SkillsConfigState::new();
        open_create_skill(&mut state);
        update_create_name(&mut state, Locale::En, "Bad Name");
        let session = state.create.session().unwrap();
        assert_eq!(
            session.name_error.as_deref(),
            Some(text(Locale::En, Text::NameInvalid))
        );
        assert!(session.error.is_none());
        assert!(state.error.is_none());

        update_create_name(&mut state, Locale::En, "good-name");
        assert!(state.create.session().unwrap().name_error.is_none());
    }

    #[test]
    fn update_is_ignored_when_closed() {
        let mut state = SkillsConfigState::new();
        update_create_name(&mut state, Locale::En, "x");
        assert_eq!(state.create, CreateState::Closed);
    }

    #[test]
    fn closing_discards_the_draft() {
        let mut state = SkillsConfigState::new();
        open_create_skill(&mut state);
        update_create_name(&mut state, Locale::En, "half-typed");
        close_create_skill(&mut state);
        assert_eq!(state.create, CreateState::Closed);

        open_create_skill(&mut state);
        assert!(state.create.session().unwrap().name.is_empty());
    }
}
