//! The skills configuration aggregate and its modal sub-states.

use std::collections::{BTreeMap, BTreeSet};

use clawpanel_protocol::skills::{SkillSource, SkillStatusReport, SkillsConfig};

/// Whether bundled skills are gated by an explicit allow-list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllowlistMode {
    /// Every bundled skill is allowed (`allowBundled` absent or empty).
    #[default]
    All,
    /// Only skills in the draft set are allowed.
    Whitelist,
}

impl AllowlistMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Whitelist => "whitelist",
        }
    }
}

/// Buffered, not yet committed changes for one skill.
///
/// `env` holds pending variable writes keyed by variable name; an empty value
/// asks the gateway to remove the variable. `config` holds pending top-level
/// custom-config keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillEdit {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub env: Option<BTreeMap<String, String>>,
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
    pub in_allowlist: Option<bool>,
}

impl SkillEdit {
    /// No facet carries a change.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.api_key.is_none()
            && self.env.as_ref().is_none_or(BTreeMap::is_empty)
            && self.config.as_ref().is_none_or(serde_json::Map::is_empty)
            && self.in_allowlist.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

/// Transient per-skill banner shown after an async action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillMessage {
    pub kind: MessageKind,
    pub message: String,
}

impl SkillMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            message: message.into(),
        }
    }
}

/// Lifecycle of a modal once it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalStatus {
    Loading,
    Ready,
    Failed,
}

// ── Editor ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditorState {
    #[default]
    Closed,
    Open(EditorSession),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorSession {
    pub skill_name: String,
    pub source: SkillSource,
    pub status: ModalStatus,
    /// Working copy.
    pub content: String,
    /// Content as last read from or written to the gateway.
    pub original: String,
    pub path: Option<String>,
    pub saving: bool,
    pub error: Option<String>,
}

impl EditorState {
    pub fn session(&self) -> Option<&EditorSession> {
        match self {
            Self::Open(session) => Some(session),
            Self::Closed => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut EditorSession> {
        match self {
            Self::Open(session) => Some(session),
            Self::Closed => None,
        }
    }
}

// ── Preview ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PreviewState {
    #[default]
    Closed,
    Open(PreviewSession),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSession {
    pub skill_name: String,
    pub source: SkillSource,
    pub status: ModalStatus,
    pub content: String,
    pub error: Option<String>,
}

impl PreviewState {
    pub fn session(&self) -> Option<&PreviewSession> {
        match self {
            Self::Open(session) => Some(session),
            Self::Closed => None,
        }
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CreateState {
    #[default]
    Closed,
    Open(CreateSession),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateSession {
    pub name: String,
    /// Validation problem with `name`, scoped to the name field.
    pub name_error: Option<String>,
    pub creating: bool,
    pub error: Option<String>,
}

impl CreateState {
    pub fn session(&self) -> Option<&CreateSession> {
        match self {
            Self::Open(session) => Some(session),
            Self::Closed => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut CreateSession> {
        match self {
            Self::Open(session) => Some(session),
            Self::Closed => None,
        }
    }
}

// ── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DeleteState {
    #[default]
    Closed,
    Open(DeleteSession),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSession {
    pub skill_name: String,
    pub source: SkillSource,
    pub deleting: bool,
    pub error: Option<String>,
}

impl DeleteState {
    pub fn session(&self) -> Option<&DeleteSession> {
        match self {
            Self::Open(session) => Some(session),
            Self::Closed => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut DeleteSession> {
        match self {
            Self::Open(session) => Some(session),
            Self::Closed => None,
        }
    }
}

// ── Aggregate ────────────────────────────────────────────────────────────────

/// Everything the skills panel knows.
///
/// `config` and `original` are only ever replaced by a fresh load; local
/// changes live in `edits` and `allowlist_draft` until they are saved.
#[derive(Debug, Clone, Default)]
pub struct SkillsConfigState {
    pub loading: bool,
    pub saving: bool,
    /// Skill with a direct action (toggle, key save, install) in flight.
    pub busy_skill: Option<String>,
    /// Top-level error from the last failed flow.
    pub error: Option<String>,

    pub report: Option<SkillStatusReport>,
    pub config: Option<SkillsConfig>,
    pub original: Option<SkillsConfig>,
    /// Concurrency token of the config document `original` came from.
    pub base_hash: Option<String>,

    pub edits: BTreeMap<String, SkillEdit>,
    pub allowlist_mode: AllowlistMode,
    pub allowlist_draft: BTreeSet<String>,
    pub messages: BTreeMap<String, SkillMessage>,

    /// Free-text filter over the skill list.
    pub filter: String,

    pub editor: EditorState,
    pub preview: PreviewState,
    pub create: CreateState,
    pub delete: DeleteState,
}

impl SkillsConfigState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow-list as persisted in the last fetched baseline.
    pub fn original_allowlist(&self) -> BTreeSet<String> {
        self.original
            .as_ref()
            .and_then(|c| c.allow_bundled.as_ref())
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Install a freshly fetched snapshot, replacing the baseline wholesale.
    ///
    /// The allow-list view is re-derived from the fetched list, then any
    /// pending per-skill allow-list edits are laid back on top of the draft.
    pub fn apply_snapshot(
        &mut self,
        report: SkillStatusReport,
        config: SkillsConfig,
        hash: Option<String>,
    ) {
        let fetched = config.allow_bundled().map(<[String]>::to_vec);
        self.allowlist_mode = match fetched {
            Some(_) => AllowlistMode::Whitelist,
            None => AllowlistMode::All,
        };
        let mut draft: BTreeSet<String> = fetched.unwrap_or_default().into_iter().collect();
        for (key, edit) in &self.edits {
            match edit.in_allowlist {
                Some(true) => {
                    draft.insert(key.clone());
                },
                Some(false) => {
                    draft.remove(key);
                },
                None => {},
            }
        }
        self.allowlist_draft = draft;

        self.report = Some(report);
        self.original = Some(config.clone());
        self.config = Some(config);
        self.base_hash = hash;
    }

    pub fn set_message(&mut self, skill_key: &str, message: SkillMessage) {
        self.messages.insert(skill_key.to_string(), message);
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(list: Option<Vec<&str>>) -> SkillsConfig {
        SkillsConfig {
            allow_bundled: list.map(|l| l.into_iter().map(String::from).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn snapshot_with_list_enters_whitelist_mode() {
        let mut state = SkillsConfigState::new();
        state.apply_snapshot(
            SkillStatusReport::default(),
            config_with(Some(vec!["web_search"])),
            Some("h1".into()),
        );
        assert_eq!(state.allowlist_mode, AllowlistMode::Whitelist);
        assert_eq!(
            state.allowlist_draft,
            BTreeSet::from(["web_search".to_string()])
        );
        assert_eq!(state.base_hash.as_deref(), Some("h1"));
        assert_eq!(state.config, state.original);
    }

    #[test]
    fn snapshot_with_empty_list_is_all_mode() {
        let mut state = SkillsConfigState::new();
        state.apply_snapshot(
            SkillStatusReport::default(),
            config_with(Some(vec![])),
            None,
        );
        assert_eq!(state.allowlist_mode, AllowlistMode::All);
        assert!(state.allowlist_draft.is_empty());
        assert!(state.base_hash.is_none());
    }

    #[test]
    fn pending_allowlist_edits_survive_reload() {
        let mut state = SkillsConfigState::new();
        state.edits.insert("exec".into(), SkillEdit {
            in_allowlist: Some(true),
            ..Default::default()
        });
        state.edits.insert("web_search".into(), SkillEdit {
            in_allowlist: Some(false),
            ..Default::default()
        });
        state.apply_snapshot(
            SkillStatusReport::default(),
            config_with(Some(vec!["web_search", "browser"])),
            Some("h2".into()),
        );
        assert_eq!(
            state.allowlist_draft,
            BTreeSet::from(["browser".to_string(), "exec".to_string()])
        );
    }

    #[test]
    fn empty_env_and_config_count_as_empty_edit() {
        let edit = SkillEdit {
            env: Some(BTreeMap::new()),
            config: Some(serde_json::Map::new()),
            ..Default::default()
        };
        assert!(edit.is_empty());
        assert!(
            !SkillEdit {
                enabled: Some(false),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn modals_start_closed() {
        let state = SkillsConfigState::new();
        assert_eq!(state.editor, EditorState::Closed);
        assert_eq!(state.preview, PreviewState::Closed);
        assert_eq!(state.create, CreateState::Closed);
        assert_eq!(state.delete, DeleteState::Closed);
    }
}
