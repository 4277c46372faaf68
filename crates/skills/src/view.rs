//! Rows for the skill list: the status report with buffered edits laid on top.

use clawpanel_protocol::skills::{SkillRequirementSet, SkillSource};

use crate::state::{AllowlistMode, SkillMessage, SkillsConfigState};

#[derive(Debug, Clone, PartialEq)]
pub struct SkillRow {
    pub skill_key: String,
    pub name: String,
    pub description: String,
    pub source: SkillSource,
    pub emoji: Option<String>,
    pub primary_env: Option<String>,
    /// Enabled state including any buffered toggle.
    pub enabled: bool,
    /// Allowed by the allow-list view being edited. Always true for
    /// non-bundled skills.
    pub allowed: bool,
    pub has_api_key: bool,
    pub eligible: bool,
    pub missing: SkillRequirementSet,
    /// Something for this skill is waiting to be saved.
    pub pending: bool,
    pub message: Option<SkillMessage>,
}

fn matches_filter(needle: &str, fields: [&str; 3]) -> bool {
    needle.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(needle))
}

/// Rows for every reported skill that matches `state.filter`, in report order.
pub fn skill_rows(state: &SkillsConfigState) -> Vec<SkillRow> {
    let Some(report) = &state.report else {
        return Vec::new();
    };
    let needle = state.filter.trim().to_lowercase();
    report
        .skills
        .iter()
        .filter(|entry| {
            matches_filter(&needle, [
                entry.name.as_str(),
                entry.description.as_str(),
                entry.skill_key.as_str(),
            ])
        })
        .map(|entry| {
            let key = entry.skill_key.as_str();
            let edit = state.edits.get(key);
            let persisted_key = state
                .config
                .as_ref()
                .and_then(|c| c.entry(key))
                .and_then(|e| e.api_key.as_deref())
                .is_some_and(|k| !k.is_empty());
            let allowed = entry.source != SkillSource::Bundled
                || state.allowlist_mode == AllowlistMode::All
                || state.allowlist_draft.contains(key);
            SkillRow {
                skill_key: entry.skill_key.clone(),
                name: entry.name.clone(),
                description: entry.description.clone(),
                source: entry.source,
                emoji: entry.emoji.clone(),
                primary_env: entry.primary_env.clone(),
                enabled: edit
                    .and_then(|e| e.enabled)
                    .unwrap_or(!entry.disabled),
                allowed,
                has_api_key: edit
                    .and_then(|e| e.api_key.as_deref())
                    .map_or(persisted_key, |k| !k.is_empty()),
                eligible: entry.eligible,
                missing: entry.missing.clone(),
                pending: edit.is_some_and(|e| !e.is_empty()),
                message: state.messages.get(key).cloned(),
            }
        })
        .collect()
}
