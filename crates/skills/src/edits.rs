//! Buffered per-skill edits and the dirty check.
//!
//! Every mutator reads (or creates) the record for a skill, changes one
//! facet, and writes the record back. Empty collections collapse to `None`
//! and an edit with nothing left in it is removed, so "has changes" is a
//! plain non-emptiness check.

use {
    crate::{
        allowlist,
        state::{SkillEdit, SkillsConfigState},
    },
    serde_json::{Value, json},
};

fn write_edit(state: &mut SkillsConfigState, skill_key: &str, f: impl FnOnce(&mut SkillEdit)) {
    let mut edit = state.edits.get(skill_key).cloned().unwrap_or_default();
    f(&mut edit);
    if edit.env.as_ref().is_some_and(|env| env.is_empty()) {
        edit.env = None;
    }
    if edit.config.as_ref().is_some_and(|cfg| cfg.is_empty()) {
        edit.config = None;
    }
    if edit.is_empty() {
        state.edits.remove(skill_key);
    } else {
        state.edits.insert(skill_key.to_string(), edit);
    }
}

pub fn update_skill_enabled_edit(state: &mut SkillsConfigState, skill_key: &str, enabled: bool) {
    write_edit(state, skill_key, |edit| edit.enabled = Some(enabled));
}

/// Buffer a new API key. An empty string asks the gateway to clear the key.
pub fn update_skill_api_key_edit(
    state: &mut SkillsConfigState,
    skill_key: &str,
    api_key: impl Into<String>,
) {
    let api_key = api_key.into();
    write_edit(state, skill_key, |edit| edit.api_key = Some(api_key));
}

pub fn clear_skill_api_key_edit(state: &mut SkillsConfigState, skill_key: &str) {
    write_edit(state, skill_key, |edit| edit.api_key = None);
}

/// Buffer a write of one environment variable. An empty value asks the
/// gateway to remove the variable.
pub fn update_skill_env(
    state: &mut SkillsConfigState,
    skill_key: &str,
    name: &str,
    value: impl Into<String>,
) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let value = value.into();
    write_edit(state, skill_key, |edit| {
        let mut env = edit.env.clone().unwrap_or_default();
        env.insert(name.to_string(), value);
        edit.env = Some(env);
    });
}

/// Drop a pending environment variable write.
pub fn remove_skill_env(state: &mut SkillsConfigState, skill_key: &str, name: &str) {
    let name = name.trim();
    write_edit(state, skill_key, |edit| {
        if let Some(env) = &edit.env {
            let mut env = env.clone();
            env.remove(name);
            edit.env = Some(env);
        }
    });
}

/// Buffer one top-level key of the skill's custom config.
pub fn update_skill_config(
    state: &mut SkillsConfigState,
    skill_key: &str,
    field: &str,
    value: Value,
) {
    write_edit(state, skill_key, |edit| {
        let mut config = edit.config.clone().unwrap_or_default();
        config.insert(field.to_string(), value);
        edit.config = Some(config);
    });
}

/// Drop a pending custom-config key.
pub fn remove_skill_config(state: &mut SkillsConfigState, skill_key: &str, field: &str) {
    write_edit(state, skill_key, |edit| {
        if let Some(config) = &edit.config {
            let mut config = config.clone();
            config.remove(field);
            edit.config = Some(config);
        }
    });
}

/// Mirror an allow-list toggle into the skill's edit record. Membership
/// matching the baseline leaves nothing to commit.
pub(crate) fn set_in_allowlist_edit(
    state: &mut SkillsConfigState,
    skill_key: &str,
    in_list: Option<bool>,
) {
    write_edit(state, skill_key, |edit| edit.in_allowlist = in_list);
}

/// Forget every buffered change for one skill.
pub fn discard_skill_edits(state: &mut SkillsConfigState, skill_key: &str) {
    let had_allowlist_edit = state
        .edits
        .get(skill_key)
        .is_some_and(|e| e.in_allowlist.is_some());
    state.edits.remove(skill_key);
    if had_allowlist_edit {
        let baseline = state.original_allowlist().contains(skill_key);
        let mut draft = state.allowlist_draft.clone();
        if baseline {
            draft.insert(skill_key.to_string());
        } else {
            draft.remove(skill_key);
        }
        state.allowlist_draft = draft;
    }
}

/// Forget every buffered change and re-derive the allow-list view from the baseline.
pub fn discard_all_changes(state: &mut SkillsConfigState) {
    state.edits.clear();
    let Some(original) = state.original.clone() else {
        state.allowlist_mode = Default::default();
        state.allowlist_draft.clear();
        return;
    };
    let hash = state.base_hash.clone();
    let report = state.report.take();
    state.apply_snapshot(report.clone().unwrap_or_default(), original, hash);
    state.report = report;
}

/// True when saving would send anything to the gateway.
///
/// Evaluated on demand; call it again after every mutation.
pub fn has_skills_config_changes(state: &SkillsConfigState) -> bool {
    state.edits.values().any(|edit| !edit.is_empty()) || allowlist::allowlist_changed(state)
}

/// One `skills.update` call in a save flush.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub skill_key: String,
    pub facet: UpdateFacet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateFacet {
    Enabled(bool),
    ApiKey(String),
    Env(std::collections::BTreeMap<String, String>),
    Config(serde_json::Map<String, Value>),
}

impl PendingUpdate {
    /// Params for `skills.update`.
    pub fn params(&self) -> Value {
        let mut params = json!({ "skillKey": self.skill_key });
        let (field, value) = match &self.facet {
            UpdateFacet::Enabled(v) => ("enabled", json!(v)),
            UpdateFacet::ApiKey(v) => ("apiKey", json!(v)),
            UpdateFacet::Env(v) => ("env", json!(v)),
            UpdateFacet::Config(v) => ("config", Value::Object(v.clone())),
        };
        params[field] = value;
        params
    }
}

/// The ordered list of writes a save will issue: skills in key order, and
/// within a skill `enabled`, `apiKey`, `env`, `config`.
pub fn pending_updates(state: &SkillsConfigState) -> Vec<PendingUpdate> {
    let mut out = Vec::new();
    for (key, edit) in &state.edits {
        let mut push = |facet| {
            out.push(PendingUpdate {
                skill_key: key.clone(),
                facet,
            })
        };
        if let Some(enabled) = edit.enabled {
            push(UpdateFacet::Enabled(enabled));
        }
        if let Some(api_key) = &edit.api_key {
            push(UpdateFacet::ApiKey(api_key.clone()));
        }
        if let Some(env) = edit.env.as_ref().filter(|e| !e.is_empty()) {
            push(UpdateFacet::Env(env.clone()));
        }
        if let Some(config) = edit.config.as_ref().filter(|c| !c.is_empty()) {
            push(UpdateFacet::Config(config.clone()));
        }
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*, crate::state::AllowlistMode, clawpanel_protocol::skills::SkillsConfig,
        rstest::rstest,
    };

    fn loaded(list: Option<Vec<&str>>) -> SkillsConfigState {
        let mut state = SkillsConfigState::new();
        state.apply_snapshot(
            Default::default(),
            SkillsConfig {
                allow_bundled: list.map(|l| l.into_iter().map(String::from).collect()),
                ..Default::default()
            },
            Some("h0".into()),
        );
        state
    }

    #[rstest]
    #[case("cron", true)]
    #[case("cron", false)]
    #[case("web_search", false)]
    fn enabled_edit_is_recorded_and_dirty(#[case] key: &str, #[case] value: bool) {
        let mut state = loaded(None);
        assert!(!has_skills_config_changes(&state));
        update_skill_enabled_edit(&mut state, key, value);
        assert_eq!(state.edits[key].enabled, Some(value));
        assert!(has_skills_config_changes(&state));
    }

    #[test]
    fn removing_last_env_var_prunes_record() {
        let mut state = loaded(None);
        update_skill_env(&mut state, "weather", "API_HOST", "api.example");
        update_skill_env(&mut state, "weather", "UNITS", "metric");
        remove_skill_env(&mut state, "weather", "API_HOST");
        assert_eq!(state.edits["weather"].env.as_ref().unwrap().len(), 1);

        remove_skill_env(&mut state, "weather", "UNITS");
        assert!(!state.edits.contains_key("weather"));
        assert!(!has_skills_config_changes(&state));
    }

    #[test]
    fn env_removal_keeps_other_facets() {
        let mut state = loaded(None);
        update_skill_enabled_edit(&mut state, "weather", true);
        update_skill_env(&mut state, "weather", "UNITS", "metric");
        remove_skill_env(&mut state, "weather", "UNITS");
        let edit = &state.edits["weather"];
        assert_eq!(edit.enabled, Some(true));
        assert!(edit.env.is_none());
    }

    #[test]
    fn blank_env_name_is_ignored() {
        let mut state = loaded(None);
        update_skill_env(&mut state, "weather", "  ", "x");
        assert!(state.edits.is_empty());
    }

    #[test]
    fn env_names_are_trimmed_on_removal() {
        let mut state = loaded(None);
        update_skill_env(&mut state, "weather", " UNITS ", "metric");
        remove_skill_env(&mut state, "weather", "  UNITS");
        assert!(state.edits.is_empty());
    }

    #[test]
    fn removing_unknown_env_var_creates_nothing() {
        let mut state = loaded(None);
        remove_skill_env(&mut state, "weather", "NOPE");
        assert!(state.edits.is_empty());
    }

    #[test]
    fn config_edits_collapse_when_emptied() {
        let mut state = loaded(None);
        update_skill_config(&mut state, "browser", "headless", json!(true));
        assert_eq!(state.edits["browser"].config.as_ref().unwrap()["headless"], true);
        remove_skill_config(&mut state, "browser", "headless");
        assert!(state.edits.is_empty());
    }

    #[test]
    fn api_key_edit_can_be_cleared() {
        let mut state = loaded(None);
        update_skill_api_key_edit(&mut state, "web_search", "sk-1");
        assert!(has_skills_config_changes(&state));
        clear_skill_api_key_edit(&mut state, "web_search");
        assert!(!has_skills_config_changes(&state));
    }

    #[test]
    fn pending_updates_follow_key_then_facet_order() {
        let mut state = loaded(None);
        update_skill_config(&mut state, "weather", "units", json!("metric"));
        update_skill_enabled_edit(&mut state, "weather", true);
        update_skill_api_key_edit(&mut state, "cron", "k");
        update_skill_env(&mut state, "weather", "TZ", "UTC");

        let plan = pending_updates(&state);
        let order: Vec<(&str, &str)> = plan
            .iter()
            .map(|u| {
                let facet = match u.facet {
                    UpdateFacet::Enabled(_) => "enabled",
                    UpdateFacet::ApiKey(_) => "apiKey",
                    UpdateFacet::Env(_) => "env",
                    UpdateFacet::Config(_) => "config",
                };
                (u.skill_key.as_str(), facet)
            })
            .collect();
        assert_eq!(order, vec![
            ("cron", "apiKey"),
            ("weather", "enabled"),
            ("weather", "env"),
            ("weather", "config"),
        ]);
        assert_eq!(
            plan[2].params(),
            json!({ "skillKey": "weather", "env": { "TZ": "UTC" } })
        );
    }

    #[test]
    fn allowlist_only_edits_produce_no_skill_updates() {
        let mut state = loaded(Some(vec!["web_search"]));
        allowlist::toggle_allowlist_entry(&mut state, "exec", true);
        assert!(pending_updates(&state).is_empty());
        assert!(has_skills_config_changes(&state));
    }

    #[test]
    fn discard_all_restores_baseline_view() {
        let mut state = loaded(Some(vec!["web_search"]));
        update_skill_enabled_edit(&mut state, "cron", false);
        allowlist::set_allowlist_mode(&mut state, AllowlistMode::All);
        allowlist::toggle_allowlist_entry(&mut state, "exec", true);

        discard_all_changes(&mut state);
        assert!(state.edits.is_empty());
        assert_eq!(state.allowlist_mode, AllowlistMode::Whitelist);
        assert_eq!(state.allowlist_draft.len(), 1);
        assert!(!has_skills_config_changes(&state));
    }

    #[test]
    fn discard_one_skill_restores_its_membership() {
        let mut state = loaded(Some(vec!["web_search"]));
        allowlist::toggle_allowlist_entry(&mut state, "web_search", false);
        allowlist::toggle_allowlist_entry(&mut state, "exec", true);
        discard_skill_edits(&mut state, "web_search");
        assert!(state.allowlist_draft.contains("web_search"));
        assert!(state.allowlist_draft.contains("exec"));
        assert!(state.edits.contains_key("exec"));
    }
}
