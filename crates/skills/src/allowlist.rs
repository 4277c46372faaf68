//! Two-mode allow-list view over `skills.allowBundled`.

use {
    crate::{
        edits,
        state::{AllowlistMode, SkillsConfigState},
    },
    tracing::debug,
};

/// Switch between "all bundled skills" and an explicit whitelist.
///
/// The draft is left alone: entering whitelist mode with an empty draft stays
/// empty, and switching back and forth keeps whatever the user staged.
pub fn set_allowlist_mode(state: &mut SkillsConfigState, mode: AllowlistMode) {
    if state.allowlist_mode != mode {
        debug!(mode = mode.as_str(), "allow-list mode changed");
    }
    state.allowlist_mode = mode;
}

/// Stage adding or removing `skill_key` from the whitelist draft.
///
/// The draft set is replaced rather than mutated in place, and the change is
/// mirrored into the skill's edit record so the regular save path commits it.
pub fn toggle_allowlist_entry(state: &mut SkillsConfigState, skill_key: &str, in_list: bool) {
    let mut draft = state.allowlist_draft.clone();
    if in_list {
        draft.insert(skill_key.to_string());
    } else {
        draft.remove(skill_key);
    }
    state.allowlist_draft = draft;

    let baseline = state.original_allowlist().contains(skill_key);
    let mirror = (in_list != baseline).then_some(in_list);
    edits::set_in_allowlist_edit(state, skill_key, mirror);
}

/// Whether the allow-list view differs from the persisted list.
///
/// In whitelist mode the draft is compared by membership; in "all" mode any
/// persisted list is a change, since saving will delete it.
pub fn allowlist_changed(state: &SkillsConfigState) -> bool {
    let original = state
        .original
        .as_ref()
        .and_then(|c| c.allow_bundled.as_ref());
    match state.allowlist_mode {
        AllowlistMode::Whitelist => {
            let original = state.original_allowlist();
            original.len() != state.allowlist_draft.len()
                || !state.allowlist_draft.iter().all(|k| original.contains(k))
        },
        AllowlistMode::All => original.is_some_and(|list| !list.is_empty()),
    }
}

/// The value a save should write to `skills.allowBundled`, if any.
///
/// `Some(Some(list))` replaces the list, `Some(None)` deletes it, and `None`
/// means the persisted list already matches.
pub fn allowlist_patch(state: &SkillsConfigState) -> Option<Option<Vec<String>>> {
    if !allowlist_changed(state) {
        return None;
    }
    Some(match state.allowlist_mode {
        AllowlistMode::Whitelist => Some(state.allowlist_draft.iter().cloned().collect()),
        AllowlistMode::All => None,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::edits::has_skills_config_changes,
        clawpanel_protocol::skills::SkillsConfig,
        std::collections::BTreeSet,
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

    #[test]
    fn whitelist_mode_twice_keeps_draft() {
        let mut state = loaded(None);
        set_allowlist_mode(&mut state, AllowlistMode::Whitelist);
        toggle_allowlist_entry(&mut state, "exec", true);
        set_allowlist_mode(&mut state, AllowlistMode::Whitelist);
        set_allowlist_mode(&mut state, AllowlistMode::Whitelist);
        assert_eq!(state.allowlist_draft, BTreeSet::from(["exec".to_string()]));
    }

    #[test]
    fn entering_whitelist_does_not_populate_draft() {
        let mut state = loaded(None);
        set_allowlist_mode(&mut state, AllowlistMode::Whitelist);
        assert!(state.allowlist_draft.is_empty());
        assert!(!has_skills_config_changes(&state));
    }

    #[test]
    fn toggle_round_trip_leaves_no_residue() {
        let mut state = loaded(Some(vec!["web_search"]));
        let before = state.allowlist_draft.clone();

        toggle_allowlist_entry(&mut state, "exec", true);
        assert_eq!(state.edits["exec"].in_allowlist, Some(true));
        toggle_allowlist_entry(&mut state, "exec", false);

        assert_eq!(state.allowlist_draft, before);
        assert!(!state.edits.contains_key("exec"));
        assert!(!has_skills_config_changes(&state));
    }

    #[test]
    fn removing_a_persisted_entry_is_mirrored() {
        let mut state = loaded(Some(vec!["web_search"]));
        toggle_allowlist_entry(&mut state, "web_search", false);
        assert_eq!(state.edits["web_search"].in_allowlist, Some(false));
        assert!(state.allowlist_draft.is_empty());
        assert!(has_skills_config_changes(&state));
    }

    #[test]
    fn growing_the_whitelist_is_a_change() {
        let mut state = loaded(Some(vec!["web_search"]));
        assert_eq!(state.allowlist_mode, AllowlistMode::Whitelist);
        toggle_allowlist_entry(&mut state, "exec", true);
        assert!(has_skills_config_changes(&state));
        assert_eq!(
            allowlist_patch(&state),
            Some(Some(vec!["exec".to_string(), "web_search".to_string()]))
        );
    }

    #[test]
    fn same_size_different_members_is_a_change() {
        let mut state = loaded(Some(vec!["web_search"]));
        toggle_allowlist_entry(&mut state, "web_search", false);
        toggle_allowlist_entry(&mut state, "exec", true);
        assert_eq!(state.allowlist_draft.len(), 1);
        assert!(allowlist_changed(&state));
    }

    #[test]
    fn switching_to_all_deletes_persisted_list() {
        let mut state = loaded(Some(vec!["web_search"]));
        set_allowlist_mode(&mut state, AllowlistMode::All);
        assert!(allowlist_changed(&state));
        assert_eq!(allowlist_patch(&state), Some(None));
    }

    #[test]
    fn unchanged_views_need_no_patch() {
        assert_eq!(allowlist_patch(&loaded(None)), None);
        assert_eq!(allowlist_patch(&loaded(Some(vec!["web_search"]))), None);
    }

    #[test]
    fn empty_persisted_list_reads_as_all() {
        let state = loaded(Some(vec![]));
        assert_eq!(state.allowlist_mode, AllowlistMode::All);
        assert!(!allowlist_changed(&state));
        assert_eq!(allowlist_patch(&state), None);
    }
}
