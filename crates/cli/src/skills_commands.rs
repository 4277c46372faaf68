//! `clawpanel skills ...`: drives the skills controller the way the panel does.

use std::path::PathBuf;

use {
    anyhow::{Context, bail},
    clap::{Subcommand, ValueEnum},
    clawpanel_protocol::skills::{NodeManager, SkillSource},
    clawpanel_skills::{
        AllowlistMode, GlobalSetting, LoadOptions, SkillsConfigState, SkillsController, allowlist,
        create, delete, editor, edits, skill_rows,
    },
};

#[derive(Subcommand)]
pub enum SkillAction {
    /// List skills with their effective state.
    Status {
        /// Only show skills whose name, description or key contains this text.
        #[arg(long)]
        filter: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Enable a skill.
    Enable { key: String },
    /// Disable a skill.
    Disable { key: String },
    /// Set a skill's API key. An empty value clears it.
    SetKey { key: String, value: String },
    /// Set an environment variable for a skill.
    SetEnv {
        key: String,
        name: String,
        value: String,
    },
    /// Remove an environment variable from a skill.
    UnsetEnv { key: String, name: String },
    /// Inspect or change the bundled-skill allow-list.
    Allowlist {
        #[command(subcommand)]
        action: AllowlistAction,
    },
    /// Replace the extra skill directories. No arguments removes them.
    ExtraDirs { dirs: Vec<String> },
    /// Change a global skills setting. Omit the value to reset it.
    Setting {
        name: SettingName,
        value: Option<String>,
    },
    /// Run one of a skill's dependency installers.
    Install {
        key: String,
        name: String,
        install_id: String,
    },
    /// Print a skill's SKILL.md.
    Cat {
        name: String,
        #[arg(long, default_value = "workspace")]
        source: SkillSource,
    },
    /// Create a workspace skill from the starter template.
    Create { name: String },
    /// Delete a skill.
    Delete {
        name: String,
        #[arg(long, default_value = "workspace")]
        source: SkillSource,
    },
    /// Replace a skill's SKILL.md with the contents of a local file.
    Write {
        name: String,
        #[arg(long, default_value = "workspace")]
        source: SkillSource,
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum AllowlistAction {
    /// Show the mode and the allowed bundled skills.
    Show,
    /// Allow every bundled skill.
    All,
    /// Add skills to the allow-list.
    Add {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Remove skills from the allow-list.
    Remove {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SettingName {
    Watch,
    WatchDebounceMs,
    PreferBrew,
    NodeManager,
}

fn parse_setting(name: SettingName, value: Option<&str>) -> anyhow::Result<GlobalSetting> {
    Ok(match name {
        SettingName::Watch => GlobalSetting::Watch(value.map(str::parse).transpose()?),
        SettingName::WatchDebounceMs => {
            GlobalSetting::WatchDebounceMs(value.map(str::parse).transpose()?)
        },
        SettingName::PreferBrew => GlobalSetting::PreferBrew(value.map(str::parse).transpose()?),
        SettingName::NodeManager => GlobalSetting::NodeManager(
            value
                .map(str::parse::<NodeManager>)
                .transpose()
                .map_err(anyhow::Error::msg)?,
        ),
    })
}

pub async fn handle_skills(ctl: &SkillsController, action: SkillAction) -> anyhow::Result<()> {
    ctl.load_skills_status(LoadOptions {
        clear_messages: true,
    })
    .await;
    check(&ctl.snapshot(), None)?;

    match action {
        SkillAction::Status { filter, json } => {
            ctl.with_state(|s| s.filter = filter.unwrap_or_default());
            print_status(&ctl.snapshot(), json)?;
            return Ok(());
        },
        SkillAction::Enable { key } => {
            ctl.update_skill_enabled(&key, true).await;
            return report(ctl, &key);
        },
        SkillAction::Disable { key } => {
            ctl.update_skill_enabled(&key, false).await;
            return report(ctl, &key);
        },
        SkillAction::SetKey { key, value } => {
            ctl.with_state(|s| edits::update_skill_api_key_edit(s, &key, value));
            ctl.save_skill_api_key(&key).await;
            return report(ctl, &key);
        },
        SkillAction::SetEnv { key, name, value } => {
            if value.is_empty() {
                bail!("use `unset-env` to remove a variable");
            }
            ctl.with_state(|s| edits::update_skill_env(s, &key, &name, value));
            ctl.save_skills_config().await;
        },
        SkillAction::UnsetEnv { key, name } => {
            ctl.with_state(|s| edits::update_skill_env(s, &key, &name, ""));
            ctl.save_skills_config().await;
        },
        SkillAction::Allowlist { action } => return handle_allowlist(ctl, action).await,
        SkillAction::ExtraDirs { dirs } => ctl.update_extra_dirs(&dirs).await,
        SkillAction::Setting { name, value } => {
            let setting = parse_setting(name, value.as_deref())?;
            ctl.update_global_setting(setting).await;
        },
        SkillAction::Install {
            key,
            name,
            install_id,
        } => {
            ctl.install_skill(&key, &name, &install_id).await;
            return report(ctl, &key);
        },
        SkillAction::Cat { name, source } => {
            ctl.open_skill_preview(&name, source).await;
            let state = ctl.snapshot();
            if let Some(preview) = state.preview.session() {
                if let Some(error) = &preview.error {
                    bail!("{error}");
                }
                print!("{}", preview.content);
            }
            return Ok(());
        },
        SkillAction::Create { name } => {
            let locale = ctl.locale();
            ctl.with_state(|s| {
                create::open_create_skill(s);
                create::update_create_name(s, locale, name.as_str());
            });
            ctl.confirm_create_skill().await;
            let state = ctl.snapshot();
            if let Some(session) = state.create.session() {
                let problem = session.name_error.as_ref().or(session.error.as_ref());
                bail!("{}", problem.map_or("skill was not created", String::as_str));
            }
            if let Some(session) = state.editor.session() {
                println!("created {}", session.path.as_deref().unwrap_or(&session.skill_name));
            }
        },
        SkillAction::Delete { name, source } => {
            ctl.with_state(|s| delete::open_delete_skill(s, &name, source));
            check(&ctl.snapshot(), None)?;
            ctl.confirm_delete_skill().await;
            if let Some(session) = ctl.snapshot().delete.session() {
                bail!("{}", session.error.as_deref().unwrap_or("skill was not deleted"));
            }
        },
        SkillAction::Write { name, source, file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            ctl.open_skill_editor(&name, source).await;
            ctl.with_state(|s| editor::update_editor_content(s, content));
            let changed = ctl.with_state(|s| editor::has_editor_changes(s));
            if changed {
                ctl.save_skill_file().await;
            }
            let state = ctl.snapshot();
            if let Some(error) = state.editor.session().and_then(|e| e.error.as_ref()) {
                bail!("{error}");
            }
            if !changed {
                println!("{name} is unchanged");
                return Ok(());
            }
        },
    }

    check(&ctl.snapshot(), None)?;
    println!("saved");
    Ok(())
}

async fn handle_allowlist(ctl: &SkillsController, action: AllowlistAction) -> anyhow::Result<()> {
    match action {
        AllowlistAction::Show => {
            let state = ctl.snapshot();
            println!("mode: {}", state.allowlist_mode.as_str());
            for key in &state.allowlist_draft {
                println!("  {key}");
            }
            return Ok(());
        },
        AllowlistAction::All => {
            ctl.with_state(|s| allowlist::set_allowlist_mode(s, AllowlistMode::All));
        },
        AllowlistAction::Add { keys } => ctl.with_state(|s| {
            allowlist::set_allowlist_mode(s, AllowlistMode::Whitelist);
            for key in &keys {
                allowlist::toggle_allowlist_entry(s, key, true);
            }
        }),
        AllowlistAction::Remove { keys } => ctl.with_state(|s| {
            allowlist::set_allowlist_mode(s, AllowlistMode::Whitelist);
            for key in &keys {
                allowlist::toggle_allowlist_entry(s, key, false);
            }
        }),
    }

    if !ctl.with_state(|s| edits::has_skills_config_changes(s)) {
        println!("allow-list unchanged");
        return Ok(());
    }
    ctl.save_skills_config().await;
    check(&ctl.snapshot(), None)?;
    println!("saved");
    Ok(())
}

/// Fail with the state's error, or the error banner for `skill_key`.
fn check(state: &SkillsConfigState, skill_key: Option<&str>) -> anyhow::Result<()> {
    if let Some(error) = &state.error {
        bail!("{error}");
    }
    if let Some(message) = skill_key.and_then(|k| state.messages.get(k))
        && message.kind == clawpanel_skills::state::MessageKind::Error
    {
        bail!("{}", message.message);
    }
    Ok(())
}

/// Print the banner left by a direct action on `skill_key`.
fn report(ctl: &SkillsController, skill_key: &str) -> anyhow::Result<()> {
    let state = ctl.snapshot();
    check(&state, Some(skill_key))?;
    if let Some(message) = state.messages.get(skill_key) {
        println!("{skill_key}: {}", message.message);
    }
    Ok(())
}

fn print_status(state: &SkillsConfigState, json: bool) -> anyhow::Result<()> {
    let rows = skill_rows(state);
    if json {
        let entries: Vec<serde_json::Value> = rows
            .iter()
            .map(|r| {
                serde_json::json!({
                    "skillKey": r.skill_key,
                    "name": r.name,
                    "source": r.source,
                    "enabled": r.enabled,
                    "allowed": r.allowed,
                    "eligible": r.eligible,
                    "hasApiKey": r.has_api_key,
                    "missing": r.missing,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No skills found.");
        return Ok(());
    }
    println!("allow-list: {}", state.allowlist_mode.as_str());
    for row in &rows {
        let status = match (row.enabled, row.allowed, row.eligible) {
            (false, ..) => "disabled",
            (true, false, _) => "blocked",
            (true, true, false) => "missing requirements",
            (true, true, true) => "ready",
        };
        let emoji = row.emoji.as_deref().unwrap_or(" ");
        println!("{emoji} {:<24} {:<10} {status}", row.name, row.source.as_str());
        if !row.missing.is_empty() {
            let missing: Vec<&str> = row
                .missing
                .bins
                .iter()
                .chain(&row.missing.env)
                .chain(&row.missing.config)
                .chain(&row.missing.os)
                .map(String::as_str)
                .collect();
            println!("    missing: {}", missing.join(", "));
        }
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_by_kind() {
        assert_eq!(
            parse_setting(SettingName::Watch, Some("true")).unwrap(),
            GlobalSetting::Watch(Some(true))
        );
        assert_eq!(
            parse_setting(SettingName::WatchDebounceMs, Some("250")).unwrap(),
            GlobalSetting::WatchDebounceMs(Some(250))
        );
        assert_eq!(
            parse_setting(SettingName::NodeManager, Some("bun")).unwrap(),
            GlobalSetting::NodeManager(Some(NodeManager::Bun))
        );
        assert_eq!(
            parse_setting(SettingName::PreferBrew, None).unwrap(),
            GlobalSetting::PreferBrew(None)
        );
    }

    #[test]
    fn bad_setting_values_are_rejected() {
        assert!(parse_setting(SettingName::Watch, Some("yes please")).is_err());
        assert!(parse_setting(SettingName::NodeManager, Some("cargo")).is_err());
    }
}
