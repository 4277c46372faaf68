//! Wire model for the skills RPC surface (`skills.*`) and the `skills`
//! sub-tree of the gateway config document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Status report ────────────────────────────────────────────────────────────

/// Where the gateway discovered a skill.
///
/// Older gateways prefix the names (`openclaw-bundled`); both spellings are
/// accepted and anything unrecognised is treated as [`SkillSource::Extra`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SkillSource {
    /// Shipped with the gateway; gated by `skills.allowBundled`.
    Bundled,
    /// Installed into the managed skills directory.
    Managed,
    /// Lives in the agent workspace.
    Workspace,
    /// Loaded from `skills.load.extraDirs`.
    Extra,
}

impl SkillSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::Managed => "managed",
            Self::Workspace => "workspace",
            Self::Extra => "extra",
        }
    }

    /// Bundled skills are read-only; everything else is backed by a file the
    /// gateway lets us rewrite or remove.
    pub fn is_editable(self) -> bool {
        !matches!(self, Self::Bundled)
    }
}

impl From<String> for SkillSource {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Self::Extra)
    }
}

impl std::fmt::Display for SkillSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SkillSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bundled" | "openclaw-bundled" => Ok(Self::Bundled),
            "managed" | "openclaw-managed" => Ok(Self::Managed),
            "workspace" | "openclaw-workspace" => Ok(Self::Workspace),
            "extra" | "openclaw-extra" => Ok(Self::Extra),
            other => Err(format!("unknown skill source: {other}")),
        }
    }
}

/// Requirement lists as declared by a skill (or the subset still missing).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillRequirementSet {
    pub bins: Vec<String>,
    pub env: Vec<String>,
    pub config: Vec<String>,
    pub os: Vec<String>,
}

impl SkillRequirementSet {
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty() && self.env.is_empty() && self.config.is_empty() && self.os.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillConfigCheck {
    pub path: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub satisfied: bool,
}

/// One way the gateway knows to install a missing dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInstallOption {
    pub id: String,
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub bins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillStatusEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub source: SkillSource,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub base_dir: String,
    pub skill_key: String,
    #[serde(default)]
    pub primary_env: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub always: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub blocked_by_allowlist: bool,
    #[serde(default)]
    pub eligible: bool,
    #[serde(default)]
    pub requirements: SkillRequirementSet,
    #[serde(default)]
    pub missing: SkillRequirementSet,
    #[serde(default)]
    pub config_checks: Vec<SkillConfigCheck>,
    #[serde(default)]
    pub install: Vec<SkillInstallOption>,
}

/// Payload of `skills.status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillStatusReport {
    #[serde(default)]
    pub workspace_dir: String,
    #[serde(default)]
    pub managed_skills_dir: String,
    #[serde(default)]
    pub skills: Vec<SkillStatusEntry>,
}

// ── Config document ──────────────────────────────────────────────────────────

/// Payload of `config.get`: the whole gateway config plus its concurrency token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub hash: Option<String>,
}

impl ConfigSnapshot {
    /// Extract the `skills` sub-tree. A missing or `null` subtree is an empty config.
    pub fn skills(&self) -> Result<SkillsConfig, serde_json::Error> {
        match self.config.get("skills") {
            Some(serde_json::Value::Null) | None => Ok(SkillsConfig::default()),
            Some(v) => serde_json::from_value(v.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl std::str::FromStr for NodeManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(Self::Npm),
            "pnpm" => Ok(Self::Pnpm),
            "yarn" => Ok(Self::Yarn),
            "bun" => Ok(Self::Bun),
            other => Err(format!("unknown node manager: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsLoadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_dirs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsInstallConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_brew: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_manager: Option<NodeManager>,
}

/// Persisted per-skill overrides under `skills.entries.<key>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillEntryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
}

/// The `skills` sub-tree of the gateway config.
///
/// Fields the console does not understand are kept in `extra` so a snapshot
/// can be inspected without losing information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_bundled: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<SkillsLoadConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<SkillsInstallConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<BTreeMap<String, SkillEntryConfig>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SkillsConfig {
    pub fn entry(&self, skill_key: &str) -> Option<&SkillEntryConfig> {
        self.entries.as_ref().and_then(|e| e.get(skill_key))
    }

    /// The allow-list, treating an empty list the same as an absent one.
    pub fn allow_bundled(&self) -> Option<&[String]> {
        self.allow_bundled
            .as_deref()
            .filter(|list| !list.is_empty())
    }
}

// ── Skill files & installs ───────────────────────────────────────────────────

/// Payload of `skills.file.read`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillFileContent {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Payload of `skills.install`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInstallResult {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn snapshot_without_skills_is_empty_config() {
        let snap = ConfigSnapshot {
            config: json!({ "gateway": { "port": 18789 } }),
            hash: Some("h1".into()),
        };
        assert_eq!(snap.skills().unwrap(), SkillsConfig::default());
    }

    #[test]
    fn skills_config_keeps_unknown_fields() {
        let snap = ConfigSnapshot {
            config: json!({
                "skills": {
                    "allowBundled": ["web_search"],
                    "load": { "watch": true, "extraDirs": ["/opt/skills"] },
                    "install": { "nodeManager": "pnpm" },
                    "entries": { "cron": { "enabled": false, "env": { "TZ": "UTC" } } },
                    "experimental": { "ranking": "v2" }
                }
            }),
            hash: None,
        };
        let skills = snap.skills().unwrap();
        assert_eq!(skills.allow_bundled(), Some(&["web_search".to_string()][..]));
        assert_eq!(
            skills.install.as_ref().and_then(|i| i.node_manager),
            Some(NodeManager::Pnpm)
        );
        assert_eq!(skills.entry("cron").and_then(|e| e.enabled), Some(false));
        assert!(skills.extra.contains_key("experimental"));
    }

    #[test]
    fn empty_allow_list_reads_as_absent() {
        let skills = SkillsConfig {
            allow_bundled: Some(vec![]),
            ..Default::default()
        };
        assert!(skills.allow_bundled().is_none());
    }

    #[test]
    fn legacy_source_names_and_unknown_sources() {
        let entry: SkillStatusEntry = serde_json::from_value(json!({
            "name": "weather",
            "source": "openclaw-bundled",
            "skillKey": "weather"
        }))
        .unwrap();
        assert_eq!(entry.source, SkillSource::Bundled);
        assert!(!entry.source.is_editable());

        let entry: SkillStatusEntry = serde_json::from_value(json!({
            "name": "odd",
            "source": "plugin-dir",
            "skillKey": "odd"
        }))
        .unwrap();
        assert_eq!(entry.source, SkillSource::Extra);
    }
}
