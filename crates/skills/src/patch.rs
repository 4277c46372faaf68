//! Merge-patch documents for the `skills` sub-tree of the gateway config.
//!
//! Patches follow RFC 7386: a `null` leaf deletes the key, any other value
//! replaces the subtree wholesale. Arrays are never merged element-wise; the
//! gateway applies the patch against the document identified by `baseHash`.

use {
    clawpanel_protocol::skills::NodeManager,
    serde_json::{Map, Value, json},
};

/// Build `{ "skills": { <path...>: value } }`, with `None` encoded as `null`.
pub fn build_skills_patch(path: &[&str], value: Option<Value>) -> Value {
    let mut node = value.unwrap_or(Value::Null);
    for segment in path.iter().rev() {
        let mut map = Map::new();
        map.insert((*segment).to_string(), node);
        node = Value::Object(map);
    }
    json!({ "skills": node })
}

/// Split a dotted field name (`load.extraDirs`) into path segments.
pub fn field_path(field: &str) -> Vec<&str> {
    field
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Global skills settings editable from the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalSetting {
    /// `skills.load.watch`
    Watch(Option<bool>),
    /// `skills.load.watchDebounceMs`
    WatchDebounceMs(Option<u64>),
    /// `skills.install.preferBrew`
    PreferBrew(Option<bool>),
    /// `skills.install.nodeManager`
    NodeManager(Option<NodeManager>),
}

impl GlobalSetting {
    pub fn path(&self) -> [&'static str; 2] {
        match self {
            Self::Watch(_) => ["load", "watch"],
            Self::WatchDebounceMs(_) => ["load", "watchDebounceMs"],
            Self::PreferBrew(_) => ["install", "preferBrew"],
            Self::NodeManager(_) => ["install", "nodeManager"],
        }
    }

    /// The patch value; `None` deletes the setting.
    pub fn value(&self) -> Option<Value> {
        match self {
            Self::Watch(v) | Self::PreferBrew(v) => v.map(Value::Bool),
            Self::WatchDebounceMs(v) => v.map(|ms| json!(ms)),
            Self::NodeManager(v) => v.map(|nm| json!(nm)),
        }
    }
}

/// Normalise an extra-dirs list: trimmed, de-duplicated, order kept. An empty
/// list deletes the setting.
pub fn normalize_extra_dirs(dirs: &[String]) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let dir = dir.trim();
        if !dir.is_empty() && !out.iter().any(|d| d == dir) {
            out.push(dir.to_string());
        }
    }
    (!out.is_empty()).then_some(out)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_becomes_explicit_null() {
        assert_eq!(
            build_skills_patch(&["allowBundled"], None),
            json!({ "skills": { "allowBundled": null } })
        );
    }

    #[test]
    fn nested_path_builds_nested_objects() {
        assert_eq!(
            build_skills_patch(&field_path("load.extraDirs"), Some(json!(["/a"]))),
            json!({ "skills": { "load": { "extraDirs": ["/a"] } } })
        );
    }

    #[test]
    fn field_path_ignores_empty_segments() {
        assert_eq!(field_path(" install..nodeManager "), vec!["install", "nodeManager"]);
    }

    #[test]
    fn global_setting_values() {
        assert_eq!(GlobalSetting::Watch(Some(true)).value(), Some(json!(true)));
        assert_eq!(
            GlobalSetting::NodeManager(Some(NodeManager::Pnpm)).value(),
            Some(json!("pnpm"))
        );
        assert_eq!(GlobalSetting::WatchDebounceMs(None).value(), None);
        assert_eq!(GlobalSetting::PreferBrew(None).path(), ["install", "preferBrew"]);
    }

    #[test]
    fn extra_dirs_are_normalised() {
        let dirs: Vec<String> = vec![
            " /opt/skills ".into(),
            "".into(),
            "/opt/skills".into(),
            "~/more".into(),
        ];
        assert_eq!(
            normalize_extra_dirs(&dirs),
            Some(vec!["/opt/skills".to_string(), "~/more".to_string()])
        );
        assert_eq!(normalize_extra_dirs(&["  ".to_string()]), None);
    }
}
