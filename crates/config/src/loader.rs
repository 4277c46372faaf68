use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::PanelConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "clawpanel.toml",
    "clawpanel.yaml",
    "clawpanel.yml",
    "clawpanel.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PanelConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./clawpanel.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/clawpanel/clawpanel.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PanelConfig::default()` if no config file is found. Environment
/// overrides are applied in every case.
pub fn discover_and_load() -> PanelConfig {
    let mut config = match find_config_file() {
        Some(path) => load_or_default(&path),
        None => {
            debug!("no config file found, using defaults");
            PanelConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Load an explicit path, falling back to defaults when it cannot be parsed.
pub fn load_or_default(path: &Path) -> PanelConfig {
    debug!(path = %path.display(), "loading config");
    match load_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            PanelConfig::default()
        },
    }
}

/// Apply `CLAWPANEL_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut PanelConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut PanelConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("CLAWPANEL_GATEWAY_URL").filter(|v| !v.is_empty()) {
        config.gateway.url = url;
    }
    if let Some(token) = lookup("CLAWPANEL_GATEWAY_TOKEN").filter(|v| !v.is_empty()) {
        config.gateway.token = Some(Secret::new(token));
    }
    if let Some(locale) = lookup("CLAWPANEL_LOCALE") {
        match locale.parse() {
            Ok(locale) => config.ui.locale = locale,
            Err(e) => warn!(error = %e, "ignoring CLAWPANEL_LOCALE"),
        }
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    find_in(Path::new("."), config_dir().as_deref())
}

fn find_in(local_dir: &Path, user_dir: Option<&Path>) -> Option<PathBuf> {
    let dirs = std::iter::once(local_dir).chain(user_dir);
    for dir in dirs {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Returns the user-global config directory (`~/.config/clawpanel/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "clawpanel").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PanelConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::Locale, secrecy::ExposeSecret};

    #[test]
    fn local_file_wins_over_user_dir() {
        let local = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        std::fs::write(user.path().join("clawpanel.toml"), "").unwrap();
        std::fs::write(local.path().join("clawpanel.yaml"), "").unwrap();

        let found = find_in(local.path(), Some(user.path())).unwrap();
        assert_eq!(found, local.path().join("clawpanel.yaml"));
    }

    #[test]
    fn falls_back_to_user_dir() {
        let local = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        std::fs::write(user.path().join("clawpanel.json"), "{}").unwrap();

        let found = find_in(local.path(), Some(user.path())).unwrap();
        assert_eq!(found, user.path().join("clawpanel.json"));
        assert!(find_in(local.path(), None).is_none());
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("clawpanel.yaml");
        std::fs::write(&yaml, "gateway:\n  url: ws://10.0.0.2:18789\n  rpc_timeout_secs: 30\n")
            .unwrap();
        let cfg = load_config(&yaml).unwrap();
        assert_eq!(cfg.gateway.url, "ws://10.0.0.2:18789");
        assert_eq!(cfg.gateway.rpc_timeout_secs, 30);

        let json = dir.path().join("clawpanel.json");
        std::fs::write(&json, r#"{"ui":{"locale":"en"}}"#).unwrap();
        let cfg = load_config(&json).unwrap();
        assert_eq!(cfg.ui.locale, Locale::En);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clawpanel.toml");
        std::fs::write(&path, "[gateway\nurl = ").unwrap();
        let cfg = load_or_default(&path);
        assert_eq!(cfg.gateway.url, PanelConfig::default().gateway.url);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clawpanel.ini");
        std::fs::write(&path, "url=x").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = PanelConfig::default();
        apply_env_overrides_with(&mut cfg, |name| match name {
            "CLAWPANEL_GATEWAY_URL" => Some("wss://gw.internal".into()),
            "CLAWPANEL_GATEWAY_TOKEN" => Some("abc".into()),
            "CLAWPANEL_LOCALE" => Some("en".into()),
            _ => None,
        });
        assert_eq!(cfg.gateway.url, "wss://gw.internal");
        assert_eq!(
            cfg.gateway.token.as_ref().map(|t| t.expose_secret().clone()),
            Some("abc".to_string())
        );
        assert_eq!(cfg.ui.locale, Locale::En);
    }

    #[test]
    fn invalid_locale_override_is_ignored() {
        let mut cfg = PanelConfig::default();
        apply_env_overrides_with(&mut cfg, |name| {
            (name == "CLAWPANEL_LOCALE").then(|| "klingon".to_string())
        });
        assert_eq!(cfg.ui.locale, Locale::ZhCn);
    }
}
