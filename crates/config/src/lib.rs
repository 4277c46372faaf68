//! Console configuration loading and env substitution.
//!
//! Config files: `clawpanel.toml`, `clawpanel.yaml`, or `clawpanel.json`
//! Searched in `./` then `~/.config/clawpanel/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config, load_or_default},
    schema::{GatewayConfig, Locale, PanelConfig, UiConfig},
};
