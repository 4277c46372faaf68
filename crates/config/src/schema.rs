/// Console config schema (gateway connection, UI preferences).
use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, Serializer},
};

/// Top-level console configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub gateway: GatewayConfig,
    pub ui: UiConfig,
}

/// How to reach the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// WebSocket URL of the gateway RPC endpoint.
    pub url: String,
    /// Shared gateway token.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Gateway password, for deployments that use password auth instead of a token.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret<String>>,
    /// Timeout applied to every RPC call unless the call supplies its own.
    pub rpc_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            token: None,
            password: None,
            rpc_timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

fn default_gateway_url() -> String {
    "ws://127.0.0.1:18789".into()
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

/// UI language for banners and templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "zh-CN", alias = "zh", alias = "zh_CN")]
    ZhCn,
    #[serde(rename = "en", alias = "en-US")]
    En,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZhCn => "zh-CN",
            Self::En => "en",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "zh-CN" | "zh_CN" | "zh" => Ok(Self::ZhCn),
            "en" | "en-US" | "en_US" => Ok(Self::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub locale: Locale,
}

fn serialize_option_secret<S: Serializer>(
    value: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_gateway() {
        let cfg = PanelConfig::default();
        assert_eq!(cfg.gateway.url, "ws://127.0.0.1:18789");
        assert_eq!(cfg.gateway.rpc_timeout_secs, 10);
        assert_eq!(cfg.ui.locale, Locale::ZhCn);
    }

    #[test]
    fn token_round_trips_through_toml() {
        let cfg: PanelConfig = toml::from_str(
            "[gateway]\nurl = \"wss://gw.example:443\"\ntoken = \"t0k\"\n[ui]\nlocale = \"en\"\n",
        )
        .unwrap();
        assert_eq!(
            cfg.gateway.token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("t0k")
        );
        assert_eq!(cfg.ui.locale, Locale::En);

        let out = toml::to_string(&cfg).unwrap();
        assert!(out.contains("token = \"t0k\""));
        assert!(!out.contains("password"));
    }
}
