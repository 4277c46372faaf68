mod skills_commands;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    clap::{Parser, Subcommand},
    clawpanel_client::{ConnectOptions, WsGatewayClient},
    clawpanel_config::PanelConfig,
    clawpanel_protocol::ConnectAuth,
    clawpanel_skills::SkillsController,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "clawpanel", about = "Clawpanel, a console for your gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Gateway WebSocket URL (overrides config value).
    #[arg(long, global = true)]
    url: Option<String>,
    /// Gateway token (overrides config value).
    #[arg(long, global = true)]
    token: Option<String>,
    /// Config file to use instead of discovering one.
    #[arg(long, global = true, env = "CLAWPANEL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Skills configuration.
    Skills {
        #[command(subcommand)]
        action: skills_commands::SkillAction,
    },
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Config file (explicit or discovered), then env, then CLI flags.
fn resolve_config(cli: &Cli) -> PanelConfig {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = clawpanel_config::load_or_default(path);
            clawpanel_config::apply_env_overrides(&mut config);
            config
        },
        None => clawpanel_config::discover_and_load(),
    };
    if let Some(url) = &cli.url {
        config.gateway.url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.gateway.token = Some(Secret::new(token.clone()));
    }
    config
}

async fn connect(config: &PanelConfig) -> anyhow::Result<SkillsController> {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let rpc_timeout = Duration::from_secs(config.gateway.rpc_timeout_secs);
    let options = ConnectOptions {
        url: config.gateway.url.clone(),
        auth: ConnectAuth {
            token: config
                .gateway
                .token
                .as_ref()
                .map(|t| t.expose_secret().clone()),
            password: config
                .gateway
                .password
                .as_ref()
                .map(|p| p.expose_secret().clone()),
        },
        locale: Some(config.ui.locale.as_str().to_string()),
        rpc_timeout,
    };
    let client = WsGatewayClient::spawn(options);
    client.wait_connected(rpc_timeout).await?;
    debug!(url = %config.gateway.url, "connected to gateway");

    Ok(SkillsController::new(Arc::new(client), config.ui.locale))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "clawpanel starting");
    let config = resolve_config(&cli);

    match cli.command {
        Commands::Skills { action } => {
            let ctl = connect(&config).await?;
            skills_commands::handle_skills(&ctl, action).await
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "clawpanel",
            "--url",
            "wss://gw.example:18789",
            "--token",
            "t0k",
            "skills",
            "status",
        ])
        .unwrap();
        let config = resolve_config(&cli);
        assert_eq!(config.gateway.url, "wss://gw.example:18789");
        assert_eq!(config.gateway.token.unwrap().expose_secret(), "t0k");
    }
}
