//! Voice token server
//!
//! `voice-token-server serve` exposes `GET /access-token?clientid=<id>`.
//! `voice-token-server issue [--identity <id>]` prints a single token and exits.

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use voice_token_core::{
    api::{self, ApiState},
    config::ServerConfig,
    logging::{parse_log_level, setup_logging, LoggingConfig},
    EnvConfigSource, IssuerConfig,
};

#[derive(Debug, Parser)]
#[command(name = "voice-token-server", version, about = "Issue short-lived voice access tokens")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VOICE_TOKEN_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log request spans when they close
    #[arg(long, global = true)]
    log_spans: bool,

    /// Include source file and line in log lines
    #[arg(long, global = true)]
    log_source: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the token endpoint over HTTP
    Serve {
        #[arg(long, env = "VOICE_TOKEN_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Issue one token from the environment configuration and print it
    Issue {
        /// Identity to embed; defaults to CLIENT_ID
        #[arg(long)]
        identity: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::new(parse_log_level(&cli.log_level)?, "voice-token-server");
    if cli.json_logs {
        logging = logging.with_json();
    }
    if cli.log_spans {
        logging = logging.with_spans();
    }
    if cli.log_source {
        logging = logging.with_file_info();
    }
    setup_logging(logging)?;

    match cli.command {
        Command::Serve { bind } => {
            info!("Starting voice-token-server v{}", env!("CARGO_PKG_VERSION"));
            let config = ServerConfig { bind_address: bind };
            api::serve(config, ApiState::new(EnvConfigSource)).await?;
        }
        Command::Issue { identity } => {
            let config = IssuerConfig::from_env().context("reading issuer configuration")?;
            let token = voice_token_core::issue(identity.as_deref(), &config)
                .context("issuing token")?;
            println!("{}", token);
        }
    }

    Ok(())
}
