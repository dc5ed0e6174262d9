//! Wordrop daemon: entry point for running the subscription service.

mod config;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use zeroize::Zeroizing;

use wordrop_crypto::{CodeGenerator, TokenCodec};
use wordrop_mailer::{HttpMailSender, LogMailSender, NotificationSender, SmtpMailSender};
use wordrop_rpc::RpcServer;
use wordrop_store_lmdb::LmdbEnvironment;
use wordrop_subscription::Governor;
use wordrop_types::SystemClock;
use wordrop_utils::{init_logging, LogFormat};

use crate::config::{DaemonConfig, MailTransport};

/// Named databases in the LMDB environment, with headroom.
const LMDB_MAX_DBS: u32 = 8;

#[derive(Parser)]
#[command(name = "wordrop-daemon", about = "Wordrop subscription service daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "WORDROP_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind the HTTP API to.
    #[arg(long, env = "WORDROP_BIND_ADDRESS")]
    bind: Option<IpAddr>,

    /// HTTP API port.
    #[arg(long, env = "WORDROP_PORT")]
    port: Option<u16>,

    /// Data directory for the subscription database.
    #[arg(long, env = "WORDROP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "WORDROP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "WORDROP_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Mail transport: "http", "smtp" or "log".
    #[arg(long, env = "WORDROP_MAIL_TRANSPORT")]
    mail_transport: Option<MailTransport>,

    /// API key for the transactional mail endpoint.
    #[arg(long, env = "WORDROP_MAIL_API_KEY", hide_env_values = true)]
    mail_api_key: Option<String>,

    /// Password for the SMTP account.
    #[arg(long, env = "WORDROP_SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    /// Public origin used in verification links.
    #[arg(long, env = "WORDROP_BASE_URL")]
    base_url: Option<String>,

    /// Secret used to sign verification tokens.
    #[arg(long, env = "WORDROP_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve,
    /// Print the effective configuration as TOML.
    PrintConfig,
}

impl Cli {
    /// Layer flags and env vars over the file (or default) configuration.
    fn apply(&mut self, config: &mut DaemonConfig) {
        if let Some(bind) = self.bind {
            config.http.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(data_dir) = self.data_dir.take() {
            config.storage.data_dir = data_dir;
        }
        if let Some(level) = self.log_level.take() {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(transport) = self.mail_transport {
            config.mail_transport = transport;
        }
        if let Some(key) = self.mail_api_key.take() {
            config.mail.api_key = key;
        }
        if let Some(password) = self.smtp_password.take() {
            config.mail.smtp_password = password;
        }
        if let Some(base_url) = self.base_url.take() {
            config.mail.base_url = base_url;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    cli.apply(&mut config);

    match cli.command {
        Command::PrintConfig => {
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Serve => {
            init_logging(config.log_format, &config.log_level)
                .context("failed to install log subscriber")?;
            if let Some(path) = &cli.config {
                tracing::info!("Loaded config from {}", path.display());
            }
            let secret = Zeroizing::new(cli.token_secret.take().unwrap_or_default());
            serve(config, secret).await
        }
    }
}

async fn serve(config: DaemonConfig, secret: Zeroizing<String>) -> anyhow::Result<()> {
    let codec = TokenCodec::new(secret.as_bytes(), config.governor.token_ttl_secs)
        .context("--token-secret / WORDROP_TOKEN_SECRET must be set")?;
    drop(secret);
    let codes = CodeGenerator::new(config.governor.code_length)
        .context("invalid governor.code_length")?;

    let env = LmdbEnvironment::open(&config.storage.data_dir, LMDB_MAX_DBS, config.map_size_bytes())
        .with_context(|| format!("failed to open store at {}", config.storage.data_dir.display()))?;

    let mut mail = config.mail.clone();
    mail.link_ttl_secs = codec.ttl_secs();
    let sender: Box<dyn NotificationSender> = match config.mail_transport {
        MailTransport::Http => Box::new(
            HttpMailSender::new(mail.clone()).context("invalid [mail] configuration")?,
        ),
        MailTransport::Smtp => Box::new(
            SmtpMailSender::new(mail.clone()).context("invalid [mail] SMTP configuration")?,
        ),
        MailTransport::Log => {
            tracing::warn!("mail transport is 'log': verification links are logged, not sent");
            Box::new(LogMailSender::new(mail.base_url.clone()))
        }
    };

    let governor = Governor::new(
        env.subscription_store(),
        sender,
        codec,
        codes,
        Arc::new(SystemClock),
        config.governor.clone(),
    );

    let addr = SocketAddr::new(config.http.bind_address, config.http.port);
    tracing::info!(
        %addr,
        cooldown_secs = config.governor.cooldown_secs,
        max_attempts = config.governor.max_attempts,
        ban_duration_secs = config.governor.ban_duration_secs,
        "Starting Wordrop daemon"
    );

    RpcServer::new(addr)
        .serve(Arc::new(governor), shutdown_signal())
        .await?;

    tracing::info!("Wordrop daemon exited cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_config() {
        let mut cli = Cli::parse_from([
            "wordrop-daemon",
            "--port",
            "9999",
            "--log-format",
            "json",
            "--mail-transport",
            "http",
            "--base-url",
            "https://wordrop.example",
            "serve",
        ]);
        let mut config = DaemonConfig::from_toml_str("[http]\nport = 1234\n").unwrap();
        cli.apply(&mut config);

        assert_eq!(config.http.port, 9999);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.mail_transport, MailTransport::Http);
        assert_eq!(config.mail.base_url, "https://wordrop.example");
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn unset_flags_keep_file_values() {
        let mut cli = Cli::parse_from(["wordrop-daemon", "print-config"]);
        let mut config = DaemonConfig::from_toml_str("log_level = \"debug\"\n").unwrap();
        cli.apply(&mut config);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn smtp_flags_fill_mail_config() {
        let mut cli = Cli::parse_from([
            "wordrop-daemon",
            "--mail-transport",
            "smtp",
            "--smtp-password",
            "app-password",
            "serve",
        ]);
        let mut config =
            DaemonConfig::from_toml_str("[mail]\nsmtp_host = \"smtp.gmail.com\"\n").unwrap();
        cli.apply(&mut config);

        assert_eq!(config.mail_transport, MailTransport::Smtp);
        assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
        assert_eq!(config.mail.smtp_password, "app-password");
    }
}
