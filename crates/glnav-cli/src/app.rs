//! The glnav application.
//!
//! Wires configuration, logging, the GitLab client, the `fzf` picker and the
//! explorer together, and dispatches the CLI subcommands.

use std::sync::Arc;

use colored::Colorize;
use glnav_core::{ConfigProvider, Result};
use glnav_explorer::{Console, MenuAdapter, Navigator, TerminalOperator};
use glnav_gitlab::{Gitlab, GitlabClient, handler_registry};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};
use crate::config::GlnavConfig;
use crate::config_handlers;

// ============================================================================
// GlnavCli
// ============================================================================

/// The application, bound to a loaded configuration.
pub struct GlnavCli {
    config: GlnavConfig,
    version: String,
}

impl GlnavCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = GlnavConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create an application over `config`.
    pub fn new(config: GlnavConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &GlnavConfig {
        &self.config
    }

    /// Verify the configured token and return the GitLab root.
    pub async fn connect(&self) -> Result<Gitlab> {
        let client = GitlabClient::from_config(&self.config)?;
        eprintln!("{}", "Authenticating with GitLab…".yellow());
        client.authenticate().await?;
        eprintln!("{}", format!("✔ Authenticated to {}", client.instance()).green());
        Ok(Gitlab::new(client))
    }

    /// Start the interactive explorer.
    ///
    /// The picker is probed before authenticating so a missing `fzf` is
    /// reported without touching the network.
    pub async fn explore(&self) -> Result<()> {
        let picker = self.config.picker();
        picker.probe().await?;
        let gitlab = self.connect().await?;
        let console = Console::new(
            MenuAdapter::new(Arc::new(picker)),
            Arc::new(TerminalOperator::new()),
        );
        Navigator::new(Arc::new(gitlab), handler_registry(), console)
            .run()
            .await
    }

    /// Authenticate and print who the token belongs to.
    pub async fn check(&self) -> Result<()> {
        let client = GitlabClient::from_config(&self.config)?;
        let user = client.authenticate().await?;
        println!(
            "{} ({}) on {}",
            user.text("username").unwrap_or_default(),
            user.display_name().unwrap_or_default(),
            client.instance()
        );
        Ok(())
    }

    /// Run a non-config command.
    pub async fn run(&self, command: Option<Command>) -> Result<()> {
        debug!(?command, "running command");
        match command {
            Some(Command::Version) => {
                println!("{} {}", self.config.project_name(), self.version);
                Ok(())
            }
            Some(Command::Check) => self.check().await,
            Some(Command::Explore) | None => self.explore().await,
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(None, config_cmd.command)
            }
        }
    }
}

/// Initialise tracing-based logging on stderr.
///
/// Uses `RUST_LOG` if set, otherwise defaults based on verbosity flags.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI with the given arguments.
///
/// Config commands run before any configuration is loaded, so `config init`
/// works even when the existing file is broken.
pub async fn run(mut args: CliArgs) -> Result<()> {
    init_logging(args.verbose, args.quiet);
    match args.command.take() {
        Some(Command::Config(config_cmd)) => {
            config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
        }
        command => GlnavCli::from_args(&args)?.run(command).await,
    }
}

// ============================================================================
// Tests
// ============================================================================
