pub mod chat;
pub mod config;
pub mod history;

use clap::{Parser, Subcommand};

use parley_domain::ResponseMode;

/// Parley — a chat client with local conversation history.
#[derive(Debug, Parser)]
#[command(name = "parley", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the completion endpoint (default when no subcommand is given).
    Serve,
    /// Open an interactive chat backed by the local history store.
    Chat {
        /// Response mode: fast, default, full, or friend.
        #[arg(long)]
        mode: Option<ResponseMode>,
        /// URL of a running `/api/chat` endpoint.  When omitted, the
        /// upstream provider from `[llm]` is called directly.
        #[arg(long)]
        endpoint: Option<String>,
        /// Resume a saved session by id.
        #[arg(long)]
        session: Option<String>,
    },
    /// Inspect or prune saved conversations.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List saved sessions, most recent first.
    List,
    /// Print every turn of a saved session.
    Show {
        /// Session id (see `parley history list`).
        id: String,
    },
    /// Delete one saved session.
    Delete {
        /// Session id.
        id: String,
    },
    /// Delete all saved sessions.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `PARLEY_CONFIG` (or
/// `parley.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.  A missing file yields the defaults.
///
/// [`Config`]: parley_domain::config::Config
pub fn load_config() -> anyhow::Result<(parley_domain::config::Config, String)> {
    let config_path = std::env::var("PARLEY_CONFIG").unwrap_or_else(|_| "parley.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        parley_domain::config::Config::default()
    };

    Ok((config, config_path))
}

/// Open the session store under the configured state directory.
pub fn open_store(
    config: &parley_domain::config::Config,
) -> anyhow::Result<parley_sessions::SessionStore> {
    use anyhow::Context;
    use std::sync::Arc;

    let port = parley_sessions::FilePort::open(&config.storage.state_path).with_context(|| {
        format!(
            "opening history store in {}",
            config.storage.state_path.display()
        )
    })?;
    Ok(parley_sessions::SessionStore::new(Arc::new(port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_flags() {
        let cli = Cli::parse_from(["parley", "chat", "--mode", "FULL", "--session", "abc"]);
        match cli.command {
            Some(Command::Chat {
                mode,
                endpoint,
                session,
            }) => {
                assert_eq!(mode, Some(ResponseMode::Full));
                assert!(endpoint.is_none());
                assert_eq!(session.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["parley"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["parley", "chat", "--mode", "turbo"]).is_err());
    }

    #[test]
    fn parses_history_subcommands() {
        let cli = Cli::parse_from(["parley", "history", "clear", "-y"]);
        assert!(matches!(
            cli.command,
            Some(Command::History(HistoryCommand::Clear { yes: true }))
        ));
    }
}
