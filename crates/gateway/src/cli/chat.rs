//! `parley chat` — interactive REPL command.
//!
//! Opens a readline-based loop that sends each line through the
//! [`LifecycleController`], so every exchange lands in the local history
//! store.  Slash-commands cover the history operations of the chat UI.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use parley_domain::config::Config;
use parley_domain::{CompletionGateway, ResponseMode, Role, Turn};
use parley_providers::{HttpGateway, OpenAiCompatProvider, UpstreamGateway};
use parley_sessions::{LifecycleController, Resolution};

use super::history::format_row;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL.
pub async fn chat(
    config: Arc<Config>,
    mode: Option<ResponseMode>,
    endpoint: Option<String>,
    session: Option<String>,
) -> anyhow::Result<()> {
    let gateway = build_gateway(&config, endpoint)?;
    let store = super::open_store(&config)?;
    let mut controller = LifecycleController::new(store);
    let mut mode = mode.unwrap_or(config.client.default_mode);

    if let Some(id) = session.as_deref() {
        controller.load(id);
        if controller.active_session_id() != Some(id) {
            eprintln!("No saved conversation with id {id}; starting a new one.");
        } else {
            print_conversation(controller.conversation());
        }
    }

    // Readline history lives next to the session file.
    let history_path = config.storage.state_path.join("chat_history.txt");
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("Parley interactive chat");
    eprintln!("Mode: {mode}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    loop {
        let readline = rl.readline(&prompt(&controller, mode));

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                // ── Slash commands ────────────────────────────────
                if trimmed.starts_with('/') {
                    match SlashCommand::parse(trimmed) {
                        Ok(cmd) => {
                            if apply_slash_command(cmd, &mut controller, &mut mode) {
                                break;
                            }
                        }
                        Err(msg) => eprintln!("{msg}"),
                    }
                    continue;
                }

                // ── User message → exchange ──────────────────────
                send_message(&mut controller, gateway.as_ref(), trimmed, mode).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();

    // Persist anything the user typed that has not been committed yet.
    controller.commit();

    eprintln!("Goodbye!");
    Ok(())
}

/// Pick the completion gateway: a remote `/api/chat` endpoint when one is
/// given (flag wins over `[client] endpoint`), otherwise the upstream
/// provider directly.
fn build_gateway(
    config: &Config,
    endpoint: Option<String>,
) -> anyhow::Result<Arc<dyn CompletionGateway>> {
    if let Some(url) = endpoint.or_else(|| config.client.endpoint.clone()) {
        let timeout = Duration::from_millis(config.client.timeout_ms);
        let gw = HttpGateway::new(url.clone(), timeout)
            .with_context(|| format!("creating client for {url}"))?;
        tracing::debug!(endpoint = %url, "using remote completion endpoint");
        return Ok(Arc::new(gw));
    }

    let provider = OpenAiCompatProvider::from_config(&config.llm).with_context(|| {
        format!(
            "no endpoint configured and provider '{}' is unavailable",
            config.llm.id
        )
    })?;
    Ok(Arc::new(UpstreamGateway::new(
        Arc::new(provider),
        config.modes.clone(),
    )))
}

fn prompt(controller: &LifecycleController, mode: ResponseMode) -> String {
    match controller.active_session_id() {
        Some(id) => format!("you [{mode} {}]> ", short_id(id)),
        None => format!("you [{mode}]> "),
    }
}

fn short_id(id: &str) -> &str {
    id.get(id.len().saturating_sub(8)..).unwrap_or(id)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New,
    History,
    Load(String),
    Delete(String),
    Clear,
    Mode(Option<ResponseMode>),
    Help,
    Exit,
}

impl SlashCommand {
    /// Parse a `/command [arg]` line.  The error is a user-facing message.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut parts = input.splitn(2, ' ');
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

        let required = |usage: &str| {
            arg.map(str::to_owned)
                .ok_or_else(|| format!("Usage: {usage}"))
        };

        match cmd {
            "/new" => Ok(Self::New),
            "/history" => Ok(Self::History),
            "/load" => required("/load <id>").map(Self::Load),
            "/delete" => required("/delete <id>").map(Self::Delete),
            "/clear" => Ok(Self::Clear),
            "/mode" => match arg {
                None => Ok(Self::Mode(None)),
                Some(m) => m.parse().map(|m| Self::Mode(Some(m))),
            },
            "/help" => Ok(Self::Help),
            "/exit" | "/quit" => Ok(Self::Exit),
            other => Err(format!("Unknown command: {other}  (type /help for a list)")),
        }
    }
}

/// Apply a slash command.  Returns `true` if the REPL should exit.
fn apply_slash_command(
    cmd: SlashCommand,
    controller: &mut LifecycleController,
    mode: &mut ResponseMode,
) -> bool {
    match cmd {
        SlashCommand::Exit => return true,

        SlashCommand::New => {
            controller.start_new();
            eprintln!("Started a new conversation.");
        }

        SlashCommand::History => {
            let active = controller.active_session_id();
            let now = chrono::Utc::now();
            if controller.sessions().is_empty() {
                eprintln!("No saved conversations.");
            }
            for session in controller.sessions() {
                let marker = if Some(session.id.as_str()) == active { '*' } else { ' ' };
                eprintln!("{marker} {}", format_row(session, now));
            }
        }

        SlashCommand::Load(id) => {
            controller.load(&id);
            if controller.active_session_id() == Some(id.as_str()) {
                print_conversation(controller.conversation());
            } else {
                eprintln!("No saved conversation with id {id}");
            }
        }

        SlashCommand::Delete(id) => {
            controller.remove(&id);
            eprintln!("Deleted {id}");
        }

        SlashCommand::Clear => {
            controller.clear_all();
            eprintln!("All conversations cleared.");
        }

        SlashCommand::Mode(Some(m)) => {
            *mode = m;
            eprintln!("Mode set to: {m}");
        }
        SlashCommand::Mode(None) => {
            let all: Vec<&str> = ResponseMode::ALL.iter().map(|m| m.as_str()).collect();
            eprintln!("Current mode: {mode}");
            eprintln!("Usage: /mode <{}>", all.join("|"));
        }

        SlashCommand::Help => {
            eprintln!("Commands:");
            eprintln!("  /new             Save the current conversation and start a new one");
            eprintln!("  /history         List saved conversations");
            eprintln!("  /load <id>       Resume a saved conversation");
            eprintln!("  /delete <id>     Delete a saved conversation");
            eprintln!("  /clear           Delete all saved conversations");
            eprintln!("  /mode <mode>     Switch response mode (fast, default, full, friend)");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }
    }

    false
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message sending
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(
    controller: &mut LifecycleController,
    gateway: &dyn CompletionGateway,
    text: &str,
    mode: ResponseMode,
) {
    let pending = controller.begin(Turn::user(text));
    if controller.is_busy() {
        eprint!("\x1B[2m…\x1B[0m");
        std::io::stderr().flush().ok();
    }

    let outcome = gateway.complete(pending.turns(), mode).await;
    // Erase the busy marker.
    eprint!("\r\x1B[K");

    match controller.resolve(&pending, outcome) {
        Resolution::Applied { failed, .. } => {
            let Some(reply) = controller.conversation().last() else {
                return;
            };
            if failed {
                eprintln!("\x1B[31m{}\x1B[0m\n", reply.content);
            } else {
                println!("{}\n", reply.content);
            }
        }
        Resolution::Stale => {
            tracing::debug!(exchange_id = pending.id(), "reply arrived for a replaced conversation");
        }
    }
}

fn print_conversation(turns: &[Turn]) {
    for turn in turns {
        match turn.role {
            Role::User => eprintln!("\x1B[2myou> {}\x1B[0m", turn.content),
            Role::Assistant => println!("{}\n", turn.content),
            Role::System => {}
        }
    }
}
