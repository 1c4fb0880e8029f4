//! Agent wiring and the console driver loop.

use std::sync::Arc;

use agent_config_and_utils::{Config, Paths};
use agent_storage::create_secrets_manager;
use gatekeeper::{
    Account, AccountDirectory, Agent, AgentDeps, AgentHandle, AgentOptions, StaticAccountDirectory,
    Trigger, UnavailableBiometrics, UserAction,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::clipboard::AgentClipboard;
use crate::console::{parse_command, ConsoleCommand, ConsoleSurface, HELP};
use crate::loopback::LoopbackProtocol;

/// Build the agent, start its event loop and feed it console commands
/// until stdin closes, the agent exits, or Ctrl-C arrives.
pub async fn run_agent(
    config: Config,
    paths: Paths,
    link: Option<String>,
    memory_clipboard: bool,
) -> anyhow::Result<()> {
    paths.ensure_dirs()?;

    let secrets = Arc::new(create_secrets_manager(&paths.secrets_file())?);
    let accounts = Arc::new(StaticAccountDirectory::from_addresses(
        config.accounts.iter().cloned(),
    ));
    let clipboard = Arc::new(if memory_clipboard {
        AgentClipboard::memory()
    } else {
        AgentClipboard::System
    });

    let agent = Agent::new(
        AgentDeps {
            secrets,
            protocol: Arc::new(LoopbackProtocol::new()),
            accounts: accounts.clone(),
            biometrics: Arc::new(UnavailableBiometrics),
            link_source: clipboard.clone(),
            surface: Box::new(ConsoleSurface::new()),
        },
        AgentOptions::from(&config),
    )?;
    let handle = agent.handle();
    let mut agent_task = tokio::spawn(agent.run());

    info!(
        base_dir = %paths.base_dir().display(),
        accounts = config.accounts.len(),
        "Signer agent started"
    );
    println!("type 'help' for commands");

    handle.trigger(Trigger::AppStart)?;
    if let Some(link) = link {
        handle.trigger(Trigger::InboundLink(link))?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            result = &mut agent_task => {
                result?;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                let _ = handle.shutdown();
                agent_task.await?;
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    let _ = handle.shutdown();
                    agent_task.await?;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => execute(command, &handle, &accounts, &clipboard)?,
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    info!("Signer agent stopped");
    Ok(())
}

fn execute(
    command: ConsoleCommand,
    handle: &AgentHandle,
    accounts: &StaticAccountDirectory,
    clipboard: &AgentClipboard,
) -> anyhow::Result<()> {
    match command {
        ConsoleCommand::Trigger(trigger) => handle.trigger(trigger)?,
        ConsoleCommand::User(action) => handle.user(action)?,
        ConsoleCommand::Select(n) => match accounts.list_accounts().into_iter().nth(n - 1) {
            Some(account) => handle.user(UserAction::SelectAccount(account))?,
            None => println!("no account {}", n),
        },
        ConsoleCommand::Import(address) => {
            let account = Account::new(address);
            accounts.add(account.clone());
            handle.user(UserAction::SelectAccount(account))?;
        }
        ConsoleCommand::Ask { title, detail } => {
            let outcome = handle.request_approval(title.clone(), detail)?;
            tokio::spawn(async move {
                let approved = outcome.await.unwrap_or(false);
                info!(title = %title, approved, "Approval settled");
                println!(
                    "[{}: {}]",
                    title,
                    if approved { "approved" } else { "denied" }
                );
            });
        }
        ConsoleCommand::Copy(text) => {
            if let Err(e) = clipboard.copy(&text) {
                warn!(error = %e, "Failed to write clipboard");
                println!("clipboard unavailable: {}", e);
            }
        }
        ConsoleCommand::Help => println!("{}", HELP),
    }
    Ok(())
}

/// Print a short summary of the agent's persisted state.
pub fn check_status(config: &Config, paths: &Paths) -> anyhow::Result<()> {
    for line in status_lines(config, paths)? {
        println!("{}", line);
    }
    Ok(())
}

fn status_lines(config: &Config, paths: &Paths) -> anyhow::Result<Vec<String>> {
    let secrets = create_secrets_manager(&paths.secrets_file())?;
    let password = if secrets.has_stored_secret()? {
        "set"
    } else {
        "not set"
    };

    Ok(vec![
        format!("Base directory: {}", paths.base_dir().display()),
        format!("App password:   {}", password),
        format!("Auth policy:    {:?}", config.auth_policy),
        format!("Accounts:       {}", config.accounts.len()),
    ])
}
