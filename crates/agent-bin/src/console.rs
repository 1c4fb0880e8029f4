//! Console presentation surface and command parsing.

use anyhow::{anyhow, bail};
use gatekeeper::{PresentationSurface, Screen, Trigger, UserAction};

pub const HELP: &str = "\
commands:
  open | reopen | click     app start, app reopen, status-control click
  menu | quit | yes | no    status menu, quit, confirm/dismiss quit
  link <uri>                deliver an inbound link
  copy <text>               put text on the clipboard
  create <password>         create the app password
  password <password>       submit the unlock password
  cancel                    cancel the unlock screen
  select <n>                pick account n from the list
  import <address>          import an account and pick it
  ask <title> | <detail>    request an approval
  approve | deny            answer the approval screen
  close                     close the agent window
  help";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Trigger(Trigger),
    User(UserAction),
    Select(usize),
    Import(String),
    Ask { title: String, detail: String },
    Copy(String),
    Help,
}

pub fn parse_command(line: &str) -> anyhow::Result<ConsoleCommand> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "open" => ConsoleCommand::Trigger(Trigger::AppStart),
        "reopen" => ConsoleCommand::Trigger(Trigger::Reopen),
        "click" => ConsoleCommand::Trigger(Trigger::StatusPrimaryClick),
        "menu" => ConsoleCommand::Trigger(Trigger::StatusSecondaryClick),
        "quit" => ConsoleCommand::Trigger(Trigger::QuitSelected),
        "link" => ConsoleCommand::Trigger(Trigger::InboundLink(required(verb, rest)?)),
        "yes" => ConsoleCommand::User(UserAction::ConfirmQuit),
        "no" => ConsoleCommand::User(UserAction::DismissQuit),
        "create" => ConsoleCommand::User(UserAction::CreatePassword(required(verb, rest)?)),
        "password" => ConsoleCommand::User(UserAction::SubmitPassword(required(verb, rest)?)),
        "cancel" => ConsoleCommand::User(UserAction::CancelUnlock),
        "approve" => ConsoleCommand::User(UserAction::Approve),
        "deny" => ConsoleCommand::User(UserAction::Deny),
        "close" => ConsoleCommand::User(UserAction::CloseWindow),
        "select" => {
            let n: usize = required(verb, rest)?
                .parse()
                .map_err(|_| anyhow!("select expects an account number"))?;
            if n == 0 {
                bail!("account numbers start at 1");
            }
            ConsoleCommand::Select(n)
        }
        "import" => ConsoleCommand::Import(required(verb, rest)?),
        "ask" => {
            let (title, detail) = rest
                .split_once('|')
                .ok_or_else(|| anyhow!("usage: ask <title> | <detail>"))?;
            let title = title.trim();
            if title.is_empty() {
                bail!("approval title must not be empty");
            }
            ConsoleCommand::Ask {
                title: title.to_string(),
                detail: detail.trim().to_string(),
            }
        }
        "copy" => ConsoleCommand::Copy(required(verb, rest)?),
        "help" | "?" => ConsoleCommand::Help,
        "" => bail!("empty command"),
        other => bail!("unknown command '{}', try 'help'", other),
    };
    Ok(command)
}

fn required(verb: &str, rest: &str) -> anyhow::Result<String> {
    if rest.is_empty() {
        bail!("{} needs an argument", verb);
    }
    Ok(rest.to_string())
}

/// Renders screens and window operations as text on stdout.
#[derive(Default)]
pub struct ConsoleSurface {
    window_open: bool,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn render(screen: &Screen) -> String {
    match screen {
        Screen::CreatePassword { min_length, error } => {
            let mut out = format!(
                "Create an app password (at least {} characters): create <password>",
                min_length
            );
            push_error(&mut out, error.as_deref());
            out
        }
        Screen::Unlock {
            reason,
            interactive,
            error,
        } => {
            let mut out = format!("Unlock required: {}", reason);
            if *interactive {
                out.push_str("\n  password <password> | cancel");
            } else {
                out.push_str("\n  waiting for biometric check...");
            }
            push_error(&mut out, error.as_deref());
            out
        }
        Screen::Accounts {
            accounts,
            selecting,
        } => {
            let mut out = String::from("Accounts:");
            for (i, account) in accounts.iter().enumerate() {
                out.push_str(&format!("\n  {}. {}", i + 1, account.address));
                if let Some(label) = &account.label {
                    out.push_str(&format!(" ({})", label));
                }
            }
            if *selecting {
                out.push_str("\n  select <n> to connect the pending session");
            }
            out
        }
        Screen::ImportAccount { selecting } => {
            let mut out = String::from("No accounts yet: import <address>");
            if *selecting {
                out.push_str("\n  the imported account connects the pending session");
            }
            out
        }
        Screen::Approve { title, detail } => {
            format!("Approve? {}\n  {}\n  approve | deny", title, detail)
        }
        Screen::Connecting => "Connecting...".to_string(),
        Screen::Error { message } => format!("Error: {}", message),
    }
}

fn push_error(out: &mut String, error: Option<&str>) {
    if let Some(error) = error {
        out.push_str(&format!("\n  ! {}", error));
    }
}

impl PresentationSurface for ConsoleSurface {
    fn show_new(&mut self) {
        if !self.window_open {
            self.window_open = true;
            println!("[window opened]");
        }
    }

    fn set_content(&mut self, screen: Screen) {
        tracing::debug!(screen = screen.name(), "Screen content changed");
        println!("{}", render(&screen));
    }

    fn activate(&mut self) {
        println!("[window focused]");
    }

    fn close_all(&mut self) {
        self.window_open = false;
        println!("[windows closed]");
    }

    fn close_all_and_activate_caller(&mut self) {
        self.window_open = false;
        println!("[windows closed, returning to caller]");
    }

    fn show_status_menu(&mut self) {
        println!("Status menu: quit");
    }

    fn show_quit_confirmation(&mut self) {
        println!("Quit the signer agent? yes | no");
    }
}
