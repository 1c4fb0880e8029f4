//! Screen contents handed to the presentation surface.

use crate::Account;
use serde::Serialize;

/// What the single agent window is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// First-run password creation.
    CreatePassword {
        min_length: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Password entry. Not interactive while a biometric prompt is pending.
    Unlock {
        reason: String,
        interactive: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Account list, optionally in selection mode for a connect request.
    Accounts {
        accounts: Vec<Account>,
        selecting: bool,
    },
    /// Onboarding when no account exists yet.
    ImportAccount { selecting: bool },
    Approve { title: String, detail: String },
    Connecting,
    Error { message: String },
}

impl Screen {
    pub fn unlock(reason: impl Into<String>, interactive: bool) -> Self {
        Screen::Unlock {
            reason: reason.into(),
            interactive,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Screen::Error {
            message: message.into(),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Screen::CreatePassword { .. } => "create_password",
            Screen::Unlock { .. } => "unlock",
            Screen::Accounts { .. } => "accounts",
            Screen::ImportAccount { .. } => "import_account",
            Screen::Approve { .. } => "approve",
            Screen::Connecting => "connecting",
            Screen::Error { .. } => "error",
        }
    }
}
