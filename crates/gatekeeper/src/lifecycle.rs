//! Top-level screen decision.
//!
//! `decide_initial_screen` is pure: given the unlock state, an optional
//! incoming session and the account directory it names the screen the agent
//! should converge to. The event loop calls it on every trigger and after
//! every unlock state change.

use crate::{Account, AccountDirectory, AppUnlockState, Session};

/// Reason shown for the unlock performed on entry.
pub const START_REASON: &str = "Start";

/// What the agent should present next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenPlan {
    /// First run: ask for a new app password.
    CreatePassword,
    /// Locked this run: force the password screen.
    Unlock { reason: String },
    /// Unlocked with at least one account. With `connect_to` set, picking an
    /// account connects that session.
    Accounts {
        accounts: Vec<Account>,
        connect_to: Option<Session>,
    },
    /// Unlocked but no account exists yet.
    ImportAccount { connect_to: Option<Session> },
}

impl ScreenPlan {
    pub fn name(&self) -> &'static str {
        match self {
            ScreenPlan::CreatePassword => "create_password",
            ScreenPlan::Unlock { .. } => "unlock",
            ScreenPlan::Accounts { .. } => "accounts",
            ScreenPlan::ImportAccount { .. } => "import_account",
        }
    }
}

pub fn decide_initial_screen(
    state: AppUnlockState,
    session: Option<&Session>,
    directory: &dyn AccountDirectory,
) -> ScreenPlan {
    match state {
        AppUnlockState::NoPasswordSet => ScreenPlan::CreatePassword,
        AppUnlockState::LockedThisRun => ScreenPlan::Unlock {
            reason: START_REASON.to_string(),
        },
        AppUnlockState::UnlockedThisRun => {
            let connect_to = session.cloned();
            let accounts = directory.list_accounts();
            if accounts.is_empty() {
                ScreenPlan::ImportAccount { connect_to }
            } else {
                ScreenPlan::Accounts {
                    accounts,
                    connect_to,
                }
            }
        }
    }
}

/// What choosing an account on the list or import screen does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AccountSelection {
    Browse,
    Connect(Session),
}

impl AccountSelection {
    pub(crate) fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) => AccountSelection::Connect(session),
            None => AccountSelection::Browse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticAccountDirectory;

    fn session() -> Session {
        Session::new("wc:abc@2?symKey=00", "abc")
    }

    #[test]
    fn no_password_always_creates_password() {
        let directory = StaticAccountDirectory::from_addresses(["0x1"]);
        let session = session();

        for incoming in [None, Some(&session)] {
            assert_eq!(
                decide_initial_screen(AppUnlockState::NoPasswordSet, incoming, &directory),
                ScreenPlan::CreatePassword
            );
        }
    }

    #[test]
    fn locked_forces_start_unlock() {
        let directory = StaticAccountDirectory::default();
        let plan = decide_initial_screen(AppUnlockState::LockedThisRun, Some(&session()), &directory);
        assert_eq!(
            plan,
            ScreenPlan::Unlock {
                reason: "Start".to_string()
            }
        );
    }

    #[test]
    fn unlocked_with_session_and_no_accounts_imports() {
        let directory = StaticAccountDirectory::default();
        let plan =
            decide_initial_screen(AppUnlockState::UnlockedThisRun, Some(&session()), &directory);
        assert_eq!(
            plan,
            ScreenPlan::ImportAccount {
                connect_to: Some(session())
            }
        );
    }

    #[test]
    fn unlocked_without_session_browses() {
        let directory = StaticAccountDirectory::from_addresses(["0x1", "0x2"]);
        match decide_initial_screen(AppUnlockState::UnlockedThisRun, None, &directory) {
            ScreenPlan::Accounts {
                accounts,
                connect_to,
            } => {
                assert_eq!(accounts.len(), 2);
                assert!(connect_to.is_none());
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn directory_is_re_enumerated() {
        let directory = StaticAccountDirectory::default();
        assert_eq!(
            decide_initial_screen(AppUnlockState::UnlockedThisRun, None, &directory).name(),
            "import_account"
        );
        directory.add(Account::new("0x1"));
        assert_eq!(
            decide_initial_screen(AppUnlockState::UnlockedThisRun, None, &directory).name(),
            "accounts"
        );
    }

    #[test]
    fn selection_from_session() {
        assert_eq!(AccountSelection::from_session(None), AccountSelection::Browse);
        assert_eq!(
            AccountSelection::from_session(Some(session())),
            AccountSelection::Connect(session())
        );
    }
}
