//! Per-run unlock state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │  NoPasswordSet  │ (initial)
//! └────────┬────────┘
//!          │ PasswordCreated / StoredSecretFound
//!          ▼
//! ┌─────────────────┐
//! │  LockedThisRun  │
//! └────────┬────────┘
//!          │ Authenticated
//!          ▼
//! ┌─────────────────┐
//! │ UnlockedThisRun │ (until the process exits)
//! └─────────────────┘
//! ```
//!
//! Creating a password never unlocks directly: the user still has to
//! authenticate once. Nothing here is persisted; a new process starts in
//! `NoPasswordSet` and is seeded with `StoredSecretFound` when a password
//! exists.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub unlock_machine(NoPasswordSet)

    NoPasswordSet => {
        PasswordCreated => LockedThisRun,
        StoredSecretFound => LockedThisRun
    },
    LockedThisRun => {
        Authenticated => UnlockedThisRun
    }
}

pub use unlock_machine::Input as UnlockMachineInput;
pub use unlock_machine::State as UnlockMachineState;
pub use unlock_machine::StateMachine as UnlockMachine;

/// Unlock state for logging and external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppUnlockState {
    /// No app password exists yet.
    NoPasswordSet,
    /// A password exists but has not been entered during this run.
    LockedThisRun,
    /// The user authenticated at least once during this run.
    UnlockedThisRun,
}

impl AppUnlockState {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, AppUnlockState::UnlockedThisRun)
    }
}

impl From<&UnlockMachineState> for AppUnlockState {
    fn from(state: &UnlockMachineState) -> Self {
        match state {
            UnlockMachineState::NoPasswordSet => AppUnlockState::NoPasswordSet,
            UnlockMachineState::LockedThisRun => AppUnlockState::LockedThisRun,
            UnlockMachineState::UnlockedThisRun => AppUnlockState::UnlockedThisRun,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_no_password_set() {
        let machine = UnlockMachine::new();
        assert_eq!(*machine.state(), UnlockMachineState::NoPasswordSet);
    }

    #[test]
    fn test_password_creation_locks_rather_than_unlocks() {
        let mut machine = UnlockMachine::new();

        machine.consume(&UnlockMachineInput::PasswordCreated).unwrap();
        assert_eq!(*machine.state(), UnlockMachineState::LockedThisRun);
    }

    #[test]
    fn test_stored_secret_seeds_locked_state() {
        let mut machine = UnlockMachine::new();

        machine.consume(&UnlockMachineInput::StoredSecretFound).unwrap();
        assert_eq!(*machine.state(), UnlockMachineState::LockedThisRun);

        machine.consume(&UnlockMachineInput::Authenticated).unwrap();
        assert_eq!(*machine.state(), UnlockMachineState::UnlockedThisRun);
    }

    #[test]
    fn test_cannot_authenticate_without_password() {
        let mut machine = UnlockMachine::new();

        let result = machine.consume(&UnlockMachineInput::Authenticated);
        assert!(result.is_err());
        assert_eq!(*machine.state(), UnlockMachineState::NoPasswordSet);
    }

    #[test]
    fn test_unlocked_is_terminal_for_the_run() {
        let mut machine = UnlockMachine::new();
        machine.consume(&UnlockMachineInput::PasswordCreated).unwrap();
        machine.consume(&UnlockMachineInput::Authenticated).unwrap();

        assert!(machine.consume(&UnlockMachineInput::Authenticated).is_err());
        assert!(machine.consume(&UnlockMachineInput::PasswordCreated).is_err());
        assert!(machine.consume(&UnlockMachineInput::StoredSecretFound).is_err());
        assert_eq!(*machine.state(), UnlockMachineState::UnlockedThisRun);
    }

    #[test]
    fn test_password_cannot_be_created_twice() {
        let mut machine = UnlockMachine::new();
        machine.consume(&UnlockMachineInput::PasswordCreated).unwrap();

        assert!(machine.consume(&UnlockMachineInput::PasswordCreated).is_err());
    }

    #[test]
    fn test_app_unlock_state_conversion() {
        assert_eq!(
            AppUnlockState::from(&UnlockMachineState::NoPasswordSet),
            AppUnlockState::NoPasswordSet
        );
        assert_eq!(
            AppUnlockState::from(&UnlockMachineState::LockedThisRun),
            AppUnlockState::LockedThisRun
        );
        assert_eq!(
            AppUnlockState::from(&UnlockMachineState::UnlockedThisRun),
            AppUnlockState::UnlockedThisRun
        );
        assert!(AppUnlockState::UnlockedThisRun.is_unlocked());
        assert!(!AppUnlockState::LockedThisRun.is_unlocked());
    }
}
