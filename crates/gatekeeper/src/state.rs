//! Process-wide agent state owned by the event loop.

use crate::unlock_fsm::{AppUnlockState, UnlockMachine, UnlockMachineInput};
use crate::{GateError, GateResult};

/// Mutable state shared by the flows. Lives for the whole process and is
/// only touched from the event loop.
pub struct AgentState {
    unlock: UnlockMachine,
    status_control_blocked: bool,
}

impl AgentState {
    /// Build the initial state, seeding the unlock machine from whether the
    /// secret store holds a password.
    pub fn seeded(has_stored_secret: bool) -> GateResult<Self> {
        let mut state = Self {
            unlock: UnlockMachine::new(),
            status_control_blocked: false,
        };
        if has_stored_secret {
            state.apply(UnlockMachineInput::StoredSecretFound)?;
        }
        Ok(state)
    }

    pub fn unlock_state(&self) -> AppUnlockState {
        AppUnlockState::from(self.unlock.state())
    }

    /// Feed one input into the unlock machine.
    pub fn apply(&mut self, input: UnlockMachineInput) -> GateResult<AppUnlockState> {
        let old_state = self.unlock_state();
        self.unlock.consume(&input).map_err(|_| {
            GateError::InvalidStateTransition(format!("{:?} in {:?}", input, old_state))
        })?;
        let new_state = self.unlock_state();

        tracing::debug!(
            old_state = ?old_state,
            new_state = ?new_state,
            input = ?input,
            "Unlock state transition"
        );
        Ok(new_state)
    }

    /// True while the quit confirmation is up.
    pub fn is_status_control_blocked(&self) -> bool {
        self.status_control_blocked
    }

    pub fn set_status_control_blocked(&mut self, blocked: bool) {
        self.status_control_blocked = blocked;
    }
}

impl std::fmt::Debug for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentState")
            .field("unlock", &self.unlock_state())
            .field("status_control_blocked", &self.status_control_blocked)
            .finish()
    }
}
