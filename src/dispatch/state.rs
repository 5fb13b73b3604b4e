//! Run lifecycle states.

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle of one dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    AwaitingSession,
    Ready,
    Dispatching,
    Draining,
    Completed,
    Failed,
}

impl EngineState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: EngineState) -> bool {
        use EngineState::*;
        matches!(
            (self, next),
            (Idle, AwaitingSession)
                | (AwaitingSession, Ready)
                | (AwaitingSession, Failed)
                | (Ready, Dispatching)
                | (Dispatching, Draining)
                | (Dispatching, Failed)
                | (Draining, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::Completed | EngineState::Failed)
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Current state plus every state visited, in order.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: EngineState,
    history: Vec<EngineState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: EngineState::Idle,
            history: vec![EngineState::Idle],
        }
    }

    pub fn current(&self) -> EngineState {
        self.current
    }

    pub fn history(&self) -> &[EngineState] {
        &self.history
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: EngineState) {
        if !self.current.can_transition_to(next) {
            warn!(from = %self.current, to = %next, "Ignoring illegal state transition");
            return;
        }
        debug!(from = %self.current, to = %next, "Engine state transition");
        self.current = next;
        self.history.push(next);
    }

    pub fn into_history(self) -> Vec<EngineState> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = StateMachine::new();
        for state in [
            EngineState::AwaitingSession,
            EngineState::Ready,
            EngineState::Dispatching,
            EngineState::Draining,
            EngineState::Completed,
        ] {
            machine.advance(state);
        }
        assert_eq!(machine.current(), EngineState::Completed);
        assert_eq!(machine.history().len(), 6);
        assert!(machine.current().is_terminal());
    }

    #[test]
    fn test_failed_reachable_only_from_session_wait_and_dispatch() {
        assert!(EngineState::AwaitingSession.can_transition_to(EngineState::Failed));
        assert!(EngineState::Dispatching.can_transition_to(EngineState::Failed));
        assert!(!EngineState::Ready.can_transition_to(EngineState::Failed));
        assert!(!EngineState::Draining.can_transition_to(EngineState::Failed));
        assert!(!EngineState::Idle.can_transition_to(EngineState::Failed));
    }

    #[test]
    fn test_terminal_states_have_no_successor() {
        for next in [
            EngineState::Idle,
            EngineState::AwaitingSession,
            EngineState::Dispatching,
            EngineState::Failed,
        ] {
            assert!(!EngineState::Completed.can_transition_to(next));
            assert!(!EngineState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&EngineState::AwaitingSession).unwrap();
        assert_eq!(json, "\"awaiting_session\"");
    }
}
