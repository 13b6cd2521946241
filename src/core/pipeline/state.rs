//! Handler state machine
//!
//! `Idle -> Fetching -> Parsing -> Projecting -> Writing -> Done`, with
//! `Failed` reachable from any of the four working states.

use crate::domain::InvocationId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Step of a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerState {
    Idle,
    Fetching,
    Parsing,
    Projecting,
    Writing,
    Done,
    Failed,
}

impl Default for HandlerState {
    fn default() -> Self {
        Self::Idle
    }
}

impl HandlerState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: HandlerState) -> bool {
        use HandlerState::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Parsing)
                | (Parsing, Projecting)
                | (Projecting, Writing)
                | (Projecting, Done)
                | (Writing, Done)
                | (Fetching | Parsing | Projecting | Writing, Failed)
        )
    }

    /// `Done` or `Failed`
    pub fn is_terminal(self) -> bool {
        matches!(self, HandlerState::Done | HandlerState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandlerState::Idle => "Idle",
            HandlerState::Fetching => "Fetching",
            HandlerState::Parsing => "Parsing",
            HandlerState::Projecting => "Projecting",
            HandlerState::Writing => "Writing",
            HandlerState::Done => "Done",
            HandlerState::Failed => "Failed",
        }
    }
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current state of one invocation and logs each transition
///
/// `Projecting -> Done` is the dry-run path, which never writes.
#[derive(Debug)]
pub struct InvocationState {
    id: InvocationId,
    current: HandlerState,
}

impl InvocationState {
    pub fn new(id: InvocationId) -> Self {
        Self {
            id,
            current: HandlerState::Idle,
        }
    }

    pub fn current(&self) -> HandlerState {
        self.current
    }

    pub fn id(&self) -> &InvocationId {
        &self.id
    }

    /// Move to the next state
    pub fn advance(&mut self, next: HandlerState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        tracing::debug!(
            invocation_id = %self.id,
            from = %self.current,
            to = %next,
            "Handler state transition"
        );
        self.current = next;
    }

    /// Move to `Failed`, returning the state that was active
    pub fn fail(&mut self) -> HandlerState {
        let failed_in = self.current;
        self.advance(HandlerState::Failed);
        failed_in
    }
}
