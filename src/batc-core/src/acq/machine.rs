// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Acquisition state machine for lifecycle management.
//!
//! Makes the connect/start/stop/disconnect transitions explicit so that
//! invalid control sequences are rejected instead of corrupting a running
//! stream.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::acq::state::{AcqPhase, SourceKind};

/// Events that can trigger state transitions.
#[derive(Debug, Clone)]
pub enum AcqEvent {
    /// A device link was established.
    Connected(SourceKind),
    /// Streaming was requested and the start command went out.
    StartRequested,
    /// The stream was stopped by request.
    StopRequested,
    /// The link died underneath us.
    LinkLost,
    /// Disconnect requested or detected.
    DisconnectRequested,
}

/// Current machine state.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(tag = "state", content = "data")]
pub enum AcqMachineState {
    /// Initial state, no device link.
    #[default]
    Disconnected,
    /// Link open, stream idle.
    Connected { source: SourceKind },
    /// Stream running, read loop active.
    Transmitting { source: SourceKind },
}

impl fmt::Display for AcqMachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected { source } => write!(f, "Connected({source})"),
            Self::Transmitting { source } => write!(f, "Transmitting({source})"),
        }
    }
}

impl AcqMachineState {
    /// Check if a device link is open.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. } | Self::Transmitting { .. })
    }

    /// Check if the stream is running.
    pub fn is_transmitting(&self) -> bool {
        matches!(self, Self::Transmitting { .. })
    }

    /// Get the active source if a link is open.
    pub fn source(&self) -> Option<SourceKind> {
        match self {
            Self::Connected { source } | Self::Transmitting { source } => Some(*source),
            Self::Disconnected => None,
        }
    }

    /// Coarse lifecycle phase for snapshots.
    pub fn phase(&self) -> AcqPhase {
        match self {
            Self::Disconnected => AcqPhase::Disconnected,
            Self::Connected { .. } => AcqPhase::Connected,
            Self::Transmitting { .. } => AcqPhase::Transmitting,
        }
    }
}

/// The state machine managing acquisition lifecycle transitions.
#[derive(Debug, Clone)]
pub struct AcqStateMachine {
    state: AcqMachineState,
    transition_count: u64,
    last_transition: Option<Instant>,
}

impl Default for AcqStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AcqStateMachine {
    /// Create a new machine in the Disconnected state.
    pub fn new() -> Self {
        Self {
            state: AcqMachineState::Disconnected,
            transition_count: 0,
            last_transition: None,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> &AcqMachineState {
        &self.state
    }

    /// Number of transitions that have occurred.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Time since the last transition.
    pub fn time_in_state(&self) -> Option<Duration> {
        self.last_transition.map(|t| t.elapsed())
    }

    /// Process an event and potentially transition.
    /// Returns true if a transition occurred.
    pub fn process_event(&mut self, event: AcqEvent) -> bool {
        let new_state = self.next_state(event);
        if let Some(state) = new_state {
            self.state = state;
            self.transition_count += 1;
            self.last_transition = Some(Instant::now());
            true
        } else {
            false
        }
    }

    /// Determine the next state for an event, `None` when invalid.
    fn next_state(&self, event: AcqEvent) -> Option<AcqMachineState> {
        match (&self.state, event) {
            (AcqMachineState::Disconnected, AcqEvent::Connected(source)) => {
                Some(AcqMachineState::Connected { source })
            }

            (AcqMachineState::Connected { source }, AcqEvent::StartRequested) => {
                Some(AcqMachineState::Transmitting { source: *source })
            }

            (AcqMachineState::Transmitting { source }, AcqEvent::StopRequested) => {
                Some(AcqMachineState::Connected { source: *source })
            }

            // The link dying always lands back in Disconnected.
            (AcqMachineState::Connected { .. }, AcqEvent::LinkLost)
            | (AcqMachineState::Transmitting { .. }, AcqEvent::LinkLost) => {
                Some(AcqMachineState::Disconnected)
            }

            // Disconnect is honored from any state.
            (_, AcqEvent::DisconnectRequested) => Some(AcqMachineState::Disconnected),

            // Invalid transition; stay put.
            _ => None,
        }
    }
}
