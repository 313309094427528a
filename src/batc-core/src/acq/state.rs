// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the byte stream comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A real sensor on a serial port.
    Physical,
    /// The in-process demo generator.
    Synthetic,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "physical"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Lifecycle phase, the coarse projection of the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcqPhase {
    #[default]
    Disconnected,
    Connected,
    Transmitting,
}

impl fmt::Display for AcqPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::Transmitting => write!(f, "Transmitting"),
        }
    }
}

/// Read-only state snapshot shared with consumers on every transition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AcqSnapshot {
    pub phase: AcqPhase,
    /// Active source while connected, `None` when disconnected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    /// Configured serial port path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl AcqSnapshot {
    pub fn is_connected(&self) -> bool {
        self.phase != AcqPhase::Disconnected
    }

    pub fn is_transmitting(&self) -> bool {
        self.phase == AcqPhase::Transmitting
    }
}
