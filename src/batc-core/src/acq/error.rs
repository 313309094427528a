// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

/// Errors produced by the acquisition controller.
#[derive(Debug, Error)]
pub enum AcqError {
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Device link error: {0}")]
    Link(#[from] std::io::Error),

    #[error("Device command failed: {0}")]
    Command(String),

    #[error("Acquisition task is not running")]
    TaskGone,
}

impl AcqError {
    /// Build an `InvalidState` error for a rejected operation.
    pub fn invalid_state(operation: &'static str, state: impl std::fmt::Display) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = AcqError::invalid_state("start", "Disconnected");
        assert_eq!(err.to_string(), "Cannot start while Disconnected");
    }

    #[test]
    fn test_link_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        let err = AcqError::from(io);
        assert!(matches!(err, AcqError::Link(_)));
        assert!(err.to_string().contains("read timed out"));
    }
}
