// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod error;
pub mod machine;
pub mod request;
pub mod state;

pub use error::AcqError;
pub use machine::{AcqEvent, AcqMachineState, AcqStateMachine};
pub use request::{AcqCommand, AcqRequest, ConnectParams};
pub use state::{AcqPhase, AcqSnapshot, SourceKind};
