// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod acq;
pub mod command;
pub mod signal;
pub mod wire;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use acq::error::AcqError;
pub use acq::machine::{AcqEvent, AcqMachineState, AcqStateMachine};
pub use acq::request::{AcqCommand, AcqRequest, ConnectParams};
pub use acq::state::{AcqPhase, AcqSnapshot, SourceKind};
pub use signal::{Spectrum, WaveBlock};
