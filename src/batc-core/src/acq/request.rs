// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tokio::sync::oneshot;

use crate::acq::error::AcqError;
use crate::acq::state::AcqSnapshot;

/// Serial parameters carried on a connect request, overriding the port and
/// baud rate the task was configured with.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub port: String,
    pub baud: u32,
}

/// Internal command handled by the acquisition task.
#[derive(Debug, Clone)]
pub enum AcqCommand {
    Connect(Option<ConnectParams>),
    Start,
    Stop,
    Disconnect,
    GetSnapshot,
}

/// Request sent to the acquisition task.
#[derive(Debug)]
pub struct AcqRequest {
    pub cmd: AcqCommand,
    pub respond_to: oneshot::Sender<Result<AcqSnapshot, AcqError>>,
}
