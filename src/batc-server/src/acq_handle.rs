// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Thin handle giving main access to the acquisition task and its streams.

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use batc_core::{AcqCommand, AcqError, AcqRequest, AcqSnapshot, ConnectParams, Spectrum, WaveBlock};

/// A handle to the running acquisition task.
///
/// Created once in `main.rs` next to the task spawn; commands flow through
/// `acq_tx`, published signal data comes back over the broadcast channels.
pub struct AcqHandle {
    /// Send commands to the acquisition task.
    pub acq_tx: mpsc::Sender<AcqRequest>,
    /// Watch the latest lifecycle snapshot.
    pub state_rx: watch::Receiver<AcqSnapshot>,
    /// Completed wave blocks, one per accumulator batch.
    pub wave_tx: broadcast::Sender<WaveBlock>,
    /// Completed spectra, one per full analysis window.
    pub spectrum_tx: broadcast::Sender<Spectrum>,
}

impl AcqHandle {
    /// Send one command and wait for the task's answer.
    pub async fn request(&self, cmd: AcqCommand) -> Result<AcqSnapshot, AcqError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        let req = AcqRequest {
            cmd,
            respond_to: resp_tx,
        };
        if self.acq_tx.send(req).await.is_err() {
            return Err(AcqError::TaskGone);
        }
        match resp_rx.await {
            Ok(result) => result,
            Err(_) => Err(AcqError::TaskGone),
        }
    }

    /// Connect using the port and baud rate the task was configured with.
    pub async fn connect(&self) -> Result<AcqSnapshot, AcqError> {
        self.request(AcqCommand::Connect(None)).await
    }

    /// Connect to a specific port, overriding the configured link.
    pub async fn connect_to(&self, port: &str, baud: u32) -> Result<AcqSnapshot, AcqError> {
        self.request(AcqCommand::Connect(Some(ConnectParams {
            port: port.to_string(),
            baud,
        })))
        .await
    }

    pub async fn start(&self) -> Result<AcqSnapshot, AcqError> {
        self.request(AcqCommand::Start).await
    }

    pub async fn stop(&self) -> Result<AcqSnapshot, AcqError> {
        self.request(AcqCommand::Stop).await
    }

    pub async fn disconnect(&self) -> Result<AcqSnapshot, AcqError> {
        self.request(AcqCommand::Disconnect).await
    }

    /// Latest snapshot straight from the watch channel, no task round-trip.
    pub fn snapshot(&self) -> AcqSnapshot {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe_waves(&self) -> broadcast::Receiver<WaveBlock> {
        self.wave_tx.subscribe()
    }

    pub fn subscribe_spectra(&self) -> broadcast::Receiver<Spectrum> {
        self.spectrum_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orphan_handle() -> AcqHandle {
        let (acq_tx, _) = mpsc::channel(1);
        let (_state_tx, state_rx) = watch::channel(AcqSnapshot::default());
        let (wave_tx, _) = broadcast::channel(1);
        let (spectrum_tx, _) = broadcast::channel(1);
        AcqHandle {
            acq_tx,
            state_rx,
            wave_tx,
            spectrum_tx,
        }
    }

    #[tokio::test]
    async fn test_request_after_task_gone() {
        let handle = orphan_handle();
        let result = handle.request(AcqCommand::GetSnapshot).await;
        assert!(matches!(result, Err(AcqError::TaskGone)));
    }

    #[tokio::test]
    async fn test_connect_to_after_task_gone() {
        let handle = orphan_handle();
        let result = handle.connect_to("/dev/ttyACM0", 115_200).await;
        assert!(matches!(result, Err(AcqError::TaskGone)));
    }

    #[tokio::test]
    async fn test_snapshot_reads_watch_directly() {
        let handle = orphan_handle();
        assert!(!handle.snapshot().is_connected());
        assert!(!handle.snapshot().is_transmitting());
    }
}
