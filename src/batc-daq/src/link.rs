// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Device link over a serial port, with the synthetic generator behind the
//! same interface.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{info, warn};

use batc_core::{AcqError, SourceKind};

use crate::synth::SyntheticLink;

/// Serial parameters and fallback policy for opening the sensor link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Serial port path; empty selects the synthetic source outright.
    pub port: String,
    pub baud: u32,
    /// Use the synthetic generator when the port cannot be opened.
    pub synthetic_fallback: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud: 115_200,
            synthetic_fallback: true,
        }
    }
}

/// One byte source feeding the acquisition pipeline.
pub enum DeviceLink {
    Serial(SerialStream),
    Synthetic(SyntheticLink),
}

impl DeviceLink {
    const READ_TIMEOUT: Duration = Duration::from_millis(300);

    /// Open the configured serial port, or the synthetic generator when the
    /// port is unavailable and fallback is allowed.
    pub fn open(config: &LinkConfig) -> Result<(Self, SourceKind), AcqError> {
        if config.port.is_empty() {
            info!("No serial port configured, using synthetic source");
            return Ok((Self::Synthetic(SyntheticLink::new()), SourceKind::Synthetic));
        }

        let builder = tokio_serial::new(&config.port, config.baud);
        match builder.open_native_async() {
            Ok(mut stream) => {
                // Some adapters gate their output on DTR/RTS.
                let _ = stream.write_data_terminal_ready(true);
                let _ = stream.write_request_to_send(true);
                info!("Serial: {} @ {} baud", config.port, config.baud);
                Ok((Self::Serial(stream), SourceKind::Physical))
            }
            Err(e) if config.synthetic_fallback => {
                warn!(
                    "Opening {} failed ({}), using synthetic source",
                    config.port, e
                );
                Ok((Self::Synthetic(SyntheticLink::new()), SourceKind::Synthetic))
            }
            Err(e) => Err(AcqError::Link(io::Error::from(e))),
        }
    }

    /// Which source this link reads from.
    pub fn source(&self) -> SourceKind {
        match self {
            Self::Serial(_) => SourceKind::Physical,
            Self::Synthetic(_) => SourceKind::Synthetic,
        }
    }

    /// Read the next chunk of stream bytes into `buf`.
    ///
    /// `buf` must hold at least one wire frame. A stalled serial port
    /// surfaces as `ErrorKind::TimedOut`; callers treat that as idle, not
    /// as link loss.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Serial(stream) => match timeout(Self::READ_TIMEOUT, stream.read(buf)).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "serial read timed out",
                )),
            },
            Self::Synthetic(synth) => {
                let frame = synth.next_frame().await;
                buf[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
        }
    }

    /// Send a device command, flushing it out immediately.
    pub async fn write_command(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::Serial(stream) => {
                stream.write_all(bytes).await?;
                stream.flush().await
            }
            Self::Synthetic(synth) => {
                synth.accept_command(bytes);
                Ok(())
            }
        }
    }

    /// Drop any stale bytes buffered on the input side.
    pub fn clear_input(&mut self) {
        if let Self::Serial(stream) = self {
            let _ = stream.clear(ClearBuffer::Input);
        }
    }
}
