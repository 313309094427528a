// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Synthetic frame generator used when no physical device is reachable.
//!
//! Emits the same encoded wire frames as the sensor hardware, so the whole
//! decode/filter/publish path runs unchanged against it.

use std::f64::consts::PI;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use batc_core::wire::{encode_frame, SampleGrid, CHANNELS, FRAME_LEN, POINTS_PER_FRAME};

/// Peak amplitude of the generated waveforms, volts.
const AMPLITUDE_VOLTS: f64 = 0.05;

/// Cadence of generated frames.
const FRAME_INTERVAL: Duration = Duration::from_millis(25);

/// Free-running two-channel waveform generator with frame pacing.
pub struct SyntheticLink {
    t: u64,
    next_emit: Instant,
}

impl Default for SyntheticLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticLink {
    pub fn new() -> Self {
        Self {
            t: 0,
            next_emit: Instant::now() + FRAME_INTERVAL,
        }
    }

    /// Wait for the next emission slot and produce one encoded frame.
    pub async fn next_frame(&mut self) -> [u8; FRAME_LEN] {
        tokio::time::sleep_until(self.next_emit).await;
        self.next_emit += FRAME_INTERVAL;
        encode_frame(&self.generate_grid())
    }

    /// Device commands have no effect on the generator.
    pub fn accept_command(&mut self, bytes: &[u8]) {
        debug!("Synthetic source ignoring {}-byte device command", bytes.len());
    }

    fn generate_grid(&mut self) -> SampleGrid {
        let mut grid = [[0.0; POINTS_PER_FRAME]; CHANNELS];
        for point in 0..POINTS_PER_FRAME {
            let phase = (self.t % 100) as f64;
            grid[0][point] = AMPLITUDE_VOLTS * (2.0 * PI * phase / 48.0).sin();
            grid[1][point] = AMPLITUDE_VOLTS * (2.0 * PI * phase / 60.0).cos();
            self.t += 1;
        }
        grid
    }
}
