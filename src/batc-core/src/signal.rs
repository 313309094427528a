// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::Serialize;

use crate::wire::CHANNELS;

/// One published batch of filtered samples, one row per channel.
///
/// Rows are always the batch size (130 samples); both channels advance in
/// lockstep because every frame carries the same number of points for each.
#[derive(Debug, Clone, Serialize)]
pub struct WaveBlock {
    pub channels: [Vec<f64>; CHANNELS],
}

/// One-sided amplitude spectrum for every channel, 129 bins each.
#[derive(Debug, Clone, Serialize)]
pub struct Spectrum {
    pub channels: [Vec<f64>; CHANNELS],
}
