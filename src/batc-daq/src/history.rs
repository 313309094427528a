// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Rolling signal history kept for consumers that attach mid-stream.

use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};

use batc_core::wire::CHANNELS;
use batc_core::{Spectrum, WaveBlock};

/// Retained filtered samples per channel.
const WAVE_HISTORY_POINTS: usize = 1000;

fn wave_history() -> &'static Mutex<[VecDeque<f64>; CHANNELS]> {
    static HISTORY: OnceLock<Mutex<[VecDeque<f64>; CHANNELS]>> = OnceLock::new();
    HISTORY.get_or_init(|| Mutex::new([VecDeque::new(), VecDeque::new()]))
}

fn latest_spectrum() -> &'static Mutex<Option<Spectrum>> {
    static LATEST: OnceLock<Mutex<Option<Spectrum>>> = OnceLock::new();
    LATEST.get_or_init(|| Mutex::new(None))
}

fn prune_wave_history(history: &mut VecDeque<f64>) {
    while history.len() > WAVE_HISTORY_POINTS {
        history.pop_front();
    }
}

pub fn record_wave_block(block: &WaveBlock) {
    let mut history = wave_history().lock().expect("wave history mutex poisoned");
    for (channel, samples) in history.iter_mut().zip(block.channels.iter()) {
        channel.extend(samples.iter().copied());
        prune_wave_history(channel);
    }
}

pub fn snapshot_wave_history() -> [Vec<f64>; CHANNELS] {
    let history = wave_history().lock().expect("wave history mutex poisoned");
    [
        history[0].iter().copied().collect(),
        history[1].iter().copied().collect(),
    ]
}

pub fn record_spectrum(spectrum: &Spectrum) {
    let mut latest = latest_spectrum()
        .lock()
        .expect("spectrum history mutex poisoned");
    *latest = Some(spectrum.clone());
}

pub fn snapshot_spectrum() -> Option<Spectrum> {
    latest_spectrum()
        .lock()
        .expect("spectrum history mutex poisoned")
        .clone()
}

pub fn clear_signal_history() {
    let mut history = wave_history().lock().expect("wave history mutex poisoned");
    for channel in history.iter_mut() {
        channel.clear();
    }
    drop(history);

    let mut latest = latest_spectrum()
        .lock()
        .expect("spectrum history mutex poisoned");
    *latest = None;
}

/// Serializes tests that touch the process-global history.
#[cfg(test)]
pub(crate) fn history_test_guard() -> &'static Mutex<()> {
    static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(()))
}
