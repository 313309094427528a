// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Averaged one-sided amplitude spectrum over short-time Fourier frames.

use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Samples per analysis frame.
pub const WINDOW_SIZE: usize = 250;

/// Frame advance between overlapping analysis frames.
pub const HOP_SIZE: usize = 125;

/// Zero-padded transform length.
pub const NFFT: usize = 256;

/// One-sided output bins (`NFFT / 2 + 1`).
pub const SPECTRUM_BINS: usize = NFFT / 2 + 1;

/// Short-time Fourier analyzer with a cached FFT plan and Hamming window.
///
/// Each call windows the input into overlapping frames, transforms each
/// frame zero-padded to [`NFFT`], folds the negative-frequency half into
/// the positive bins, and averages the per-frame magnitudes.
pub struct SpectrumEstimator {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
}

impl Default for SpectrumEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumEstimator {
    pub fn new() -> Self {
        let window: Vec<f64> = (0..WINDOW_SIZE)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (WINDOW_SIZE - 1) as f64).cos())
            .collect();

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(NFFT);

        Self { fft, window }
    }

    /// Compute the averaged magnitude spectrum of `samples`.
    ///
    /// Inputs shorter than one analysis frame yield all-zero bins. Bin 0
    /// keeps `|Re|` only; every other bin is doubled to account for the
    /// folded negative-frequency half.
    pub fn estimate(&self, samples: &[f64]) -> Vec<f64> {
        let mut bins = vec![0.0; SPECTRUM_BINS];
        if samples.len() < WINDOW_SIZE {
            return bins;
        }

        let num_frames = 1 + (samples.len() - WINDOW_SIZE) / HOP_SIZE;
        let mut buf = vec![Complex::new(0.0, 0.0); NFFT];

        for frame in 0..num_frames {
            let start = frame * HOP_SIZE;
            for (i, slot) in buf.iter_mut().enumerate().take(WINDOW_SIZE) {
                *slot = Complex::new(samples[start + i] * self.window[i], 0.0);
            }
            for slot in buf.iter_mut().skip(WINDOW_SIZE) {
                *slot = Complex::new(0.0, 0.0);
            }
            self.fft.process(&mut buf);

            bins[0] += buf[0].re.abs();
            for (k, bin) in bins.iter_mut().enumerate().skip(1) {
                *bin += 2.0 * buf[k].norm();
            }
        }

        let inv = 1.0 / num_frames as f64;
        for bin in &mut bins {
            *bin *= inv;
        }
        bins
    }
}
