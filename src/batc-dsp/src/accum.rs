// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-channel sample accumulation, warm-up gating, and output batching.

use tracing::trace;

use crate::chain::FilterChain;
use crate::spectrum::{self, SpectrumEstimator};

/// Samples per published wave block.
pub const BATCH_SAMPLES: usize = 130;

/// Filtered history retained per channel (4 batches).
pub const FILTER_WINDOW: usize = 520;

/// Capacity of the buffer feeding spectral analysis (3 batches).
pub const SPECTRUM_PENDING_CAP: usize = 390;

/// Outputs produced by one [`ChannelPipeline::push_samples`] call.
#[derive(Debug, Default)]
pub struct ChannelOutput {
    /// Zero or more 130-sample filtered wave blocks.
    pub waves: Vec<Vec<f64>>,
    /// Zero or more 129-bin magnitude spectra.
    pub spectra: Vec<Vec<f64>>,
}

/// Accumulation and filtering state for a single channel.
///
/// Decoded samples are buffered until a full batch of [`BATCH_SAMPLES`] is
/// available, then filtered through the channel's own [`FilterChain`] and
/// appended to the rolling [`FILTER_WINDOW`]-sample history. The first
/// four batches only fill that history (warm-up); every batch after that
/// slides the window and is published as a wave block. Published samples
/// also accumulate toward spectral analysis: whenever at least
/// [`spectrum::WINDOW_SIZE`] filtered samples are pending, the oldest
/// [`spectrum::WINDOW_SIZE`] are handed to the estimator and dropped.
///
/// Channels never share state; cross-channel filter leakage corrupts both
/// traces.
pub struct ChannelPipeline {
    chain: FilterChain,
    estimator: SpectrumEstimator,
    batch_buf: Vec<f64>,
    window: Vec<f64>,
    spectral_pending: Vec<f64>,
}

impl Default for ChannelPipeline {
    fn default() -> Self {
        Self::new(true, true, true)
    }
}

impl ChannelPipeline {
    /// Build a pipeline with the given filter groups enabled.
    pub fn new(low_pass: bool, high_pass: bool, notch: bool) -> Self {
        Self {
            chain: FilterChain::new(low_pass, high_pass, notch),
            estimator: SpectrumEstimator::new(),
            batch_buf: Vec::with_capacity(2 * BATCH_SAMPLES),
            window: Vec::with_capacity(FILTER_WINDOW),
            spectral_pending: Vec::with_capacity(SPECTRUM_PENDING_CAP),
        }
    }

    /// Whether the warm-up history is full and blocks are being published.
    pub fn is_warmed_up(&self) -> bool {
        self.window.len() >= FILTER_WINDOW
    }

    /// Feed decoded samples, producing any wave blocks and spectra that
    /// complete as a result. Accepts any chunk size; output depends only
    /// on the concatenated stream.
    pub fn push_samples(&mut self, samples: &[f64]) -> ChannelOutput {
        self.batch_buf.extend_from_slice(samples);
        let mut out = ChannelOutput::default();

        while self.batch_buf.len() >= BATCH_SAMPLES {
            let mut batch: Vec<f64> = self.batch_buf.drain(..BATCH_SAMPLES).collect();
            self.chain.process_in_place(&mut batch);

            let sliding = self.window.len() >= FILTER_WINDOW;
            if sliding {
                self.window.drain(..BATCH_SAMPLES);
            }
            self.window.extend_from_slice(&batch);

            if sliding {
                self.spectral_pending.extend_from_slice(&batch);
                out.waves.push(batch);

                while self.spectral_pending.len() >= spectrum::WINDOW_SIZE {
                    let bins = self
                        .estimator
                        .estimate(&self.spectral_pending[..spectrum::WINDOW_SIZE]);
                    self.spectral_pending.drain(..spectrum::WINDOW_SIZE);
                    trace!(
                        "spectrum window drained, {} samples still pending",
                        self.spectral_pending.len()
                    );
                    out.spectra.push(bins);
                }
            }
        }
        out
    }

    /// Drop all buffered samples and filter state, returning to warm-up.
    pub fn reset(&mut self) {
        self.chain.reset();
        self.batch_buf.clear();
        self.window.clear();
        self.spectral_pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::SPECTRUM_BINS;

    fn sine_stream(len: usize) -> Vec<f64> {
        (0..len).map(|n| (n as f64 * 0.17).sin()).collect()
    }

    #[test]
    fn test_warm_up_publishes_nothing() {
        let mut pipeline = ChannelPipeline::default();
        let out = pipeline.push_samples(&vec![0.0; FILTER_WINDOW]);
        assert!(out.waves.is_empty());
        assert!(out.spectra.is_empty());
        assert!(pipeline.is_warmed_up());
    }

    #[test]
    fn test_first_block_after_warm_up() {
        let mut pipeline = ChannelPipeline::default();
        pipeline.push_samples(&vec![0.0; FILTER_WINDOW]);

        // One more sample is not a full batch yet.
        let out = pipeline.push_samples(&[0.0]);
        assert!(out.waves.is_empty());

        // Completing the fifth batch publishes exactly one block.
        let out = pipeline.push_samples(&vec![0.0; BATCH_SAMPLES - 1]);
        assert_eq!(out.waves.len(), 1);
        assert_eq!(out.waves[0].len(), BATCH_SAMPLES);
    }

    #[test]
    fn test_zero_stream_end_to_end() {
        let mut pipeline = ChannelPipeline::default();
        let mut waves = 0;
        let mut spectra = 0;

        for _ in 0..8 {
            let out = pipeline.push_samples(&vec![0.0; BATCH_SAMPLES]);
            for wave in &out.waves {
                assert_eq!(wave.len(), BATCH_SAMPLES);
                assert!(wave.iter().all(|&x| x == 0.0));
                waves += 1;
            }
            for bins in &out.spectra {
                assert_eq!(bins.len(), SPECTRUM_BINS);
                assert!(bins.iter().all(|&v| v == 0.0));
                spectra += 1;
            }
        }

        assert_eq!(waves, 4);
        assert_eq!(spectra, 2);
    }

    #[test]
    fn test_spectrum_timing_after_warm_up() {
        let mut pipeline = ChannelPipeline::default();
        pipeline.push_samples(&vec![0.0; FILTER_WINDOW]);

        // Batches 5..8: spectra land on the 6th and 8th (250 drained each).
        let per_batch: Vec<usize> = (0..4)
            .map(|_| {
                pipeline
                    .push_samples(&vec![0.0; BATCH_SAMPLES])
                    .spectra
                    .len()
            })
            .collect();
        assert_eq!(per_batch, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_reset_replays_identically() {
        let stream = sine_stream(1040);

        let mut pipeline = ChannelPipeline::default();
        let first = pipeline.push_samples(&stream);

        pipeline.reset();
        assert!(!pipeline.is_warmed_up());
        let second = pipeline.push_samples(&stream);

        assert_eq!(first.waves, second.waves);
        assert_eq!(first.spectra, second.spectra);
        assert_eq!(first.waves.len(), 4);
        assert_eq!(first.spectra.len(), 2);
    }

    #[test]
    fn test_chunk_size_does_not_change_output() {
        let stream = sine_stream(1050);

        let mut whole = ChannelPipeline::default();
        let expected = whole.push_samples(&stream);

        // Frame-sized pushes, as the decode path delivers them.
        let mut framed = ChannelPipeline::default();
        let mut waves = Vec::new();
        let mut spectra = Vec::new();
        for chunk in stream.chunks(35) {
            let out = framed.push_samples(chunk);
            waves.extend(out.waves);
            spectra.extend(out.spectra);
        }

        assert_eq!(expected.waves, waves);
        assert_eq!(expected.spectra, spectra);
    }
}
