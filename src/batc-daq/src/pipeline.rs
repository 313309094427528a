// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Frame-to-output stage owned by the read loop.

use tokio::sync::broadcast;

use batc_core::wire::{decode_frame, FRAME_LEN};
use batc_core::{Spectrum, WaveBlock};
use batc_dsp::{ChannelOutput, ChannelPipeline};

use crate::history;

/// Decodes frames and drives both channel pipelines in lockstep.
///
/// Every frame carries the same number of points for each channel, so the
/// two pipelines always complete wave blocks and spectra together and
/// their outputs can be paired positionally.
pub struct SignalPipeline {
    channels: [ChannelPipeline; 2],
    wave_tx: broadcast::Sender<WaveBlock>,
    spectrum_tx: broadcast::Sender<Spectrum>,
}

impl SignalPipeline {
    pub fn new(
        low_pass: bool,
        high_pass: bool,
        notch: bool,
        wave_tx: broadcast::Sender<WaveBlock>,
        spectrum_tx: broadcast::Sender<Spectrum>,
    ) -> Self {
        Self {
            channels: [
                ChannelPipeline::new(low_pass, high_pass, notch),
                ChannelPipeline::new(low_pass, high_pass, notch),
            ],
            wave_tx,
            spectrum_tx,
        }
    }

    /// Decode one frame, advance both channels, publish whatever completed.
    ///
    /// Publication is fire-and-forget: lagging or absent subscribers never
    /// block the read loop.
    pub fn process_frame(&mut self, frame: &[u8; FRAME_LEN]) {
        let grid = decode_frame(frame);
        let out1 = self.channels[0].push_samples(&grid[0]);
        let out2 = self.channels[1].push_samples(&grid[1]);
        self.publish(out1, out2);
    }

    fn publish(&self, ch1: ChannelOutput, ch2: ChannelOutput) {
        for (w1, w2) in ch1.waves.into_iter().zip(ch2.waves) {
            let block = WaveBlock { channels: [w1, w2] };
            history::record_wave_block(&block);
            let _ = self.wave_tx.send(block);
        }
        for (s1, s2) in ch1.spectra.into_iter().zip(ch2.spectra) {
            let spectrum = Spectrum { channels: [s1, s2] };
            history::record_spectrum(&spectrum);
            let _ = self.spectrum_tx.send(spectrum);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batc_core::wire::{encode_frame, CHANNELS, POINTS_PER_FRAME};
    use batc_dsp::spectrum::SPECTRUM_BINS;

    fn zero_frame() -> [u8; FRAME_LEN] {
        encode_frame(&[[0.0; POINTS_PER_FRAME]; CHANNELS])
    }

    fn test_pipeline() -> (
        SignalPipeline,
        broadcast::Receiver<WaveBlock>,
        broadcast::Receiver<Spectrum>,
    ) {
        let (wave_tx, wave_rx) = broadcast::channel(64);
        let (spectrum_tx, spectrum_rx) = broadcast::channel(64);
        let pipeline = SignalPipeline::new(true, true, true, wave_tx, spectrum_tx);
        (pipeline, wave_rx, spectrum_rx)
    }

    #[test]
    fn test_zero_frames_publish_after_warm_up() {
        let _guard = history::history_test_guard()
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let (mut pipeline, mut wave_rx, mut spectrum_rx) = test_pipeline();

        // 30 frames deliver 1050 samples per channel: 8 full batches.
        for _ in 0..30 {
            pipeline.process_frame(&zero_frame());
        }

        let mut waves = Vec::new();
        while let Ok(block) = wave_rx.try_recv() {
            waves.push(block);
        }
        assert_eq!(waves.len(), 4);
        for block in &waves {
            for channel in &block.channels {
                assert_eq!(channel.len(), 130);
                assert!(channel.iter().all(|&x| x == 0.0));
            }
        }

        let mut spectra = Vec::new();
        while let Ok(spectrum) = spectrum_rx.try_recv() {
            spectra.push(spectrum);
        }
        assert_eq!(spectra.len(), 2);
        for spectrum in &spectra {
            for channel in &spectrum.channels {
                assert_eq!(channel.len(), SPECTRUM_BINS);
            }
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let _guard = history::history_test_guard()
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let (wave_tx, _) = broadcast::channel(64);
        let (spectrum_tx, _) = broadcast::channel(64);
        let mut pipeline = SignalPipeline::new(true, true, true, wave_tx, spectrum_tx);
        for _ in 0..30 {
            pipeline.process_frame(&zero_frame());
        }
    }
}
