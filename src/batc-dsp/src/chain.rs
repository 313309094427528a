// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fixed IIR cascade applied to each channel of the sensor stream.
//!
//! Three groups of four biquad sections each: an 8th-order low-pass around
//! 100 Hz, an 8th-order high-pass around 1 Hz, and a band-stop notch at
//! 59-61 Hz for mains hum. Coefficients are fixed design-time constants;
//! reproducing them digit-for-digit is required for output compatibility
//! with the device vendor's reference traces.

use crate::biquad::Biquad;

/// Coefficient rows are `[b0, b1, b2, a1, a2]` with a0 normalized to 1.
type SectionRow = [f64; 5];

// 8th-order low-pass, ~100 Hz cutoff.
const LOW_PASS_SECTIONS: [SectionRow; 4] = [
    [0.8115, 1.6229, 0.8115, 1.4516, 0.7943],
    [0.6818, 1.3637, 0.6818, 1.2197, 0.5077],
    [0.6076, 1.2151, 0.6076, 1.0869, 0.3434],
    [0.5737, 1.1475, 0.5737, 1.0264, 0.2686],
];

// 8th-order high-pass, ~1 Hz cutoff.
const HIGH_PASS_SECTIONS: [SectionRow; 4] = [
    [0.9950, -1.9899, 0.9950, -1.9896, 0.9902],
    [0.9861, -1.9722, 0.9861, -1.9718, 0.9725],
    [0.9794, -1.9588, 0.9794, -1.9584, 0.9591],
    [0.9758, -1.9516, 0.9758, -1.9513, 0.9519],
];

// Band-stop, 59-61 Hz.
const NOTCH_SECTIONS: [SectionRow; 4] = [
    [0.9902, -0.1244, 0.9902, -0.1703, 0.9810],
    [0.9902, -0.1244, 0.9902, -0.0785, 0.9809],
    [0.9773, -0.1228, 0.9773, -0.1415, 0.9546],
    [0.9773, -0.1228, 0.9773, -0.1040, 0.9546],
];

/// Cascade of biquad sections for one channel.
///
/// Groups are concatenated low-pass, then high-pass, then notch; each group
/// can be left out at construction. Processing is section-major: each
/// section runs across the whole buffer before the next section starts, so
/// a section's state only ever reflects input already shaped by the
/// sections before it.
#[derive(Debug, Clone)]
pub struct FilterChain {
    sections: Vec<Biquad>,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new(true, true, true)
    }
}

impl FilterChain {
    /// Build a chain from the enabled coefficient groups.
    pub fn new(low_pass: bool, high_pass: bool, notch: bool) -> Self {
        let mut sections = Vec::new();
        if low_pass {
            push_group(&mut sections, &LOW_PASS_SECTIONS);
        }
        if high_pass {
            push_group(&mut sections, &HIGH_PASS_SECTIONS);
        }
        if notch {
            push_group(&mut sections, &NOTCH_SECTIONS);
        }
        Self { sections }
    }

    /// Number of active biquad sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Filter a buffer in place, keeping per-section state for the next call.
    pub fn process_in_place(&mut self, buffer: &mut [f64]) {
        if buffer.is_empty() {
            return;
        }
        for section in &mut self.sections {
            section.process_in_place(buffer);
        }
    }

    /// Zero every section's state.
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

fn push_group(sections: &mut Vec<Biquad>, group: &[SectionRow; 4]) {
    for row in group {
        sections.push(Biquad::new([row[0], row[1], row[2]], [row[3], row[4]]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SAMPLE_RATE: f64 = 250.0;

    fn sine(freq_hz: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| (2.0 * PI * freq_hz * n as f64 / SAMPLE_RATE).sin())
            .collect()
    }

    fn rms(samples: &[f64]) -> f64 {
        (samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_section_counts() {
        assert_eq!(FilterChain::default().section_count(), 12);
        assert_eq!(FilterChain::new(true, false, false).section_count(), 4);
        assert_eq!(FilterChain::new(false, false, false).section_count(), 0);
    }

    #[test]
    fn test_zero_input_zero_output() {
        let mut chain = FilterChain::default();
        let mut buffer = vec![0.0; 520];
        chain.process_in_place(&mut buffer);
        assert!(buffer.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_all_disabled_is_identity() {
        let mut chain = FilterChain::new(false, false, false);
        let original = sine(13.0, 200);
        let mut buffer = original.clone();
        chain.process_in_place(&mut buffer);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_reset_replays_identically() {
        let input = sine(7.0, 400);

        let mut chain = FilterChain::default();
        let mut first = input.clone();
        chain.process_in_place(&mut first);

        chain.reset();
        let mut second = input.clone();
        chain.process_in_place(&mut second);

        let mut fresh = FilterChain::default();
        let mut third = input.clone();
        fresh.process_in_place(&mut third);

        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_high_pass_suppresses_dc() {
        let mut chain = FilterChain::default();
        let mut buffer = vec![1.0; 4000];
        chain.process_in_place(&mut buffer);
        // Leave room for the transient, then expect the offset gone.
        assert!(rms(&buffer[3900..]) < 0.05);
    }

    #[test]
    fn test_notch_attenuates_mains_hum() {
        let mut pass_chain = FilterChain::default();
        let mut in_band = sine(10.0, 2000);
        pass_chain.process_in_place(&mut in_band);

        let mut stop_chain = FilterChain::default();
        let mut hum = sine(60.0, 2000);
        stop_chain.process_in_place(&mut hum);

        let rms_pass = rms(&in_band[1500..]);
        let rms_stop = rms(&hum[1500..]);
        assert!(
            rms_pass > 3.0 * rms_stop,
            "10 Hz rms {rms_pass} vs 60 Hz rms {rms_stop}"
        );
    }

    #[test]
    fn test_chunked_equals_whole_buffer() {
        let input = sine(25.0, 390);

        let mut whole = FilterChain::default();
        let mut expected = input.clone();
        whole.process_in_place(&mut expected);

        let mut chunked = FilterChain::default();
        let mut actual = input.clone();
        for chunk in actual.chunks_mut(130) {
            chunked.process_in_place(chunk);
        }

        assert_eq!(expected, actual);
    }
}
