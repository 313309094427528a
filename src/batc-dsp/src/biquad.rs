// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Second-order IIR section in Direct Form II Transposed.

/// One biquad section with normalized coefficients (a0 = 1) and two
/// persistent state cells. State survives across buffer boundaries so a
/// continuous stream can be filtered in arbitrary-size chunks.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    /// Build a section from `[b0, b1, b2]` and `[a1, a2]` with zeroed state.
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self {
            b0: b[0],
            b1: b[1],
            b2: b[2],
            a1: a[0],
            a2: a[1],
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Advance the section by one sample.
    ///
    /// The update order is part of the filter definition and must not be
    /// reassociated: y depends on the old z1, and z1 on the old z2.
    #[inline]
    pub fn tick(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    /// Run the section across a whole buffer in place.
    pub fn process_in_place(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    /// Zero the state cells.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_section() -> Biquad {
        Biquad::new([0.8115, 1.6229, 0.8115], [1.4516, 0.7943])
    }

    #[test]
    fn test_zero_input_zero_state() {
        let mut section = test_section();
        for _ in 0..100 {
            assert_eq!(section.tick(0.0), 0.0);
        }
    }

    #[test]
    fn test_impulse_first_output_is_b0() {
        let mut section = test_section();
        assert_eq!(section.tick(1.0), 0.8115);
    }

    #[test]
    fn test_reset_replays_identically() {
        let input: Vec<f64> = (0..50).map(|i| (i as f64 * 0.3).sin()).collect();

        let mut section = test_section();
        let first: Vec<f64> = input.iter().map(|&x| section.tick(x)).collect();

        section.reset();
        let second: Vec<f64> = input.iter().map(|&x| section.tick(x)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_state_persists_across_buffers() {
        let input: Vec<f64> = (0..64).map(|i| (i as f64 * 0.1).cos()).collect();

        let mut whole = test_section();
        let mut expected = input.clone();
        whole.process_in_place(&mut expected);

        let mut chunked = test_section();
        let mut actual = input.clone();
        let (head, tail) = actual.split_at_mut(17);
        chunked.process_in_place(head);
        chunked.process_in_place(tail);

        assert_eq!(expected, actual);
    }
}
