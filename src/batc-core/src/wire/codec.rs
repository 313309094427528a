// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use super::{
    CHANNELS, FRAME_HEAD, FRAME_LEN, FRAME_TAIL, POINTS_PER_FRAME, SAMPLES_LEN, SAMPLES_OFFSET,
    SAMPLE_BYTES, VOLTS_PER_COUNT,
};

/// Decoded samples of one frame, channel-major, in volts.
pub type SampleGrid = [[f64; POINTS_PER_FRAME]; CHANNELS];

const FULL_SCALE: i32 = 1 << 23;

/// Sign-extend a 24-bit two's-complement count.
fn sign_extend_24(raw: u32) -> i32 {
    if raw >= FULL_SCALE as u32 {
        raw as i32 - (1 << 24)
    } else {
        raw as i32
    }
}

/// Decode the sample region of a complete, marker-checked frame.
pub fn decode_frame(frame: &[u8; FRAME_LEN]) -> SampleGrid {
    decode_samples(&frame[SAMPLES_OFFSET..SAMPLES_OFFSET + SAMPLES_LEN])
}

/// Decode a channel-major block of 3-byte sample fields into volts.
///
/// The device transmits each field most-significant byte last, so the raw
/// bytes are reassembled in reverse order (a little-endian read). A block
/// that is not a whole number of channels decodes to zeros; malformed data
/// must not take the stream down.
pub fn decode_samples(block: &[u8]) -> SampleGrid {
    let mut grid = [[0.0; POINTS_PER_FRAME]; CHANNELS];
    if block.len() != SAMPLES_LEN {
        return grid;
    }

    let stride = POINTS_PER_FRAME * SAMPLE_BYTES;
    for (ch, row) in grid.iter_mut().enumerate() {
        for (pt, out) in row.iter_mut().enumerate() {
            let at = ch * stride + pt * SAMPLE_BYTES;
            let raw = u32::from(block[at])
                | u32::from(block[at + 1]) << 8
                | u32::from(block[at + 2]) << 16;
            *out = f64::from(sign_extend_24(raw)) * VOLTS_PER_COUNT;
        }
    }
    grid
}

/// Build a complete frame around a sample grid. Inverse of [`decode_frame`];
/// header and reserved bytes are zeroed, out-of-range samples clamp to the
/// 24-bit limits.
pub fn encode_frame(grid: &SampleGrid) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..2].copy_from_slice(&FRAME_HEAD);
    frame[FRAME_LEN - 2..].copy_from_slice(&FRAME_TAIL);

    let stride = POINTS_PER_FRAME * SAMPLE_BYTES;
    for (ch, row) in grid.iter().enumerate() {
        for (pt, &volts) in row.iter().enumerate() {
            let counts = (volts / VOLTS_PER_COUNT).round() as i64;
            let counts = counts.clamp(-(FULL_SCALE as i64), FULL_SCALE as i64 - 1) as i32;
            let raw = counts as u32 & 0xFF_FFFF;

            let at = SAMPLES_OFFSET + ch * stride + pt * SAMPLE_BYTES;
            frame[at] = (raw & 0xFF) as u8;
            frame[at + 1] = (raw >> 8 & 0xFF) as u8;
            frame[at + 2] = (raw >> 16 & 0xFF) as u8;
        }
    }
    frame
}
