// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! On-wire frame layout for the sensor's binary streaming protocol.
//!
//! Each frame is 232 bytes: a 2-byte head marker, a 16-byte device header,
//! 2 channels x 35 points of 3-byte samples, 2 reserved bytes and a 2-byte
//! tail marker. The header and reserved fields carry device status counters
//! the acquisition path does not interpret.

pub mod codec;
pub mod sync;

/// Total length of one frame on the wire.
pub const FRAME_LEN: usize = 232;
/// Head marker bytes at offset 0.
pub const FRAME_HEAD: [u8; 2] = [0xAD, 0xDE];
/// Tail marker bytes at offset `FRAME_LEN - 2`.
pub const FRAME_TAIL: [u8; 2] = [0xEF, 0xBE];
/// Device header length, between the head marker and the samples.
pub const HEADER_LEN: usize = 16;
/// Offset of the first sample byte.
pub const SAMPLES_OFFSET: usize = FRAME_HEAD.len() + HEADER_LEN;
/// Channels carried per frame.
pub const CHANNELS: usize = 2;
/// Data points per channel per frame.
pub const POINTS_PER_FRAME: usize = 35;
/// Width of one sample field.
pub const SAMPLE_BYTES: usize = 3;
/// Length of the channel-major sample region.
pub const SAMPLES_LEN: usize = CHANNELS * POINTS_PER_FRAME * SAMPLE_BYTES;

/// Upper bound on bytes the synchronizer retains while hunting for a frame.
pub const MAX_PENDING_BYTES: usize = 8 * 1024;

/// Volts per ADC count: 9 V reference, gain 48, 24-bit full scale.
pub const VOLTS_PER_COUNT: f64 = 9.0 / 48.0 / 8_388_608.0;

/// Nominal sampling rate of the front end, per channel.
pub const SAMPLE_RATE_HZ: f64 = 250.0;

pub use codec::{decode_frame, decode_samples, encode_frame, SampleGrid};
pub use sync::FrameSync;
