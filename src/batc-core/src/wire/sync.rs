// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::trace;

use super::{FRAME_HEAD, FRAME_LEN, FRAME_TAIL, MAX_PENDING_BYTES};

/// Reassembles fixed-length frames from an arbitrarily chunked byte stream.
///
/// Serial reads are frame-sized but carry no alignment guarantee: a frame
/// can start anywhere in a chunk and finish in the next one. Bytes left
/// after the last complete frame are carried into the following call. A
/// head marker whose tail marker is missing at the expected offset counts
/// as line noise; the scan resumes one byte later without surfacing an
/// error.
#[derive(Debug, Default)]
pub struct FrameSync {
    pending: Vec<u8>,
}

impl FrameSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes currently carried between calls.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop all carried bytes (stream restart).
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Feed one chunk, returning every frame it completes, in order.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<[u8; FRAME_LEN]> {
        self.pending.extend_from_slice(chunk);

        // Bound the backlog before scanning; under a sustained garbage
        // flood the oldest bytes are the least likely to still matter.
        if self.pending.len() > MAX_PENDING_BYTES {
            let excess = self.pending.len() - MAX_PENDING_BYTES;
            trace!("frame sync dropping {} stale bytes", excess);
            self.pending.drain(..excess);
        }

        let mut frames = Vec::new();
        let mut pos = 0;

        while self.pending.len() - pos >= FRAME_LEN {
            let buf = &self.pending[pos..];
            if buf[..2] == FRAME_HEAD && buf[FRAME_LEN - 2..FRAME_LEN] == FRAME_TAIL {
                let mut frame = [0u8; FRAME_LEN];
                frame.copy_from_slice(&buf[..FRAME_LEN]);
                frames.push(frame);
                pos += FRAME_LEN;
            } else {
                pos += 1;
            }
        }

        self.pending.drain(..pos);
        frames
    }
}
