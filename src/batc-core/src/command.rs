// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Control commands understood by the sensor.
//!
//! Commands are short fixed frames: a 0x55 marker, an opcode, a payload
//! length, the payload, and a 0xAA terminator. Starting a stream sends the
//! current wall-clock time so the device can stamp its recording session.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Length of the start command on the wire.
pub const START_COMMAND_LEN: usize = 10;

/// Stop-transmission command.
pub const STOP_COMMAND: [u8; 4] = [CMD_MARKER, OP_STOP, 0x00, CMD_TERMINATOR];

/// Build the start-transmission command for the given timestamp.
///
/// The payload carries year (since 2000), month, day, hour, minute and
/// second as single bytes.
pub fn start_command(ts: NaiveDateTime) -> [u8; START_COMMAND_LEN] {
    [
        CMD_MARKER,
        OP_START,
        START_PAYLOAD_LEN,
        (ts.year() - 2000) as u8,
        ts.month() as u8,
        ts.day() as u8,
        ts.hour() as u8,
        ts.minute() as u8,
        ts.second() as u8,
        CMD_TERMINATOR,
    ]
}

const CMD_MARKER: u8 = 0x55;
const CMD_TERMINATOR: u8 = 0xAA;
const OP_START: u8 = 0x03;
const OP_STOP: u8 = 0x02;
const START_PAYLOAD_LEN: u8 = 0x06;
