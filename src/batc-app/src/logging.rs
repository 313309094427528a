// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging with optional level from config.
/// The debug flag wins over the configured level; both absent or an
/// invalid level fall back to INFO.
pub fn init_logging(debug: bool, log_level: Option<&str>) {
    let level = if debug {
        Level::DEBUG
    } else {
        log_level
            .and_then(|s| s.parse::<Level>().ok())
            .unwrap_or(Level::INFO)
    };

    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(level)
        .init();
}
