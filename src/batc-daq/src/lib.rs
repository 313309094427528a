// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod history;
pub mod link;
pub mod pipeline;
pub mod synth;
pub mod task;

pub use link::{DeviceLink, LinkConfig};
pub use pipeline::SignalPipeline;
pub use task::{run_acquisition_task, AcqTaskConfig};
