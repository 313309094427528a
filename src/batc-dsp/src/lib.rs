// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod accum;
pub mod biquad;
pub mod chain;
pub mod spectrum;

pub use accum::{ChannelOutput, ChannelPipeline};
pub use biquad::Biquad;
pub use chain::FilterChain;
pub use spectrum::SpectrumEstimator;
