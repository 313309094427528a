// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod acq_handle;
mod config;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use batc_app::init_logging;
use batc_core::wire::SAMPLE_RATE_HZ;
use batc_core::{AcqRequest, AcqSnapshot, DynResult, Spectrum, WaveBlock};
use batc_daq::task::run_acquisition_task;
use batc_daq::{history, AcqTaskConfig, LinkConfig};
use batc_dsp::spectrum::NFFT;

use acq_handle::AcqHandle;
use config::ServerConfig;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - sensor acquisition daemon");
const ACQ_TASK_CHANNEL_BUFFER: usize = 32;
const WAVE_CHANNEL_BUFFER: usize = 64;
const SPECTRUM_CHANNEL_BUFFER: usize = 64;

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Serial port the sensor is attached to
    #[arg(short = 'p', long = "port")]
    port: Option<String>,
    /// Baud rate for the serial link
    #[arg(short = 'b', long = "baud")]
    baud: Option<u32>,
    /// Use the synthetic signal source instead of a serial port
    #[arg(long = "synthetic")]
    synthetic: bool,
    /// Log at debug level regardless of configuration
    #[arg(short = 'd', long = "debug")]
    debug: bool,
    /// Stream for this many seconds, then shut down (default: until Ctrl+C)
    #[arg(long = "run-seconds", value_name = "SECS")]
    run_seconds: Option<u64>,
}

/// Merge config file and CLI arguments into the task configuration.
fn resolve_task_config(cli: &Cli, cfg: &ServerConfig) -> AcqTaskConfig {
    let port = if cli.synthetic {
        String::new()
    } else {
        cli.port
            .clone()
            .unwrap_or_else(|| cfg.acquisition.port.clone())
    };
    AcqTaskConfig {
        link: LinkConfig {
            port,
            baud: cli.baud.unwrap_or(cfg.acquisition.baud),
            synthetic_fallback: cfg.acquisition.synthetic_fallback,
        },
        low_pass: cfg.acquisition.low_pass,
        high_pass: cfg.acquisition.high_pass,
        notch: cfg.acquisition.notch,
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_toml());
        return Ok(());
    }

    let (cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = ServerConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        ServerConfig::load_from_default_paths()?
    };
    cfg.validate()
        .map_err(|e| format!("Invalid server configuration: {}", e))?;

    init_logging(cli.debug, cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let task_config = resolve_task_config(&cli, &cfg);
    if task_config.link.port.is_empty() {
        info!(
            "Starting batc-server {} ({}, source: synthetic)",
            env!("CARGO_PKG_VERSION"),
            env!("BATC_SERVER_BUILD_DATE"),
        );
    } else {
        info!(
            "Starting batc-server {} ({}, source: serial {} @ {} baud)",
            env!("CARGO_PKG_VERSION"),
            env!("BATC_SERVER_BUILD_DATE"),
            task_config.link.port,
            task_config.link.baud,
        );
    }

    let (tx, rx) = mpsc::channel::<AcqRequest>(ACQ_TASK_CHANNEL_BUFFER);
    let (state_tx, state_rx) = watch::channel(AcqSnapshot::default());
    let (wave_tx, _) = broadcast::channel(WAVE_CHANNEL_BUFFER);
    let (spectrum_tx, _) = broadcast::channel(SPECTRUM_CHANNEL_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();

    let acq_shutdown_rx = shutdown_rx.clone();
    let task_wave_tx = wave_tx.clone();
    let task_spectrum_tx = spectrum_tx.clone();
    task_handles.push(tokio::spawn(async move {
        if let Err(e) = run_acquisition_task(
            task_config,
            rx,
            state_tx,
            task_wave_tx,
            task_spectrum_tx,
            acq_shutdown_rx,
        )
        .await
        {
            error!("Acquisition task error: {:?}", e);
        }
    }));

    let acq = AcqHandle {
        acq_tx: tx.clone(),
        state_rx,
        wave_tx,
        spectrum_tx,
    };

    // Subscribe the loggers before starting so no publication is missed.
    let wave_rx = acq.subscribe_waves();
    let wave_shutdown_rx = shutdown_rx.clone();
    task_handles.push(tokio::spawn(async move {
        tokio::select! {
            _ = run_wave_logger(wave_rx) => {}
            _ = wait_for_shutdown(wave_shutdown_rx) => {}
        }
    }));

    let spectrum_rx = acq.subscribe_spectra();
    let spectrum_shutdown_rx = shutdown_rx.clone();
    task_handles.push(tokio::spawn(async move {
        tokio::select! {
            _ = run_spectrum_logger(spectrum_rx) => {}
            _ = wait_for_shutdown(spectrum_shutdown_rx) => {}
        }
    }));

    acq.connect().await?;
    acq.start().await?;

    match cli.run_seconds {
        Some(secs) => {
            tokio::select! {
                _ = signal::ctrl_c() => info!("Ctrl+C received, shutting down"),
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    info!("Run time of {}s elapsed, shutting down", secs);
                }
            }
        }
        None => {
            signal::ctrl_c().await?;
            info!("Ctrl+C received, shutting down");
        }
    }

    // Stop the stream cleanly before tearing the tasks down. A dead link
    // already left the task in Disconnected, skip the command then.
    if acq.snapshot().is_connected() {
        if let Err(e) = acq.disconnect().await {
            warn!("Disconnect failed: {}", e);
        }
    }
    let captured = history::snapshot_wave_history();
    info!(
        "Session captured {} filtered samples per channel",
        captured[0].len()
    );

    let _ = shutdown_tx.send(true);
    drop(acq);
    drop(tx);
    tokio::time::sleep(Duration::from_millis(400)).await;

    for handle in &task_handles {
        if !handle.is_finished() {
            handle.abort();
        }
    }
    for handle in task_handles {
        let _ = handle.await;
    }
    Ok(())
}

/// Log completed wave blocks; per-batch detail stays at debug level.
async fn run_wave_logger(mut rx: broadcast::Receiver<WaveBlock>) {
    loop {
        match rx.recv().await {
            Ok(block) => {
                debug!(
                    "Wave block: {} samples/channel, rms {:.4} / {:.4} V",
                    block.channels[0].len(),
                    rms(&block.channels[0]),
                    rms(&block.channels[1]),
                );
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Wave logger lagging, dropped {} blocks", n);
            }
            Err(_) => break,
        }
    }
}

async fn run_spectrum_logger(mut rx: broadcast::Receiver<Spectrum>) {
    loop {
        match rx.recv().await {
            Ok(spectrum) => {
                info!(
                    "Spectrum: peaks {:.1} Hz / {:.1} Hz",
                    peak_frequency_hz(&spectrum.channels[0]),
                    peak_frequency_hz(&spectrum.channels[1]),
                );
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Spectrum logger lagging, dropped {} spectra", n);
            }
            Err(_) => break,
        }
    }
}

async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    if *shutdown_rx.borrow() {
        return;
    }
    while shutdown_rx.changed().await.is_ok() {
        if *shutdown_rx.borrow() {
            break;
        }
    }
}

fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Frequency of the strongest bin in a one-sided spectrum.
fn peak_frequency_hz(bins: &[f64]) -> f64 {
    let peak_bin = bins
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    peak_bin as f64 * SAMPLE_RATE_HZ / NFFT as f64
}
