// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Acquisition task owning the device link, state machine and read loop.

use std::io;

use chrono::Local;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use batc_core::command::{start_command, STOP_COMMAND};
use batc_core::wire::FrameSync;
use batc_core::{
    AcqCommand, AcqError, AcqEvent, AcqRequest, AcqSnapshot, AcqStateMachine, ConnectParams,
    DynResult, Spectrum, SourceKind, WaveBlock,
};

use crate::link::{DeviceLink, LinkConfig};
use crate::pipeline::SignalPipeline;

/// Bytes requested per read from the device link.
const READ_CHUNK_BYTES: usize = 1024;

/// Configuration for the acquisition task.
#[derive(Debug, Clone)]
pub struct AcqTaskConfig {
    pub link: LinkConfig,
    pub low_pass: bool,
    pub high_pass: bool,
    pub notch: bool,
}

impl Default for AcqTaskConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            low_pass: true,
            high_pass: true,
            notch: true,
        }
    }
}

/// A running read loop and the flag that stops it.
struct ReaderHandle {
    join: JoinHandle<Option<DeviceLink>>,
    stop_tx: watch::Sender<bool>,
}

/// Run the acquisition task until the request channel closes or shutdown is
/// signalled.
///
/// The task serializes all link access: commands arrive over `rx`, every
/// state transition is published on `state_tx`, and while transmitting a
/// spawned read loop feeds the wave and spectrum channels.
pub async fn run_acquisition_task(
    config: AcqTaskConfig,
    mut rx: mpsc::Receiver<AcqRequest>,
    state_tx: watch::Sender<AcqSnapshot>,
    wave_tx: broadcast::Sender<WaveBlock>,
    spectrum_tx: broadcast::Sender<Spectrum>,
    shutdown_rx: watch::Receiver<bool>,
) -> DynResult<()> {
    info!(
        "Acquisition task ready ({} @ {} baud)",
        config.link.port, config.link.baud
    );

    let mut machine = AcqStateMachine::new();
    let mut link: Option<DeviceLink> = None;
    let mut reader: Option<ReaderHandle> = None;
    let mut active_port: Option<String> = None;

    let _ = state_tx.send(snapshot_of(&machine, &active_port));

    loop {
        tokio::select! {
            maybe_req = rx.recv() => {
                let Some(AcqRequest { cmd, respond_to }) = maybe_req else {
                    info!("Acquisition task shutting down (channel closed)");
                    break;
                };
                let cmd_label = format!("{:?}", cmd);
                let started = Instant::now();

                let mut ctx = CommandExecContext {
                    config: &config,
                    machine: &mut machine,
                    link: &mut link,
                    reader: &mut reader,
                    active_port: &mut active_port,
                    wave_tx: &wave_tx,
                    spectrum_tx: &spectrum_tx,
                };
                let result = process_command(cmd, &mut ctx).await;

                let _ = respond_to.send(result);
                let _ = state_tx.send(snapshot_of(&machine, &active_port));
                debug!(
                    "Acquisition command {} completed in {:?}",
                    cmd_label,
                    started.elapsed()
                );
            },

            exited = join_reader(&mut reader) => {
                reader = None;
                active_port = None;
                match exited {
                    Ok(_) => warn!(
                        "Device link lost after {:?} in {}",
                        machine.time_in_state().unwrap_or_default(),
                        machine.state(),
                    ),
                    Err(e) => error!("Read loop failed: {:?}", e),
                }
                if machine.process_event(AcqEvent::LinkLost) {
                    let _ = state_tx.send(snapshot_of(&machine, &active_port));
                }
            },

            _ = wait_for_flag(shutdown_rx.clone()) => {
                info!("Acquisition task shutting down (shutdown signal)");
                break;
            },
        }
    }

    // Leave no read loop running behind us.
    if let Some(active) = reader.take() {
        let _ = active.stop_tx.send(true);
        let _ = active.join.await;
    }
    Ok(())
}

/// Mutable task state handed to the command handlers.
struct CommandExecContext<'a> {
    config: &'a AcqTaskConfig,
    machine: &'a mut AcqStateMachine,
    link: &'a mut Option<DeviceLink>,
    reader: &'a mut Option<ReaderHandle>,
    active_port: &'a mut Option<String>,
    wave_tx: &'a broadcast::Sender<WaveBlock>,
    spectrum_tx: &'a broadcast::Sender<Spectrum>,
}

impl CommandExecContext<'_> {
    fn snapshot(&self) -> AcqSnapshot {
        snapshot_of(self.machine, self.active_port)
    }
}

async fn process_command(
    cmd: AcqCommand,
    ctx: &mut CommandExecContext<'_>,
) -> Result<AcqSnapshot, AcqError> {
    match cmd {
        AcqCommand::GetSnapshot => Ok(ctx.snapshot()),
        AcqCommand::Connect(params) => handle_connect(ctx, params),
        AcqCommand::Start => handle_start(ctx).await,
        AcqCommand::Stop => handle_stop(ctx).await,
        AcqCommand::Disconnect => handle_disconnect(ctx).await,
    }
}

fn handle_connect(
    ctx: &mut CommandExecContext<'_>,
    params: Option<ConnectParams>,
) -> Result<AcqSnapshot, AcqError> {
    if ctx.machine.state().is_connected() {
        return Err(AcqError::invalid_state("connect", ctx.machine.state()));
    }

    let mut link_config = ctx.config.link.clone();
    if let Some(ConnectParams { port, baud }) = params {
        link_config.port = port;
        link_config.baud = baud;
    }

    let (link, source) = DeviceLink::open(&link_config)?;
    *ctx.active_port = match source {
        SourceKind::Physical => Some(link_config.port),
        SourceKind::Synthetic => None,
    };
    *ctx.link = Some(link);
    ctx.machine.process_event(AcqEvent::Connected(source));
    info!("Connected ({} source)", source);
    Ok(ctx.snapshot())
}

async fn handle_start(ctx: &mut CommandExecContext<'_>) -> Result<AcqSnapshot, AcqError> {
    if !ctx.machine.state().is_connected() || ctx.machine.state().is_transmitting() {
        return Err(AcqError::invalid_state(
            "start transmission",
            ctx.machine.state(),
        ));
    }
    let Some(mut link) = ctx.link.take() else {
        return Err(AcqError::invalid_state(
            "start transmission",
            ctx.machine.state(),
        ));
    };

    let start = start_command(Local::now().naive_local());
    if let Err(e) = link.write_command(&start).await {
        *ctx.link = Some(link);
        return Err(AcqError::Link(e));
    }
    link.clear_input();

    let pipeline = SignalPipeline::new(
        ctx.config.low_pass,
        ctx.config.high_pass,
        ctx.config.notch,
        ctx.wave_tx.clone(),
        ctx.spectrum_tx.clone(),
    );
    let (stop_tx, stop_rx) = watch::channel(false);
    let join = tokio::spawn(run_read_loop(link, pipeline, stop_rx));
    *ctx.reader = Some(ReaderHandle { join, stop_tx });

    ctx.machine.process_event(AcqEvent::StartRequested);
    info!("Transmission started");
    Ok(ctx.snapshot())
}

async fn handle_stop(ctx: &mut CommandExecContext<'_>) -> Result<AcqSnapshot, AcqError> {
    if !ctx.machine.state().is_transmitting() {
        return Err(AcqError::invalid_state(
            "stop transmission",
            ctx.machine.state(),
        ));
    }
    let Some(active) = ctx.reader.take() else {
        return Err(AcqError::invalid_state(
            "stop transmission",
            ctx.machine.state(),
        ));
    };

    match stop_read_loop(active).await {
        Some(mut link) => {
            // The stop command is best-effort; the read loop is already
            // down, so a write failure leaves nothing inconsistent.
            if let Err(e) = link.write_command(&STOP_COMMAND).await {
                warn!("Stop command failed: {}", e);
            }
            *ctx.link = Some(link);
            ctx.machine.process_event(AcqEvent::StopRequested);
            info!("Transmission stopped");
            Ok(ctx.snapshot())
        }
        None => {
            *ctx.active_port = None;
            ctx.machine.process_event(AcqEvent::LinkLost);
            warn!("Device link lost while stopping");
            Err(AcqError::Command(
                "device link lost while stopping".to_string(),
            ))
        }
    }
}

async fn handle_disconnect(ctx: &mut CommandExecContext<'_>) -> Result<AcqSnapshot, AcqError> {
    if !ctx.machine.state().is_connected() {
        return Ok(ctx.snapshot());
    }

    if let Some(active) = ctx.reader.take() {
        if let Some(mut link) = stop_read_loop(active).await {
            if let Err(e) = link.write_command(&STOP_COMMAND).await {
                warn!("Stop command failed: {}", e);
            }
        }
    }
    *ctx.link = None;
    *ctx.active_port = None;
    ctx.machine.process_event(AcqEvent::DisconnectRequested);
    info!("Disconnected");
    Ok(ctx.snapshot())
}

/// Signal the read loop to stop and wait for it to hand the link back.
async fn stop_read_loop(active: ReaderHandle) -> Option<DeviceLink> {
    let _ = active.stop_tx.send(true);
    match active.join.await {
        Ok(link) => link,
        Err(e) => {
            error!("Read loop failed: {:?}", e);
            None
        }
    }
}

/// Pump the device link through the signal pipeline until stopped.
///
/// Returns the link for reuse on a requested stop, `None` when the link
/// itself died. Read timeouts only mean the device is idle.
async fn run_read_loop(
    mut link: DeviceLink,
    mut pipeline: SignalPipeline,
    stop_rx: watch::Receiver<bool>,
) -> Option<DeviceLink> {
    let mut sync = FrameSync::new();
    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        tokio::select! {
            _ = wait_for_flag(stop_rx.clone()) => return Some(link),
            read = link.read_chunk(&mut chunk) => match read {
                Ok(0) => {
                    warn!("Device stream closed");
                    return None;
                }
                Ok(n) => {
                    for frame in sync.push_bytes(&chunk[..n]) {
                        pipeline.process_frame(&frame);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    debug!("Device read idle");
                }
                Err(e) => {
                    warn!("Device read failed: {}", e);
                    return None;
                }
            },
        }
    }
}

/// Wait for the reader to exit on its own; pends forever while idle.
async fn join_reader(
    reader: &mut Option<ReaderHandle>,
) -> Result<Option<DeviceLink>, tokio::task::JoinError> {
    match reader.as_mut() {
        Some(active) => (&mut active.join).await,
        None => std::future::pending().await,
    }
}

/// Resolves when the flag is raised or its sender is gone.
async fn wait_for_flag(mut rx: watch::Receiver<bool>) {
    if *rx.borrow() {
        return;
    }
    while rx.changed().await.is_ok() {
        if *rx.borrow() {
            break;
        }
    }
}

fn snapshot_of(machine: &AcqStateMachine, active_port: &Option<String>) -> AcqSnapshot {
    AcqSnapshot {
        phase: machine.state().phase(),
        source: machine.state().source(),
        port: active_port.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    use batc_core::AcqPhase;

    use crate::history;

    fn synthetic_config() -> AcqTaskConfig {
        AcqTaskConfig {
            link: LinkConfig {
                port: "/dev/batc-test-no-such-port".to_string(),
                synthetic_fallback: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    struct TaskUnderTest {
        tx: mpsc::Sender<AcqRequest>,
        wave_tx: broadcast::Sender<WaveBlock>,
        shutdown_tx: watch::Sender<bool>,
        join: JoinHandle<DynResult<()>>,
    }

    fn spawn_task(config: AcqTaskConfig) -> TaskUnderTest {
        let (tx, rx) = mpsc::channel(32);
        let (state_tx, _state_rx) = watch::channel(AcqSnapshot::default());
        let (wave_tx, _) = broadcast::channel(64);
        let (spectrum_tx, _) = broadcast::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(run_acquisition_task(
            config,
            rx,
            state_tx,
            wave_tx.clone(),
            spectrum_tx,
            shutdown_rx,
        ));
        TaskUnderTest {
            tx,
            wave_tx,
            shutdown_tx,
            join,
        }
    }

    async fn send_cmd(
        tx: &mpsc::Sender<AcqRequest>,
        cmd: AcqCommand,
    ) -> Result<AcqSnapshot, AcqError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        tx.send(AcqRequest {
            cmd,
            respond_to: resp_tx,
        })
        .await
        .unwrap();
        resp_rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_with_synthetic_source() {
        let _guard = history::history_test_guard()
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let task = spawn_task(synthetic_config());
        let mut wave_rx = task.wave_tx.subscribe();

        let snapshot = send_cmd(&task.tx, AcqCommand::Connect(None)).await.unwrap();
        assert_eq!(snapshot.phase, AcqPhase::Connected);
        assert_eq!(snapshot.source, Some(SourceKind::Synthetic));
        assert!(snapshot.port.is_none());

        let snapshot = send_cmd(&task.tx, AcqCommand::Start).await.unwrap();
        assert!(snapshot.is_transmitting());

        // The synthetic source paces at 25 ms per frame; the first wave
        // block completes after roughly half a second.
        let block = timeout(Duration::from_secs(10), wave_rx.recv())
            .await
            .expect("no wave block before timeout")
            .unwrap();
        assert_eq!(block.channels[0].len(), 130);
        assert_eq!(block.channels[1].len(), 130);

        let snapshot = send_cmd(&task.tx, AcqCommand::Stop).await.unwrap();
        assert_eq!(snapshot.phase, AcqPhase::Connected);

        // The link survives the stop and can stream again.
        let snapshot = send_cmd(&task.tx, AcqCommand::Start).await.unwrap();
        assert!(snapshot.is_transmitting());

        let snapshot = send_cmd(&task.tx, AcqCommand::Disconnect).await.unwrap();
        assert_eq!(snapshot.phase, AcqPhase::Disconnected);
        assert!(snapshot.source.is_none());

        drop(task.tx);
        timeout(Duration::from_secs(5), task.join)
            .await
            .expect("task did not exit")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_out_of_order_commands_are_rejected() {
        let task = spawn_task(synthetic_config());

        let err = send_cmd(&task.tx, AcqCommand::Start).await.unwrap_err();
        assert!(matches!(err, AcqError::InvalidState { .. }));

        let err = send_cmd(&task.tx, AcqCommand::Stop).await.unwrap_err();
        assert!(matches!(err, AcqError::InvalidState { .. }));

        // Disconnect while disconnected is a harmless no-op.
        let snapshot = send_cmd(&task.tx, AcqCommand::Disconnect).await.unwrap();
        assert_eq!(snapshot.phase, AcqPhase::Disconnected);

        send_cmd(&task.tx, AcqCommand::Connect(None)).await.unwrap();
        let err = send_cmd(&task.tx, AcqCommand::Connect(None)).await.unwrap_err();
        assert!(matches!(err, AcqError::InvalidState { .. }));

        let _ = task.shutdown_tx.send(true);
        timeout(Duration::from_secs(5), task.join)
            .await
            .expect("task did not exit")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_params_override_configured_link() {
        // The configured port does not exist and fallback is off, so a
        // plain connect fails; overriding to the empty port selects the
        // synthetic source outright.
        let mut config = synthetic_config();
        config.link.synthetic_fallback = false;
        let task = spawn_task(config);

        let err = send_cmd(&task.tx, AcqCommand::Connect(None)).await.unwrap_err();
        assert!(matches!(err, AcqError::Link(_)));

        let params = ConnectParams {
            port: String::new(),
            baud: 115_200,
        };
        let snapshot = send_cmd(&task.tx, AcqCommand::Connect(Some(params)))
            .await
            .unwrap();
        assert_eq!(snapshot.phase, AcqPhase::Connected);
        assert_eq!(snapshot.source, Some(SourceKind::Synthetic));

        let _ = task.shutdown_tx.send(true);
        timeout(Duration::from_secs(5), task.join)
            .await
            .expect("task did not exit")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_transmitting_task() {
        let _guard = history::history_test_guard()
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let task = spawn_task(synthetic_config());
        send_cmd(&task.tx, AcqCommand::Connect(None)).await.unwrap();
        send_cmd(&task.tx, AcqCommand::Start).await.unwrap();

        let _ = task.shutdown_tx.send(true);
        timeout(Duration::from_secs(5), task.join)
            .await
            .expect("task did not exit")
            .unwrap()
            .unwrap();
    }
}
