//! The event dispatch task: sole consumer of a session's inbound channel.
//!
//! The task creates its channel, signals readiness through the session
//! handshake, then decodes records one at a time, feeding scan fragments to
//! the [`ScanAssembler`] and forwarding everything else to the
//! [`CallbackRegistry`]. Whatever ends the loop (a terminate record, a
//! malformed record, or a closed channel) the exit guard publishes
//! [`DispatchState::Stopped`] and posts the handshake exactly once.

use std::fmt;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::callbacks::{CallbackRegistry, Notification, Outcome};
use crate::error::{BridgeError, IpcError, ProtocolError, Result};
use crate::ipc::{ChannelName, Event, EventHub, EventRecord, Handshake, HandshakeGuard};
use crate::scan::{ScanAssembler, ScanStatus};

/// Lifecycle of a dispatch task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Created,
    /// Inbound channel is open; readiness is about to be signalled.
    AwaitingStart,
    Running,
    /// Terminate record received; leaving the loop.
    Terminating,
    Stopped,
}

/// Whether the loop keeps going after a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

/// Per-record behaviour, independent of the channel it reads from.
#[derive(Debug)]
pub struct Dispatcher {
    callbacks: CallbackRegistry,
    scan: ScanAssembler,
}

impl Dispatcher {
    pub fn new(callbacks: CallbackRegistry, scan: ScanAssembler) -> Self {
        Self { callbacks, scan }
    }

    pub fn scan(&self) -> &ScanAssembler {
        &self.scan
    }

    pub fn handle(&mut self, record: EventRecord) -> std::result::Result<Flow, ProtocolError> {
        match record.decode() {
            Ok(event) => Ok(self.apply(event)),
            Err(err) => {
                self.abort_scan();
                Err(err)
            }
        }
    }

    fn apply(&mut self, event: Event) -> Flow {
        match event {
            Event::StationConnected => {
                self.notify(Notification::StationConnected(Outcome::Success));
            }
            Event::StationConnectFailed => {
                self.notify(Notification::StationConnected(Outcome::Failure));
            }
            Event::StationDisconnected => self.notify(Notification::StationDisconnected),
            Event::SoftApStationJoined => self.notify(Notification::SoftApStationJoined),
            Event::SoftApStationLeft => self.notify(Notification::SoftApStationLeft),
            Event::ScanFailed => {
                if self.scan.discard() {
                    debug!(target: "airlink::dispatch", "scan failed mid-sequence, partial results dropped");
                }
                self.notify(Notification::ScanDone {
                    outcome: Outcome::Failure,
                    results: None,
                });
            }
            Event::ScanFragment { access_point, more } => {
                let count = self.scan.push(access_point);
                if self.scan.is_terminal(more, count) {
                    let results = self.scan.finish(more);
                    if results.is_truncated() {
                        info!(target: "airlink::dispatch", cap = self.scan.cap(), "scan reached fragment cap, delivering truncated list");
                    } else {
                        debug!(target: "airlink::dispatch", count, "scan complete");
                    }
                    self.notify(Notification::ScanDone {
                        outcome: Outcome::Success,
                        results: Some(&results),
                    });
                }
            }
            Event::Terminate => return Flow::Terminate,
        }
        Flow::Continue
    }

    /// Drops a partial scan and tells the scan handler it failed.
    pub fn abort_scan(&mut self) {
        if self.scan.discard() {
            self.notify(Notification::ScanDone {
                outcome: Outcome::Failure,
                results: None,
            });
        }
    }

    fn notify(&self, notification: Notification<'_>) {
        self.callbacks.notify(notification);
    }
}

/// Everything a dispatch task needs to run.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub channel: ChannelName,
    pub hub: EventHub,
    pub capacity: usize,
    pub callbacks: CallbackRegistry,
    pub scan_cap: usize,
    pub scan_status: ScanStatus,
    pub handshake: Handshake,
    pub task_name: String,
}

/// Handle to a spawned dispatch task. Dropping it aborts the task.
pub struct DispatchTask {
    channel: ChannelName,
    handle: Option<JoinHandle<Result<()>>>,
    state: watch::Receiver<DispatchState>,
    handshake: Handshake,
}

impl fmt::Debug for DispatchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTask")
            .field("channel", &self.channel)
            .field("state", &self.state())
            .field("handshake", &self.handshake)
            .finish()
    }
}

impl DispatchTask {
    pub fn spawn(ctx: DispatchContext) -> Self {
        let (state_tx, state_rx) = watch::channel(DispatchState::Created);
        let span = info_span!("dispatch", task = %ctx.task_name, channel = %ctx.channel);
        let channel = ctx.channel.clone();
        let handshake = ctx.handshake.clone();
        let handle = tokio::spawn(run(ctx, state_tx).instrument(span));

        Self {
            channel,
            handle: Some(handle),
            state: state_rx,
            handshake,
        }
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn state(&self) -> DispatchState {
        *self.state.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<DispatchState> {
        self.state.clone()
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Waits for the task to finish and returns how its loop ended.
    pub async fn join(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(target: "airlink::dispatch", channel = %self.channel, error = %err, "dispatch task did not finish cleanly");
                Err(IpcError::Closed(self.channel.clone()).into())
            }
        }
    }
}

impl Drop for DispatchTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Releases the scan flag, publishes `Stopped` and then posts the handshake
/// when the loop unwinds, including when the task is aborted.
struct ExitGuard {
    state: watch::Sender<DispatchState>,
    scan_status: ScanStatus,
    _signal: HandshakeGuard,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.scan_status.release();
        self.state.send_replace(DispatchState::Stopped);
    }
}

async fn run(ctx: DispatchContext, state: watch::Sender<DispatchState>) -> Result<()> {
    let mut inbox = match ctx.hub.create(&ctx.channel, ctx.capacity) {
        Ok(inbox) => inbox,
        Err(err) => {
            error!(target: "airlink::dispatch", error = %err, "failed to open event channel");
            state.send_replace(DispatchState::Stopped);
            ctx.handshake.signal();
            return Err(err.into());
        }
    };
    state.send_replace(DispatchState::AwaitingStart);
    ctx.handshake.signal();

    let exit = ExitGuard {
        state,
        scan_status: ctx.scan_status.clone(),
        _signal: ctx.handshake.guard(),
    };
    exit.state.send_replace(DispatchState::Running);
    debug!(target: "airlink::dispatch", "dispatch loop running");

    let scan = ScanAssembler::new(ctx.scan_cap, ctx.scan_status.clone());
    let mut dispatcher = Dispatcher::new(ctx.callbacks.clone(), scan);

    loop {
        let Some(record) = inbox.recv().await else {
            warn!(target: "airlink::dispatch", "event channel closed underneath the dispatch task");
            dispatcher.abort_scan();
            return Err(BridgeError::Ipc(IpcError::Closed(ctx.channel.clone())));
        };

        match dispatcher.handle(record) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Terminate) => {
                exit.state.send_replace(DispatchState::Terminating);
                if dispatcher.scan().is_active() {
                    debug!(target: "airlink::dispatch", "terminating with a partial scan, dropping it");
                }
                dispatcher.abort_scan();
                info!(target: "airlink::dispatch", "terminate received, stopping");
                break;
            }
            Err(err) => {
                error!(target: "airlink::dispatch", error = %err, "malformed event, stopping dispatch");
                return Err(err.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use airlink_model::{ApScanInfo, MacAddress};

    use super::*;
    use crate::callbacks::CallbackTable;
    use crate::ipc::{EventTag, HandshakePhase};

    type ScanLog = Arc<Mutex<Vec<(Outcome, Option<Vec<String>>)>>>;

    fn ap(n: u8) -> ApScanInfo {
        ApScanInfo::new(format!("AP{n}"), MacAddress::new([n; 6]), 6)
    }

    fn recording_dispatcher(cap: usize) -> (Dispatcher, ScanLog, Arc<Mutex<Vec<Outcome>>>) {
        let scans: ScanLog = Arc::default();
        let stations: Arc<Mutex<Vec<Outcome>>> = Arc::default();
        let registry = CallbackRegistry::new();
        let scan_log = scans.clone();
        let station_log = stations.clone();
        registry
            .register(
                CallbackTable::new()
                    .on_scan_done(move |outcome, results| {
                        let ssids = results.map(|list| {
                            list.iter().map(|ap| ap.ssid.clone()).collect::<Vec<_>>()
                        });
                        scan_log.lock().unwrap().push((outcome, ssids));
                    })
                    .on_station_connected(move |outcome| {
                        station_log.lock().unwrap().push(outcome);
                    }),
            )
            .unwrap();
        let dispatcher =
            Dispatcher::new(registry, ScanAssembler::new(cap, ScanStatus::default()));
        (dispatcher, scans, stations)
    }

    #[test]
    fn three_fragments_deliver_one_ordered_list() {
        let (mut dispatcher, scans, _) = recording_dispatcher(32);
        for (n, more) in [(1, true), (2, true), (3, false)] {
            let flow = dispatcher
                .handle(EventRecord::scan_fragment(ap(n), more))
                .unwrap();
            assert_eq!(flow, Flow::Continue);
        }

        let scans = scans.lock().unwrap();
        assert_eq!(
            *scans,
            vec![(
                Outcome::Success,
                Some(vec!["AP1".to_string(), "AP2".to_string(), "AP3".to_string()])
            )]
        );
    }

    #[test]
    fn n_more_fragments_then_last_yield_n_plus_one() {
        for n in [0usize, 1, 5, 20] {
            let (mut dispatcher, scans, _) = recording_dispatcher(64);
            for i in 0..n {
                dispatcher
                    .handle(EventRecord::scan_fragment(ap(i as u8), true))
                    .unwrap();
            }
            assert!(scans.lock().unwrap().is_empty());
            dispatcher
                .handle(EventRecord::scan_fragment(ap(200), false))
                .unwrap();

            let scans = scans.lock().unwrap();
            assert_eq!(scans.len(), 1);
            let (outcome, ssids) = &scans[0];
            assert_eq!(*outcome, Outcome::Success);
            let ssids = ssids.as_ref().unwrap();
            assert_eq!(ssids.len(), n + 1);
            assert_eq!(ssids.last().unwrap(), "AP200");
            for (i, ssid) in ssids.iter().take(n).enumerate() {
                assert_eq!(ssid, &format!("AP{i}"));
            }
        }
    }

    #[test]
    fn cap_truncates_instead_of_failing() {
        let (mut dispatcher, scans, _) = recording_dispatcher(4);
        for n in 0..6 {
            dispatcher
                .handle(EventRecord::scan_fragment(ap(n), true))
                .unwrap();
        }

        let scans = scans.lock().unwrap();
        let (outcome, ssids) = &scans[0];
        assert_eq!(*outcome, Outcome::Success);
        assert_eq!(ssids.as_ref().unwrap().len(), 4);
        assert!(!dispatcher.scan().is_active() || dispatcher.scan().len() == 2);
    }

    #[test]
    fn scan_failed_discards_accumulated_fragments() {
        let (mut dispatcher, scans, _) = recording_dispatcher(32);
        dispatcher.handle(EventRecord::scan_fragment(ap(1), true)).unwrap();
        dispatcher.handle(EventRecord::scan_fragment(ap(2), true)).unwrap();
        dispatcher
            .handle(EventRecord::new(EventTag::ScanFailed))
            .unwrap();
        assert!(!dispatcher.scan().is_active());

        // A fresh scan afterwards starts from nothing.
        dispatcher.handle(EventRecord::scan_fragment(ap(9), false)).unwrap();

        let scans = scans.lock().unwrap();
        assert_eq!(scans[0], (Outcome::Failure, None));
        assert_eq!(scans[1], (Outcome::Success, Some(vec!["AP9".to_string()])));
    }

    #[test]
    fn malformed_record_mid_scan_reports_failure() {
        let (mut dispatcher, scans, _) = recording_dispatcher(32);
        dispatcher.handle(EventRecord::scan_fragment(ap(1), true)).unwrap();

        let mut bad = EventRecord::scan_fragment(ap(2), true);
        bad.len = 3;
        assert!(matches!(
            dispatcher.handle(bad),
            Err(ProtocolError::BadLength { actual: 3, .. })
        ));

        assert_eq!(*scans.lock().unwrap(), vec![(Outcome::Failure, None)]);
    }

    #[test]
    fn connect_failed_maps_to_failure_outcome() {
        let (mut dispatcher, _, stations) = recording_dispatcher(32);
        dispatcher
            .handle(EventRecord::new(EventTag::StationConnectFailed))
            .unwrap();
        dispatcher
            .handle(EventRecord::new(EventTag::StationConnected))
            .unwrap();
        assert_eq!(
            *stations.lock().unwrap(),
            vec![Outcome::Failure, Outcome::Success]
        );
    }

    fn context(hub: &EventHub, handshake: &Handshake) -> DispatchContext {
        DispatchContext {
            channel: ChannelName::generate(),
            hub: hub.clone(),
            capacity: 8,
            callbacks: CallbackRegistry::new(),
            scan_cap: 8,
            scan_status: ScanStatus::default(),
            handshake: handshake.clone(),
            task_name: "test-dispatch".into(),
        }
    }

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn terminate_signals_exactly_once() {
        let hub = EventHub::new();
        let handshake = Handshake::new();
        let ctx = context(&hub, &handshake);
        let channel = ctx.channel.clone();
        let mut task = DispatchTask::spawn(ctx);

        handshake.wait(WAIT, HandshakePhase::Startup).await.unwrap();
        assert_eq!(handshake.signals_posted(), 1);

        hub.open(&channel)
            .unwrap()
            .send(EventRecord::terminate())
            .await
            .unwrap();
        handshake.wait(WAIT, HandshakePhase::Shutdown).await.unwrap();
        task.join().await.unwrap();

        assert_eq!(task.state(), DispatchState::Stopped);
        assert_eq!(handshake.signals_posted(), 2);
        assert_eq!(handshake.pending(), 0);
    }

    #[tokio::test]
    async fn terminate_mid_scan_releases_the_scan_flag() {
        let hub = EventHub::new();
        let handshake = Handshake::new();
        let ctx = context(&hub, &handshake);
        let channel = ctx.channel.clone();
        let status = ctx.scan_status.clone();
        let mut task = DispatchTask::spawn(ctx);
        handshake.wait(WAIT, HandshakePhase::Startup).await.unwrap();

        let sender = hub.open(&channel).unwrap();
        sender.send(EventRecord::scan_fragment(ap(1), true)).await.unwrap();
        sender.send(EventRecord::terminate()).await.unwrap();
        handshake.wait(WAIT, HandshakePhase::Shutdown).await.unwrap();
        task.join().await.unwrap();

        assert!(!status.in_progress());
        assert!(status.try_claim());
    }

    #[tokio::test]
    async fn aborted_task_releases_the_scan_flag() {
        let hub = EventHub::new();
        let handshake = Handshake::new();
        let ctx = context(&hub, &handshake);
        let channel = ctx.channel.clone();
        let status = ctx.scan_status.clone();
        let mut task = DispatchTask::spawn(ctx);
        handshake.wait(WAIT, HandshakePhase::Startup).await.unwrap();

        hub.open(&channel)
            .unwrap()
            .send(EventRecord::scan_fragment(ap(1), true))
            .await
            .unwrap();
        tokio::time::timeout(WAIT, async {
            while !status.in_progress() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        task.abort();
        handshake.wait(WAIT, HandshakePhase::Shutdown).await.unwrap();
        assert!(!status.in_progress());
    }

    #[tokio::test]
    async fn malformed_event_still_signals() {
        let hub = EventHub::new();
        let handshake = Handshake::new();
        let ctx = context(&hub, &handshake);
        let channel = ctx.channel.clone();
        let mut task = DispatchTask::spawn(ctx);
        handshake.wait(WAIT, HandshakePhase::Startup).await.unwrap();

        let mut record = EventRecord::new(EventTag::StationDisconnected);
        record.tag = 0xdead;
        hub.open(&channel).unwrap().send(record).await.unwrap();

        handshake.wait(WAIT, HandshakePhase::Shutdown).await.unwrap();
        let outcome = task.join().await;
        assert_eq!(
            outcome,
            Err(BridgeError::Protocol(ProtocolError::UnknownTag(0xdead)))
        );
        assert_eq!(task.state(), DispatchState::Stopped);
    }

    #[tokio::test]
    async fn duplicate_channel_fails_fast_and_signals() {
        let hub = EventHub::new();
        let handshake = Handshake::new();
        let ctx = context(&hub, &handshake);
        let _occupied = hub.create(&ctx.channel, 1).unwrap();
        let mut task = DispatchTask::spawn(ctx);

        handshake.wait(WAIT, HandshakePhase::Startup).await.unwrap();
        assert!(matches!(
            task.join().await,
            Err(BridgeError::Ipc(IpcError::ChannelExists(_)))
        ));
        assert_eq!(task.state(), DispatchState::Stopped);
        assert_eq!(handshake.signals_posted(), 1);
    }
}
