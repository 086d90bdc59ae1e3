//! Periodic device polling feeding progress snapshots to a dashboard sink.

use crate::device::{DeviceApi, DeviceError};
use crate::duration::{DurationParse, parse_duration};
use crate::model::{DeviceData, TargetDuration};
use crate::progress::{ProgressSnapshot, compute_progress};
use crate::target_store::TargetStore;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type PendingPoll = Pin<Box<dyn Future<Output = (u64, Result<DeviceData, DeviceError>)>>>;
type PendingCommand = Pin<Box<dyn Future<Output = CommandResult>>>;

enum CommandResult {
    Edited(anyhow::Result<TargetDuration>),
    Logged(Result<String, DeviceError>),
}

/// Everything a successful poll hands to the renderer.
#[derive(Clone, Debug)]
pub struct DashboardUpdate {
    pub seq: u64,
    pub data: DeviceData,
    pub elapsed: DurationParse,
    pub target: TargetDuration,
    pub progress: ProgressSnapshot,
}

/// Rendering consumer for the loop.
pub trait DashboardSink {
    fn render(&mut self, update: &DashboardUpdate);
    /// Previously rendered state must stay as it was.
    fn render_failure(&mut self, error: &DeviceError);
    /// Called after a target edit with progress against the last known total.
    fn render_progress(&mut self, target: TargetDuration, progress: &ProgressSnapshot);
    fn notice(&mut self, message: &str);
}

/// Issues poll sequence numbers and rejects responses older than the last
/// one applied.
#[derive(Debug, Default)]
pub struct PollSequencer {
    issued: u64,
    last_applied: Option<u64>,
}

impl PollSequencer {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn accept(&mut self, seq: u64) -> bool {
        if self.last_applied.is_some_and(|last| seq <= last) {
            return false;
        }
        self.last_applied = Some(seq);
        true
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PollOutcome {
    Rendered,
    Failed,
    Stale,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DashboardCommand {
    SetTarget(i64),
    AddPreset(i64),
    LogNow,
    Refresh,
}

pub struct SyncLoop<S> {
    device: Arc<dyn DeviceApi>,
    store: TargetStore,
    sink: S,
    sequencer: PollSequencer,
    last_elapsed: Option<DurationParse>,
}

impl<S: DashboardSink> SyncLoop<S> {
    pub fn new(store: TargetStore, sink: S) -> Self {
        Self {
            device: store.device(),
            store,
            sink,
            sequencer: PollSequencer::default(),
            last_elapsed: None,
        }
    }

    pub fn store(&self) -> &TargetStore {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Target sync followed by one immediate poll.
    pub async fn startup(&mut self) -> PollOutcome {
        if let Err(err) = self.store.sync_from_device().await {
            error!(error = %err, "could not persist device target");
        }
        self.poll_once().await
    }

    pub async fn poll_once(&mut self) -> PollOutcome {
        let seq = self.sequencer.issue();
        let result = self.device.fetch_data().await;
        self.apply(seq, result)
    }

    /// Recomputes progress after a target edit, without a network call.
    pub fn refresh_progress(&mut self) -> ProgressSnapshot {
        let target = self.store.get_target();
        let studied = self
            .last_elapsed
            .map(DurationParse::seconds_or_zero)
            .unwrap_or(0);
        let progress = compute_progress(studied, target);
        self.sink.render_progress(target, &progress);
        progress
    }

    pub async fn handle_command(&mut self, command: DashboardCommand) {
        match command {
            DashboardCommand::SetTarget(secs) => {
                let result = self.store.set_target(secs).await;
                self.after_edit(result);
            }
            DashboardCommand::AddPreset(delta) => {
                let result = self.store.add_preset(delta).await;
                self.after_edit(result);
            }
            DashboardCommand::LogNow => {
                let result = self.device.log_now().await;
                if self.after_log(result) {
                    self.poll_once().await;
                }
            }
            DashboardCommand::Refresh => {
                self.poll_once().await;
            }
        }
    }

    /// Runs the startup sequence, then polls every `interval` until `cancel`
    /// fires. Ticks never wait for earlier polls or for device work started
    /// by commands; responses that arrive after a newer one has been applied
    /// are dropped. Commands run one at a time, in arrival order.
    pub async fn run(
        &mut self,
        interval: Duration,
        cancel: CancellationToken,
        mut commands: Option<UnboundedReceiver<DashboardCommand>>,
    ) {
        info!(?interval, "dashboard sync started");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("dashboard sync cancelled during startup");
                return;
            }
            _ = self.startup() => {}
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: FuturesUnordered<PendingPoll> = FuturesUnordered::new();
        let mut running: FuturesUnordered<PendingCommand> = FuturesUnordered::new();
        let mut queued: VecDeque<DashboardCommand> = VecDeque::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some((seq, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.apply(seq, result);
                }
                Some(result) = running.next(), if !running.is_empty() => {
                    if self.finish_command(result) {
                        in_flight.push(self.spawn_poll());
                    }
                    self.start_queued(&mut queued, &mut running, &mut in_flight);
                }
                _ = ticker.tick() => {
                    in_flight.push(self.spawn_poll());
                }
                command = next_command(&mut commands) => match command {
                    Some(command) => {
                        queued.push_back(command);
                        self.start_queued(&mut queued, &mut running, &mut in_flight);
                    }
                    None => commands = None,
                },
            }
        }
        if !in_flight.is_empty() || !running.is_empty() || !queued.is_empty() {
            debug!(
                polls = in_flight.len(),
                commands = running.len() + queued.len(),
                "dropping unfinished work"
            );
        }
        info!("dashboard sync stopped");
    }

    fn spawn_poll(&mut self) -> PendingPoll {
        let seq = self.sequencer.issue();
        let device = Arc::clone(&self.device);
        Box::pin(async move { (seq, device.fetch_data().await) })
    }

    /// Starts queued commands until one needs the device. Refreshes only
    /// add a poll, so they never hold up the queue.
    fn start_queued(
        &mut self,
        queued: &mut VecDeque<DashboardCommand>,
        running: &mut FuturesUnordered<PendingCommand>,
        in_flight: &mut FuturesUnordered<PendingPoll>,
    ) {
        while running.is_empty() {
            let Some(command) = queued.pop_front() else {
                break;
            };
            match command {
                DashboardCommand::SetTarget(secs) => {
                    let store = self.store.clone();
                    running.push(Box::pin(async move {
                        CommandResult::Edited(store.set_target(secs).await)
                    }));
                }
                DashboardCommand::AddPreset(delta) => {
                    let store = self.store.clone();
                    running.push(Box::pin(async move {
                        CommandResult::Edited(store.add_preset(delta).await)
                    }));
                }
                DashboardCommand::LogNow => {
                    let device = Arc::clone(&self.device);
                    running.push(Box::pin(async move {
                        CommandResult::Logged(device.log_now().await)
                    }));
                }
                DashboardCommand::Refresh => in_flight.push(self.spawn_poll()),
            }
        }
    }

    /// Applies a finished command; true when it calls for a fresh poll.
    fn finish_command(&mut self, result: CommandResult) -> bool {
        match result {
            CommandResult::Edited(result) => {
                self.after_edit(result);
                false
            }
            CommandResult::Logged(result) => self.after_log(result),
        }
    }

    fn apply(&mut self, seq: u64, result: Result<DeviceData, DeviceError>) -> PollOutcome {
        if !self.sequencer.accept(seq) {
            debug!(seq, last = ?self.sequencer.last_applied(), "discarding stale poll");
            return PollOutcome::Stale;
        }
        match result {
            Ok(data) => {
                let elapsed = parse_duration(&data.pcm_total);
                if elapsed.is_malformed() {
                    warn!(
                        seq,
                        pcm_total = %data.pcm_total,
                        "unparseable elapsed time; counting as zero"
                    );
                }
                let target = self.store.get_target();
                let progress = compute_progress(elapsed.seconds_or_zero(), target);
                self.last_elapsed = Some(elapsed);
                debug!(seq, percent = progress.percent_complete, "poll applied");
                self.sink.render(&DashboardUpdate {
                    seq,
                    data,
                    elapsed,
                    target,
                    progress,
                });
                PollOutcome::Rendered
            }
            Err(err) => {
                warn!(seq, kind = err.label(), error = %err, "poll failed");
                self.sink.render_failure(&err);
                PollOutcome::Failed
            }
        }
    }

    fn after_log(&mut self, result: Result<String, DeviceError>) -> bool {
        match result {
            Ok(reply) => {
                self.sink.notice(reply.trim());
                true
            }
            Err(err) => {
                warn!(kind = err.label(), error = %err, "log now failed");
                self.sink.notice(&format!("Failed: {err}"));
                false
            }
        }
    }

    fn after_edit(&mut self, result: anyhow::Result<TargetDuration>) {
        match result {
            Ok(target) => {
                info!(target_secs = target.as_secs(), "target updated");
                self.refresh_progress();
            }
            Err(err) => {
                error!(error = %err, "could not save target");
                self.sink.notice(&format!("Could not save target: {err}"));
            }
        }
    }
}

async fn next_command(
    commands: &mut Option<UnboundedReceiver<DashboardCommand>>,
) -> Option<DashboardCommand> {
    match commands {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetSource;
    use crate::state::TargetRecord;
    use crate::testing::{FakeDevice, Reply, sample_data};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        updates: Vec<DashboardUpdate>,
        failures: Vec<String>,
        edits: Vec<(TargetDuration, ProgressSnapshot)>,
        notices: Vec<String>,
    }

    impl DashboardSink for RecordingSink {
        fn render(&mut self, update: &DashboardUpdate) {
            self.updates.push(update.clone());
        }

        fn render_failure(&mut self, error: &DeviceError) {
            self.failures.push(error.label().to_string());
        }

        fn render_progress(&mut self, target: TargetDuration, progress: &ProgressSnapshot) {
            self.edits.push((target, *progress));
        }

        fn notice(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    fn sync_loop(device: &Arc<FakeDevice>, tmp: &TempDir) -> SyncLoop<RecordingSink> {
        let device: Arc<dyn DeviceApi> = device.clone();
        let store = TargetStore::new(device, TargetRecord::new(tmp.path().join("state.json")));
        SyncLoop::new(store, RecordingSink::default())
    }

    #[test]
    fn sequencer_rejects_older_responses() {
        let mut sequencer = PollSequencer::default();
        let first = sequencer.issue();
        let second = sequencer.issue();
        assert!(sequencer.accept(second));
        assert!(!sequencer.accept(first));
        assert!(!sequencer.accept(second));
        let third = sequencer.issue();
        assert!(sequencer.accept(third));
        assert_eq!(sequencer.last_applied(), Some(third));
    }

    #[tokio::test]
    async fn poll_renders_progress_against_local_target() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:30:00")));
        let mut sync = sync_loop(&device, &tmp);
        sync.store()
            .record()
            .write(TargetDuration::from_secs(3600), TargetSource::Local)
            .unwrap();

        assert_eq!(sync.poll_once().await, PollOutcome::Rendered);
        let update = &sync.sink().updates[0];
        assert_eq!(update.progress.percent_complete, 50);
        assert_eq!(update.progress.remaining_seconds, 1800);
        assert_eq!(update.elapsed, DurationParse::Parsed(1800));
    }

    #[tokio::test]
    async fn failed_poll_surfaces_indicator_only() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:10:00")));
        device.push_data(Duration::ZERO, Reply::Malformed);
        let mut sync = sync_loop(&device, &tmp);

        sync.poll_once().await;
        assert_eq!(sync.poll_once().await, PollOutcome::Failed);
        let sink = sync.sink();
        assert_eq!(sink.updates.len(), 1);
        assert_eq!(sink.failures, vec!["malformed_response"]);
    }

    #[tokio::test]
    async fn unparseable_total_is_flagged_but_counts_as_zero() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.push_data(Duration::ZERO, Reply::Value(sample_data("--:--")));
        let mut sync = sync_loop(&device, &tmp);
        sync.store()
            .record()
            .write(TargetDuration::from_secs(600), TargetSource::Local)
            .unwrap();

        sync.poll_once().await;
        let update = &sync.sink().updates[0];
        assert!(update.elapsed.is_malformed());
        assert_eq!(update.progress.studied_seconds, 0);
        assert_eq!(update.progress.percent_complete, 0);
    }

    #[tokio::test]
    async fn startup_syncs_target_before_first_poll() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.set_target_reply(Reply::Value(TargetDuration::from_secs(2000)));
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:16:40")));
        let mut sync = sync_loop(&device, &tmp);
        sync.store()
            .record()
            .write(TargetDuration::from_secs(1000), TargetSource::Local)
            .unwrap();

        sync.startup().await;
        assert_eq!(device.calls(), vec!["target", "data"]);
        let update = &sync.sink().updates[0];
        assert_eq!(update.target.as_secs(), 2000);
        assert_eq!(update.progress.percent_complete, 50);
    }

    #[tokio::test]
    async fn edits_recompute_against_last_total() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:15:00")));
        device.set_write_reply(Reply::Unavailable);
        let mut sync = sync_loop(&device, &tmp);

        sync.poll_once().await;
        sync.handle_command(DashboardCommand::SetTarget(1800)).await;
        sync.handle_command(DashboardCommand::AddPreset(1800)).await;

        let edits = &sync.sink().edits;
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].1.percent_complete, 50);
        assert_eq!(edits[1].0.as_secs(), 3600);
        assert_eq!(edits[1].1.percent_complete, 25);
        assert_eq!(sync.store().get_target().as_secs(), 3600);
    }

    #[tokio::test]
    async fn log_now_confirms_then_polls() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:00:00")));
        let mut sync = sync_loop(&device, &tmp);

        sync.handle_command(DashboardCommand::LogNow).await;
        assert_eq!(device.calls(), vec!["lognow", "data"]);
        assert_eq!(sync.sink().notices, vec!["Logged"]);
        assert_eq!(sync.sink().updates.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_until_cancelled() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        for _ in 0..3 {
            device.push_data(Duration::ZERO, Reply::Value(sample_data("00:01:00")));
        }
        let cancel = CancellationToken::new();
        device.cancel_after_polls(4, cancel.clone());
        let mut sync = sync_loop(&device, &tmp);

        sync.run(Duration::from_secs(5), cancel, None).await;

        let polls = device.calls().iter().filter(|call| **call == "data").count();
        assert_eq!(polls, 4);
        assert_eq!(device.calls()[0], "target");
        let sink = sync.into_sink();
        assert_eq!(sink.updates.len(), 3);
        assert!(sink.failures.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_older_than_applied_one_is_discarded() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        // startup poll, then a slow tick overtaken by the next tick
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:01:00")));
        device.push_data(Duration::from_secs(12), Reply::Value(sample_data("00:02:00")));
        device.push_data(Duration::from_secs(1), Reply::Value(sample_data("00:03:00")));
        device.push_data(Duration::from_secs(60), Reply::Hang);
        let cancel = CancellationToken::new();
        let mut sync = sync_loop(&device, &tmp);

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(20)).await;
            stopper.cancel();
        });
        sync.run(Duration::from_secs(5), cancel, None).await;

        let totals: Vec<String> = sync
            .sink()
            .updates
            .iter()
            .map(|update| update.data.pcm_total.clone())
            .collect();
        assert_eq!(totals, vec!["00:01:00", "00:03:00"]);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_target_write_does_not_stall_ticks_or_cancel() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.set_write_reply(Reply::Hang);
        for _ in 0..3 {
            device.push_data(Duration::ZERO, Reply::Value(sample_data("00:05:00")));
        }
        let cancel = CancellationToken::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(DashboardCommand::SetTarget(600)).unwrap();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            stopper.cancel();
        });
        let device_api: Arc<dyn DeviceApi> = device.clone();
        let store = TargetStore::new(device_api, TargetRecord::new(tmp.path().join("state.json")))
            .with_device_timeout(Duration::from_secs(30));
        let mut sync = SyncLoop::new(store, RecordingSink::default());

        let started = Instant::now();
        sync.run(Duration::from_secs(5), cancel, Some(rx)).await;

        assert!(started.elapsed() < Duration::from_secs(13));
        let calls = device.calls();
        assert_eq!(calls.iter().filter(|call| **call == "data").count(), 3);
        assert!(calls.contains(&"settarget"));
        assert_eq!(sync.sink().updates.len(), 3);
        assert!(sync.sink().edits.is_empty());
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_presets_apply_in_order() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:15:00")));
        let cancel = CancellationToken::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(DashboardCommand::AddPreset(900)).unwrap();
        tx.send(DashboardCommand::AddPreset(900)).unwrap();
        drop(tx);
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stopper.cancel();
        });
        let mut sync = sync_loop(&device, &tmp);

        sync.run(Duration::from_secs(5), cancel, Some(rx)).await;

        assert_eq!(sync.store().get_target().as_secs(), 1800);
        let edits = &sync.sink().edits;
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].1.percent_complete, 100);
        assert_eq!(edits[1].1.percent_complete, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_applied_inside_the_loop() {
        let tmp = TempDir::new().unwrap();
        let device = Arc::new(FakeDevice::default());
        device.push_data(Duration::ZERO, Reply::Value(sample_data("00:30:00")));
        let cancel = CancellationToken::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(DashboardCommand::AddPreset(3600)).unwrap();
        drop(tx);
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            stopper.cancel();
        });
        let mut sync = sync_loop(&device, &tmp);

        sync.run(Duration::from_secs(5), cancel, Some(rx)).await;

        assert_eq!(sync.store().get_target().as_secs(), 3600);
        let (_, progress) = sync.sink().edits[0];
        assert_eq!(progress.percent_complete, 50);
    }
}
