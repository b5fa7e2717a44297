use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use crossbeam::channel::unbounded;
use parking_lot::Mutex;

mod config;
mod evaluator;
mod events;
mod ledger;
mod notify;
mod schedule;
mod watch;

pub mod store;

pub use config::*;
pub use evaluator::Evaluator;
pub use events::*;
pub use ledger::*;
pub use notify::*;
pub use schedule::*;
pub use store::*;
pub use watch::*;

use evaluator::WatchState;

/// The dosehub tracker, evaluating dose lifecycles against the clock.
pub struct Tracker<S, N> {
    context: TrackerContext<S, N>,
    evaluator: Evaluator<S, N>,

    event_receiver: EventReceiver,
}

/// A type passed to the components of the tracker, to access state, emit
/// events, and reach the store and notification sink.
pub struct TrackerContext<S, N> {
    pub config: Config,

    pub store: Arc<S>,
    pub sink: Arc<N>,

    event_sender: EventSender,
    pub(crate) state: Arc<Mutex<WatchState>>,
}

impl<S, N> Tracker<S, N>
where
    S: Store,
    N: NotificationSink,
{
    pub fn new(config: Config, store: Arc<S>, sink: Arc<N>) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let context = TrackerContext {
            state: Arc::new(Mutex::new(WatchState::new(&config))),
            config,
            store,
            sink,
            event_sender,
        };

        Self {
            evaluator: Evaluator::new(&context),
            context,
            event_receiver,
        }
    }

    /// Asks the sink for permission to notify. Called once at startup.
    pub async fn request_permission(&self) {
        self.context.sink.request_permission().await
    }

    /// Starts following a hub's medication list, feeding snapshots and clock
    /// ticks to the evaluator until the returned handle is dropped.
    ///
    /// Only one hub should be watched at a time. Starting a new watch resets
    /// the tracked state.
    pub fn watch(&self, hub_id: HubId) -> WatchHandle {
        *self.context.state.lock() = WatchState::new(&self.context.config);

        WatchHandle::new(&self.context, hub_id)
    }

    /// Applies a snapshot of a hub's medications.
    pub async fn ingest_snapshot(
        &self,
        hub_id: &HubId,
        records: Vec<MedicationRecord>,
        today: NaiveDate,
    ) {
        self.evaluator.ingest_snapshot(hub_id, records, today).await
    }

    /// Evaluates every known medication against the given clock reading.
    pub async fn reconcile(&self, now: NaiveDateTime) {
        self.evaluator.reconcile(now).await
    }

    /// Marks a dose as taken today.
    pub async fn mark_taken(
        &self,
        medication_id: &MedicationId,
        today: NaiveDate,
    ) -> store::Result<MedicationRecord> {
        self.evaluator.mark_taken(medication_id, today).await
    }

    /// Reverts a dose to pending.
    pub async fn mark_pending(
        &self,
        medication_id: &MedicationId,
    ) -> store::Result<MedicationRecord> {
        self.evaluator.mark_pending(medication_id).await
    }

    /// The latest snapshot, sorted by reminder time.
    pub fn medications(&self) -> Vec<MedicationRecord> {
        self.evaluator.medications()
    }

    /// Blocks until the tracker emits an event.
    pub fn wait_for_event(&self) -> TrackerEvent {
        self.event_receiver
            .recv()
            .expect("event is received without error")
    }

    /// A receiver for consuming tracker events elsewhere.
    pub fn events(&self) -> EventReceiver {
        self.event_receiver.clone()
    }
}

impl<S, N> TrackerContext<S, N>
where
    S: Store,
    N: NotificationSink,
{
    pub fn emit(&self, event: TrackerEvent) {
        self.event_sender.send(event).expect("event is sent");
    }
}

impl<S, N> Clone for TrackerContext<S, N>
where
    S: Store,
    N: NotificationSink,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            store: self.store.clone(),
            sink: self.sink.clone(),
            event_sender: self.event_sender.clone(),
            state: self.state.clone(),
        }
    }
}
