use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error};

use crate::{
    elapsed_minutes, Config, DoseStatus, HubId, MedicationId, MedicationRecord, Notification,
    NotificationSink, ReminderLedger, ReminderStage, Store, TrackerContext, TrackerEvent,
};

/// The transient view the evaluator works against. Nothing in here is
/// persisted, so it resets when the process or the watched hub changes.
pub(crate) struct WatchState {
    pub medications: Vec<MedicationRecord>,
    pub missed: HashSet<MedicationId>,
    pub ledger: ReminderLedger,
}

impl WatchState {
    pub fn new(config: &Config) -> Self {
        Self {
            medications: Vec::new(),
            missed: HashSet::new(),
            ledger: ReminderLedger::new(config),
        }
    }
}

/// Applies store snapshots and the clock to the dose lifecycle.
pub struct Evaluator<S, N> {
    context: TrackerContext<S, N>,
}

impl<S, N> Evaluator<S, N>
where
    S: Store,
    N: NotificationSink,
{
    pub fn new(context: &TrackerContext<S, N>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Applies a fresh snapshot of a hub's medications.
    ///
    /// Leftover taken statuses from a previous day are normalized to pending,
    /// with one corrective write per affected record. Doses that newly show up
    /// as missed produce a hub-wide care alert.
    pub async fn ingest_snapshot(
        &self,
        hub_id: &HubId,
        mut records: Vec<MedicationRecord>,
        today: NaiveDate,
    ) {
        let (corrections, lapsed, snapshot) = {
            let mut state = self.context.state.lock();

            // A taken status only holds for the day it was set on
            let corrections: Vec<MedicationId> = records
                .iter_mut()
                .filter(|record| record.has_stale_taken_status(today))
                .map(|record| {
                    record.status = DoseStatus::Pending;
                    record.last_taken_date = None;

                    record.id.clone()
                })
                .collect();

            records.sort_by(|a, b| a.reminder_time.cmp(&b.reminder_time));

            let missed: HashSet<MedicationId> = records
                .iter()
                .filter(|record| record.status == DoseStatus::Missed)
                .map(|record| record.id.clone())
                .collect();

            let lapsed: Vec<MedicationRecord> = records
                .iter()
                .filter(|record| {
                    missed.contains(&record.id) && !state.missed.contains(&record.id)
                })
                .cloned()
                .collect();

            state.missed = missed;
            state.medications = records.clone();

            (corrections, lapsed, records)
        };

        for medication_id in corrections {
            self.write_dose_state(medication_id, DoseStatus::Pending, None);
        }

        self.context.emit(TrackerEvent::SnapshotUpdated {
            hub_id: hub_id.clone(),
            medications: snapshot,
        });

        for record in lapsed {
            self.context.sink.push(Notification::care_alert(&record)).await;

            self.context.emit(TrackerEvent::DoseLapsed {
                hub_id: hub_id.clone(),
                medication_id: record.id,
            });
        }
    }

    /// Walks the snapshot and fires whatever reminders the clock has reached.
    ///
    /// Every rule is gated by the reminder ledger, so each (medication,
    /// elapsed minute) bucket fires at most once per process lifetime.
    pub async fn reconcile(&self, now: NaiveDateTime) {
        let today = now.date();
        let config = &self.context.config;

        let mut notifications = Vec::new();
        let mut stages = Vec::new();
        let mut lapses = Vec::new();

        {
            let mut state = self.context.state.lock();

            let evicted = state.ledger.compact(now);

            if evicted > 0 {
                debug!("Evicted {evicted} settled reminder entries");
            }

            let WatchState {
                medications,
                ledger,
                ..
            } = &mut *state;

            for record in medications.iter() {
                if record.effective_status(today) == DoseStatus::Taken {
                    continue;
                }

                let elapsed = elapsed_minutes(record.reminder_time, now);

                if elapsed < 0 {
                    continue;
                }

                if elapsed == 0 && ledger.try_claim(&record.id, elapsed, now) {
                    notifications.push(Notification::due(record));
                    stages.push((record.id.clone(), ReminderStage::Due));
                }

                if elapsed == config.follow_up_after_minutes
                    && ledger.try_claim(&record.id, elapsed, now)
                {
                    notifications.push(Notification::follow_up(record));
                    stages.push((record.id.clone(), ReminderStage::FollowUp));
                }

                if elapsed >= config.missed_after_minutes
                    && record.effective_status(today) == DoseStatus::Pending
                    && ledger.try_claim(&record.id, elapsed, now)
                {
                    notifications.push(Notification::missed(record));
                    stages.push((record.id.clone(), ReminderStage::Missed));
                    lapses.push(record.id.clone());
                }
            }
        }

        for notification in notifications {
            self.context.sink.push(notification).await;
        }

        for (medication_id, stage) in stages {
            self.context.emit(TrackerEvent::ReminderDue {
                medication_id,
                stage,
            });
        }

        for medication_id in lapses {
            self.write_dose_state(medication_id, DoseStatus::Missed, None);
        }
    }

    /// Marks a dose as taken on the given date.
    pub async fn mark_taken(
        &self,
        medication_id: &MedicationId,
        today: NaiveDate,
    ) -> crate::store::Result<MedicationRecord> {
        self.context
            .store
            .set_dose_state(medication_id, DoseStatus::Taken, Some(today))
            .await
    }

    /// Reverts a dose to pending, clearing its taken date.
    pub async fn mark_pending(
        &self,
        medication_id: &MedicationId,
    ) -> crate::store::Result<MedicationRecord> {
        self.context
            .store
            .set_dose_state(medication_id, DoseStatus::Pending, None)
            .await
    }

    /// The latest snapshot, sorted by reminder time.
    pub fn medications(&self) -> Vec<MedicationRecord> {
        self.context.state.lock().medications.clone()
    }

    /// Issues a dose state write without waiting for it, so a slow or failing
    /// store never stalls the tick that caused the write.
    fn write_dose_state(
        &self,
        medication_id: MedicationId,
        status: DoseStatus,
        taken_on: Option<NaiveDate>,
    ) {
        let store = self.context.store.clone();

        tokio::spawn(async move {
            let result = store.set_dose_state(&medication_id, status, taken_on).await;

            if let Err(error) = result {
                error!("Failed to write {status:?} for medication {medication_id}: {error}");
            }
        });
    }
}
