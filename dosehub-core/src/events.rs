use crossbeam::channel::{Receiver, Sender};

use crate::{HubId, MedicationId, MedicationRecord};

pub type EventSender = Sender<TrackerEvent>;
pub type EventReceiver = Receiver<TrackerEvent>;

/// Describes the events that can be emitted by the tracker.
#[derive(Debug)]
pub enum TrackerEvent {
    /// A new medication snapshot was applied
    SnapshotUpdated {
        hub_id: HubId,
        /// The medications, sorted by reminder time
        medications: Vec<MedicationRecord>,
    },
    /// A reminder for a dose was pushed to the notification sink
    ReminderDue {
        medication_id: MedicationId,
        stage: ReminderStage,
    },
    /// A dose entered the missed set for the first time
    DoseLapsed {
        hub_id: HubId,
        medication_id: MedicationId,
    },
}

/// The escalation step a reminder is at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStage {
    /// The scheduled minute itself
    Due,
    /// The nudge a few minutes after the scheduled minute
    FollowUp,
    /// The dose was just marked missed
    Missed,
}
