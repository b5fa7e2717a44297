use async_trait::async_trait;

use crate::{display_time, MedicationRecord};

/// A transient alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    /// The reminder for the scheduled minute itself.
    pub fn due(medication: &MedicationRecord) -> Self {
        Self {
            title: format!("Time for {}", medication.name),
            body: format!("Please take your {} now.", medication.dosage),
        }
    }

    /// The nudge when a dose is still not taken a few minutes in.
    pub fn follow_up(medication: &MedicationRecord) -> Self {
        Self {
            title: format!("Don't forget {}", medication.name),
            body: format!("Your {} dose is still waiting.", medication.dosage),
        }
    }

    /// Announces that a dose was just marked missed.
    pub fn missed(medication: &MedicationRecord) -> Self {
        Self {
            title: format!("{} marked as missed", medication.name),
            body: format!(
                "The {} dose was not confirmed in time.",
                display_time(medication.reminder_time)
            ),
        }
    }

    /// The hub-wide alert for a dose that newly shows up as missed, naming
    /// the medication and its dosage.
    pub fn care_alert(medication: &MedicationRecord) -> Self {
        Self {
            title: "Care Alert".to_string(),
            body: format!(
                "A dose of {} ({}) was missed. Hub members notified.",
                medication.name, medication.dosage
            ),
        }
    }
}

/// Represents a type that can surface notifications to the user.
#[async_trait]
pub trait NotificationSink
where
    Self: 'static + Sync + Send,
{
    /// Asks for permission to show notifications. Called once before any push.
    /// A denial is remembered by the sink and honored silently.
    async fn request_permission(&self);

    /// Displays the notification. Delivery is best effort and never fails.
    async fn push(&self, notification: Notification);
}
