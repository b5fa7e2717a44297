use chrono::NaiveDate;

use dosehub_core::{DoseStatus, MedicationRecord};

/// A day's progress through a hub's medication list, derived from a snapshot.
#[derive(Debug, Clone)]
pub struct DaySummary {
    /// Doses still to be taken today, missed ones included
    pub upcoming: Vec<MedicationRecord>,
    /// Doses already taken today
    pub completed: Vec<MedicationRecord>,
    /// Whether any dose is currently missed
    pub any_missed: bool,
    /// Taken doses as a rounded percentage of the whole list
    pub completion_percent: u8,
}

impl DaySummary {
    pub fn of(medications: Vec<MedicationRecord>, today: NaiveDate) -> Self {
        let total = medications.len();

        let (completed, upcoming): (Vec<_>, Vec<_>) = medications
            .into_iter()
            .partition(|m| m.effective_status(today) == DoseStatus::Taken);

        let any_missed = upcoming
            .iter()
            .any(|m| m.effective_status(today) == DoseStatus::Missed);

        let completion_percent = if total == 0 {
            0
        } else {
            (completed.len() as f64 / total as f64 * 100.0).round() as u8
        };

        Self {
            upcoming,
            completed,
            any_missed,
            completion_percent,
        }
    }
}
