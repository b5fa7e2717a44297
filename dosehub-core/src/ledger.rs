use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use crate::{Config, MedicationId};

/// Remembers which reminder buckets have already fired, so the same dose is
/// never announced twice for the same elapsed minute.
pub struct ReminderLedger {
    entries: HashMap<(MedicationId, i64), NaiveDateTime>,
    max_entries: usize,
    max_age: Duration,
}

impl ReminderLedger {
    pub fn new(config: &Config) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: config.ledger_max_entries,
            max_age: config.ledger_max_age(),
        }
    }

    /// Claims the bucket for the given medication and elapsed minute.
    /// Returns false if it was already claimed.
    pub fn try_claim(
        &mut self,
        medication_id: &MedicationId,
        elapsed: i64,
        now: NaiveDateTime,
    ) -> bool {
        let key = (medication_id.clone(), elapsed);

        if self.entries.contains_key(&key) {
            return false;
        }

        self.entries.insert(key, now);
        true
    }

    /// Drops entries older than the configured age once the ledger outgrows
    /// its bound. Returns how many entries were evicted.
    pub fn compact(&mut self, now: NaiveDateTime) -> usize {
        if self.entries.len() <= self.max_entries {
            return 0;
        }

        let before = self.entries.len();
        let max_age = self.max_age;

        self.entries.retain(|_, claimed_at| now - *claimed_at <= max_age);

        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
