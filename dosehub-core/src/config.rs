use std::time::Duration;

/// The configuration of the dose tracker
#[derive(Debug, Clone)]
pub struct Config {
    /// How often schedules are checked against the clock, in seconds
    pub tick_rate_in_seconds: u64,
    /// How many minutes after the scheduled time the follow-up reminder fires
    pub follow_up_after_minutes: i64,
    /// How many minutes after the scheduled time a pending dose counts as missed
    pub missed_after_minutes: i64,
    /// How many entries the reminder ledger holds before it is compacted
    pub ledger_max_entries: usize,
    /// How many hours a reminder ledger entry stays relevant
    pub ledger_max_age_in_hours: i64,
}

impl Config {
    /// How often the reconciler runs
    pub fn tick_rate(&self) -> Duration {
        Duration::from_secs(self.tick_rate_in_seconds)
    }

    /// How old a ledger entry may get before compaction drops it
    pub fn ledger_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ledger_max_age_in_hours)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Rules are minute-granular, so anything at or under a minute works
            tick_rate_in_seconds: 30,
            follow_up_after_minutes: 10,
            missed_after_minutes: 12,
            // Roughly a day of reminders for a family-sized medication list
            ledger_max_entries: 100,
            ledger_max_age_in_hours: 24,
        }
    }
}
