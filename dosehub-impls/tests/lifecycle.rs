use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;
use tokio::task::yield_now;
use tokio::time::{sleep, timeout};

use dosehub_core::{
    Config, DoseStatus, HubRecord, NewMedication, Notification, NotificationSink, ReminderStage,
    TrackerEvent,
};
use dosehub_family::{Family, NewAccount};
use dosehub_impls::{MemoryIdentity, MemoryStore};

type TestFamily = Family<MemoryStore, MemoryIdentity, RecordingSink>;

/// A sink that keeps every pushed notification around for the assertions.
#[derive(Clone, Default)]
struct RecordingSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn request_permission(&self) {}

    async fn push(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

fn family() -> (TestFamily, RecordingSink) {
    let sink = RecordingSink::default();

    let family = Family::new(
        Config::default(),
        MemoryStore::new(),
        MemoryIdentity::new(),
        sink.clone(),
    );

    (family, sink)
}

async fn seeded_hub(family: &TestFamily) -> HubRecord {
    let maria = family
        .auth
        .sign_up(NewAccount {
            name: "maria".to_string(),
            email: "maria@example.com".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .expect("account is created");

    family
        .hubs
        .create_hub("Evergreen House", &maria.id)
        .await
        .expect("hub is created")
}

fn new_medication(hub: &HubRecord, name: &str, reminder_time: NaiveTime) -> NewMedication {
    NewMedication {
        hub_id: hub.id.clone(),
        name: name.to_string(),
        dosage: "50 mcg".to_string(),
        reminder_time,
        image_url: None,
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).expect("date is valid")
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day().and_hms_opt(hour, minute, 0).expect("time is valid")
}

/// Lets spawned store writes run to completion.
async fn settle() {
    for _ in 0..4 {
        yield_now().await;
    }
}

#[tokio::test]
async fn test_a_forgotten_dose_escalates_and_recovers() {
    let (family, sink) = family();
    let hub = seeded_hub(&family).await;

    let events = family.tracker.events();
    let eight = NaiveTime::from_hms_opt(8, 0, 0).expect("time is valid");

    family
        .medications
        .add(new_medication(&hub, "Levothyroxine", eight))
        .await
        .expect("medication is added");

    let records = family.medications.list(&hub.id).await.expect("list loads");
    family.tracker.ingest_snapshot(&hub.id, records, day()).await;

    // Nobody takes the dose, so the reminder escalates to missed
    family.tracker.reconcile(at(8, 0)).await;
    family.tracker.reconcile(at(8, 10)).await;
    family.tracker.reconcile(at(8, 12)).await;
    settle().await;

    let records = family.medications.list(&hub.id).await.expect("list loads");

    assert_eq!(records[0].status, DoseStatus::Missed);

    // The next snapshot raises the hub-wide alert, exactly once
    family
        .tracker
        .ingest_snapshot(&hub.id, records.clone(), day())
        .await;
    family
        .tracker
        .ingest_snapshot(&hub.id, records, day())
        .await;

    let collected: Vec<_> = events.try_iter().collect();

    let stages: Vec<_> = collected
        .iter()
        .filter_map(|event| match event {
            TrackerEvent::ReminderDue { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();

    let lapses = collected
        .iter()
        .filter(|event| matches!(event, TrackerEvent::DoseLapsed { .. }))
        .count();

    assert_eq!(
        stages,
        vec![ReminderStage::Due, ReminderStage::FollowUp, ReminderStage::Missed]
    );
    assert_eq!(lapses, 1, "repeating the snapshot must not alert again");

    let alert = sink
        .notifications
        .lock()
        .iter()
        .find(|n| n.title == "Care Alert")
        .cloned()
        .expect("the hub-wide alert is pushed");

    assert_eq!(
        alert.body,
        "A dose of Levothyroxine (50 mcg) was missed. Hub members notified."
    );

    // Taking the dose repairs the day
    let medication_id = family.tracker.medications()[0].id.clone();

    family
        .tracker
        .mark_taken(&medication_id, day())
        .await
        .expect("dose is marked taken");

    let records = family.medications.list(&hub.id).await.expect("list loads");

    assert_eq!(records[0].status, DoseStatus::Taken);
    assert_eq!(records[0].last_taken_date, Some(day()));
}

#[tokio::test]
async fn test_yesterdays_taken_dose_is_due_again() {
    let (family, _) = family();
    let hub = seeded_hub(&family).await;

    let eight = NaiveTime::from_hms_opt(8, 0, 0).expect("time is valid");

    let medication = family
        .medications
        .add(new_medication(&hub, "Levothyroxine", eight))
        .await
        .expect("medication is added");

    family
        .tracker
        .mark_taken(&medication.id, day())
        .await
        .expect("dose is marked taken");

    // A day passes and the stale taken state is corrected in the store
    let tomorrow = day().succ_opt().expect("date is valid");
    let records = family.medications.list(&hub.id).await.expect("list loads");

    family
        .tracker
        .ingest_snapshot(&hub.id, records, tomorrow)
        .await;
    settle().await;

    let records = family.medications.list(&hub.id).await.expect("list loads");

    assert_eq!(records[0].status, DoseStatus::Pending);
    assert_eq!(records[0].last_taken_date, None);
}

#[tokio::test]
async fn test_marking_taken_twice_changes_nothing() {
    let (family, _) = family();
    let hub = seeded_hub(&family).await;

    let eight = NaiveTime::from_hms_opt(8, 0, 0).expect("time is valid");

    let medication = family
        .medications
        .add(new_medication(&hub, "Levothyroxine", eight))
        .await
        .expect("medication is added");

    let first = family
        .tracker
        .mark_taken(&medication.id, day())
        .await
        .expect("dose is marked taken");

    let second = family
        .tracker
        .mark_taken(&medication.id, day())
        .await
        .expect("marking again is harmless");

    assert_eq!(first.status, DoseStatus::Taken);
    assert_eq!(second.status, DoseStatus::Taken);
    assert_eq!(second.last_taken_date, Some(day()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watching_a_hub_follows_store_changes() {
    let (family, _) = family();
    let hub = seeded_hub(&family).await;

    let events = family.tracker.events();
    let _watch = family.tracker.watch(hub.id.clone());

    let six = NaiveTime::from_hms_opt(6, 0, 0).expect("time is valid");

    family
        .medications
        .add(new_medication(&hub, "Aspirin", six))
        .await
        .expect("medication is added");

    let snapshot = timeout(Duration::from_secs(5), async {
        loop {
            for event in events.try_iter() {
                if let TrackerEvent::SnapshotUpdated { medications, .. } = event {
                    if !medications.is_empty() {
                        return medications;
                    }
                }
            }

            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("the watcher picks up the new medication in time");

    assert_eq!(snapshot[0].name, "Aspirin");
}
