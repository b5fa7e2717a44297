use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use futures_util::stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use dosehub_core::{
    DoseStatus, HubId, HubRecord, MedicationId, MedicationRecord, MedicationStream, NewHub,
    NewMedication, NewUser, Result, Store, StoreError, StoreResult, UpdatedMedication, UserId,
    UserRecord,
};

use crate::util::random_string;

const ID_LENGTH: usize = 20;

/// A store that keeps every record in memory. Contents are lost on exit,
/// which is fine for demos and tests.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, UserRecord>,
    hubs: DashMap<HubId, HubRecord>,
    medications: DashMap<MedicationId, MedicationRecord>,

    /// The sending halves of medication watch streams
    watchers: Mutex<Vec<HubWatcher>>,
}

struct HubWatcher {
    hub_id: HubId,
    sender: mpsc::UnboundedSender<Vec<MedicationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn medications_in(&self, hub_id: &HubId) -> Vec<MedicationRecord> {
        self.medications
            .iter()
            .filter(|m| &m.hub_id == hub_id)
            .map(|m| m.clone())
            .collect()
    }

    /// Delivers a fresh snapshot to every watcher of the hub, dropping
    /// watchers whose stream has gone away.
    fn notify_hub(&self, hub_id: &HubId) {
        let snapshot = self.medications_in(hub_id);

        self.watchers.lock().retain(|watcher| {
            if &watcher.hub_id != hub_id {
                return true;
            }

            watcher.sender.send(snapshot.clone()).is_ok()
        });
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user_by_id(&self, user_id: &UserId) -> Result<UserRecord> {
        self.users
            .get(user_id)
            .map(|u| u.clone())
            .ok_or(StoreError::NotFound {
                resource: "user",
                identifier: user_id.to_string(),
            })
    }

    async fn user_by_email(&self, email: &str) -> Result<UserRecord> {
        self.users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.clone())
            .ok_or(StoreError::NotFound {
                resource: "user",
                identifier: email.to_string(),
            })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord> {
        self.user_by_email(&new_user.email)
            .await
            .conflict_or_ok("user", "email", &new_user.email)?;

        let record = UserRecord {
            id: UserId::new(random_string(ID_LENGTH)),
            name: new_user.name,
            email: new_user.email,
            hub_id: None,
        };

        self.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn set_user_hub(&self, user_id: &UserId, hub_id: &HubId) -> Result<UserRecord> {
        let mut user = self.users.get_mut(user_id).ok_or(StoreError::NotFound {
            resource: "user",
            identifier: user_id.to_string(),
        })?;

        user.hub_id = Some(hub_id.clone());
        Ok(user.clone())
    }

    async fn hub_by_id(&self, hub_id: &HubId) -> Result<HubRecord> {
        self.hubs
            .get(hub_id)
            .map(|h| h.clone())
            .ok_or(StoreError::NotFound {
                resource: "hub",
                identifier: hub_id.to_string(),
            })
    }

    async fn hub_by_join_code(&self, join_code: &str) -> Result<HubRecord> {
        self.hubs
            .iter()
            .find(|h| h.join_code == join_code)
            .map(|h| h.clone())
            .ok_or(StoreError::NotFound {
                resource: "hub",
                identifier: join_code.to_string(),
            })
    }

    async fn create_hub(&self, new_hub: NewHub) -> Result<HubRecord> {
        self.hub_by_join_code(&new_hub.join_code)
            .await
            .conflict_or_ok("hub", "joinCode", &new_hub.join_code)?;

        let record = HubRecord {
            id: HubId::new(random_string(ID_LENGTH)),
            name: new_hub.name,
            join_code: new_hub.join_code,
            members: vec![new_hub.admin.clone()],
            admin: new_hub.admin,
            created_at: Utc::now(),
        };

        self.hubs.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn add_hub_member(&self, hub_id: &HubId, user_id: &UserId) -> Result<HubRecord> {
        let mut hub = self.hubs.get_mut(hub_id).ok_or(StoreError::NotFound {
            resource: "hub",
            identifier: hub_id.to_string(),
        })?;

        if !hub.members.contains(user_id) {
            hub.members.push(user_id.clone());
        }

        Ok(hub.clone())
    }

    async fn medications_by_hub(&self, hub_id: &HubId) -> Result<Vec<MedicationRecord>> {
        Ok(self.medications_in(hub_id))
    }

    async fn create_medication(&self, new_medication: NewMedication) -> Result<MedicationRecord> {
        let record = MedicationRecord {
            id: MedicationId::new(random_string(ID_LENGTH)),
            hub_id: new_medication.hub_id,
            name: new_medication.name,
            dosage: new_medication.dosage,
            reminder_time: new_medication.reminder_time,
            status: DoseStatus::Pending,
            last_taken_date: None,
            image_url: new_medication.image_url,
            created_at: Utc::now(),
        };

        self.medications.insert(record.id.clone(), record.clone());
        self.notify_hub(&record.hub_id);

        Ok(record)
    }

    async fn update_medication(&self, update: UpdatedMedication) -> Result<MedicationRecord> {
        // The guard is released before the watchers query the map again
        let record = {
            let mut record =
                self.medications
                    .get_mut(&update.id)
                    .ok_or(StoreError::NotFound {
                        resource: "medication",
                        identifier: update.id.to_string(),
                    })?;

            if let Some(name) = update.name {
                record.name = name;
            }
            if let Some(dosage) = update.dosage {
                record.dosage = dosage;
            }
            if let Some(reminder_time) = update.reminder_time {
                record.reminder_time = reminder_time;
            }
            if let Some(image_url) = update.image_url {
                record.image_url = Some(image_url);
            }

            record.clone()
        };

        self.notify_hub(&record.hub_id);

        Ok(record)
    }

    async fn set_dose_state(
        &self,
        medication_id: &MedicationId,
        status: DoseStatus,
        taken_on: Option<NaiveDate>,
    ) -> Result<MedicationRecord> {
        let (record, changed) = {
            let mut record =
                self.medications
                    .get_mut(medication_id)
                    .ok_or(StoreError::NotFound {
                        resource: "medication",
                        identifier: medication_id.to_string(),
                    })?;

            let changed = record.status != status || record.last_taken_date != taken_on;

            record.status = status;
            record.last_taken_date = taken_on;

            (record.clone(), changed)
        };

        // A write that changes nothing must not wake the watchers
        if changed {
            self.notify_hub(&record.hub_id);
        }

        Ok(record)
    }

    async fn delete_medication(&self, medication_id: &MedicationId) -> Result<()> {
        if let Some((_, record)) = self.medications.remove(medication_id) {
            self.notify_hub(&record.hub_id);
        }

        Ok(())
    }

    fn watch_medications(&self, hub_id: &HubId) -> MedicationStream {
        let (sender, receiver) = mpsc::unbounded_channel();

        {
            // Registration holds the same lock notify_hub takes, so a
            // concurrent write cannot land between the initial snapshot
            // and the push, where it would reach neither
            let mut watchers = self.watchers.lock();

            // The current list is delivered right away
            sender.send(self.medications_in(hub_id)).ok();

            watchers.push(HubWatcher {
                hub_id: hub_id.clone(),
                sender,
            });
        }

        Box::pin(stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|snapshot| (snapshot, receiver))
        }))
    }
}
