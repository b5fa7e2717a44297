use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

use dosehub_core::{
    DoseStatus, HubId, HubRecord, MedicationId, MedicationRecord, MedicationStream, NewHub,
    NewMedication, NewUser, Store, StoreError, StoreResult, UpdatedMedication, UserId, UserRecord,
};

use crate::{AuthError, IdentityProvider};

/// A small Vec-backed store for exercising the managers.
#[derive(Default)]
pub struct ScriptedStore {
    users: Mutex<Vec<UserRecord>>,
    hubs: Mutex<Vec<HubRecord>>,
    medications: Mutex<Vec<MedicationRecord>>,
    next_id: AtomicUsize,
    forced_hub_conflicts: AtomicUsize,
}

impl ScriptedStore {
    /// Makes the next `count` hub creations fail with a join code conflict.
    pub fn force_hub_conflicts(&self, count: usize) {
        self.forced_hub_conflicts.store(count, Ordering::SeqCst);
    }

    pub fn hubs(&self) -> Vec<HubRecord> {
        self.hubs.lock().clone()
    }

    pub async fn seeded_user(&self, name: &str) -> UserRecord {
        self.create_user(NewUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
        })
        .await
        .expect("user is created")
    }

    fn mint(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl Store for ScriptedStore {
    async fn user_by_id(&self, user_id: &UserId) -> dosehub_core::Result<UserRecord> {
        self.users
            .lock()
            .iter()
            .find(|u| &u.id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                resource: "user",
                identifier: user_id.to_string(),
            })
    }

    async fn user_by_email(&self, email: &str) -> dosehub_core::Result<UserRecord> {
        self.users
            .lock()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound {
                resource: "user",
                identifier: email.to_string(),
            })
    }

    async fn create_user(&self, new_user: NewUser) -> dosehub_core::Result<UserRecord> {
        self.user_by_email(&new_user.email)
            .await
            .conflict_or_ok("user", "email", &new_user.email)?;

        let record = UserRecord {
            id: UserId::new(self.mint("user")),
            name: new_user.name,
            email: new_user.email,
            hub_id: None,
        };

        self.users.lock().push(record.clone());
        Ok(record)
    }

    async fn set_user_hub(
        &self,
        user_id: &UserId,
        hub_id: &HubId,
    ) -> dosehub_core::Result<UserRecord> {
        let mut users = self.users.lock();

        let user = users
            .iter_mut()
            .find(|u| &u.id == user_id)
            .ok_or(StoreError::NotFound {
                resource: "user",
                identifier: user_id.to_string(),
            })?;

        user.hub_id = Some(hub_id.clone());
        Ok(user.clone())
    }

    async fn hub_by_id(&self, hub_id: &HubId) -> dosehub_core::Result<HubRecord> {
        self.hubs
            .lock()
            .iter()
            .find(|h| &h.id == hub_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                resource: "hub",
                identifier: hub_id.to_string(),
            })
    }

    async fn hub_by_join_code(&self, join_code: &str) -> dosehub_core::Result<HubRecord> {
        self.hubs
            .lock()
            .iter()
            .find(|h| h.join_code == join_code)
            .cloned()
            .ok_or(StoreError::NotFound {
                resource: "hub",
                identifier: join_code.to_string(),
            })
    }

    async fn create_hub(&self, new_hub: NewHub) -> dosehub_core::Result<HubRecord> {
        let forced = self.forced_hub_conflicts.load(Ordering::SeqCst);

        if forced > 0 {
            self.forced_hub_conflicts.store(forced - 1, Ordering::SeqCst);

            return Err(StoreError::Conflict {
                resource: "hub",
                field: "joinCode",
                value: new_hub.join_code,
            });
        }

        self.hub_by_join_code(&new_hub.join_code)
            .await
            .conflict_or_ok("hub", "joinCode", &new_hub.join_code)?;

        let record = HubRecord {
            id: HubId::new(self.mint("hub")),
            name: new_hub.name,
            join_code: new_hub.join_code,
            members: vec![new_hub.admin.clone()],
            admin: new_hub.admin,
            created_at: Utc::now(),
        };

        self.hubs.lock().push(record.clone());
        Ok(record)
    }

    async fn add_hub_member(
        &self,
        hub_id: &HubId,
        user_id: &UserId,
    ) -> dosehub_core::Result<HubRecord> {
        let mut hubs = self.hubs.lock();

        let hub = hubs
            .iter_mut()
            .find(|h| &h.id == hub_id)
            .ok_or(StoreError::NotFound {
                resource: "hub",
                identifier: hub_id.to_string(),
            })?;

        if !hub.members.contains(user_id) {
            hub.members.push(user_id.clone());
        }

        Ok(hub.clone())
    }

    async fn medications_by_hub(
        &self,
        hub_id: &HubId,
    ) -> dosehub_core::Result<Vec<MedicationRecord>> {
        Ok(self
            .medications
            .lock()
            .iter()
            .filter(|m| &m.hub_id == hub_id)
            .cloned()
            .collect())
    }

    async fn create_medication(
        &self,
        new_medication: NewMedication,
    ) -> dosehub_core::Result<MedicationRecord> {
        let record = MedicationRecord {
            id: MedicationId::new(self.mint("med")),
            hub_id: new_medication.hub_id,
            name: new_medication.name,
            dosage: new_medication.dosage,
            reminder_time: new_medication.reminder_time,
            status: DoseStatus::Pending,
            last_taken_date: None,
            image_url: new_medication.image_url,
            created_at: Utc::now(),
        };

        self.medications.lock().push(record.clone());
        Ok(record)
    }

    async fn update_medication(
        &self,
        update: UpdatedMedication,
    ) -> dosehub_core::Result<MedicationRecord> {
        let mut medications = self.medications.lock();

        let record = medications
            .iter_mut()
            .find(|m| m.id == update.id)
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

        Ok(record.clone())
    }

    async fn set_dose_state(
        &self,
        medication_id: &MedicationId,
        status: DoseStatus,
        taken_on: Option<NaiveDate>,
    ) -> dosehub_core::Result<MedicationRecord> {
        let mut medications = self.medications.lock();

        let record = medications
            .iter_mut()
            .find(|m| &m.id == medication_id)
            .ok_or(StoreError::NotFound {
                resource: "medication",
                identifier: medication_id.to_string(),
            })?;

        record.status = status;
        record.last_taken_date = taken_on;

        Ok(record.clone())
    }

    async fn delete_medication(&self, medication_id: &MedicationId) -> dosehub_core::Result<()> {
        self.medications.lock().retain(|m| &m.id != medication_id);
        Ok(())
    }

    fn watch_medications(&self, _hub_id: &HubId) -> MedicationStream {
        Box::pin(futures_util::stream::pending())
    }
}

/// An identity provider that remembers registrations and can be told to
/// reject the next request.
#[derive(Default)]
pub struct ScriptedProvider {
    credentials: Mutex<Vec<(String, String)>>,
    rejection: Mutex<Option<String>>,
}

impl ScriptedProvider {
    pub fn reject_with(&self, message: &str) {
        *self.rejection.lock() = Some(message.to_string());
    }

    pub fn registered(&self) -> Vec<String> {
        self.credentials
            .lock()
            .iter()
            .map(|(email, _)| email.clone())
            .collect()
    }

    fn check_rejection(&self) -> Result<(), AuthError> {
        match self.rejection.lock().take() {
            Some(message) => Err(AuthError::Provider(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.check_rejection()?;

        let mut credentials = self.credentials.lock();

        if credentials.iter().any(|(e, _)| e == email) {
            return Err(AuthError::EmailTaken);
        }

        credentials.push((email.to_string(), password.to_string()));
        Ok(())
    }

    async fn verify(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.check_rejection()?;

        self.credentials
            .lock()
            .iter()
            .find(|(e, p)| e == email && p == password)
            .map(|_| ())
            .ok_or(AuthError::InvalidCredentials)
    }
}
