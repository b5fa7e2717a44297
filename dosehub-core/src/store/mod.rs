use std::pin::Pin;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures_util::Stream;
use thiserror::Error;

mod data;
pub use data::*;

pub type Result<T> = std::result::Result<T, StoreError>;

/// A stream of medication snapshots for a watched hub.
pub type MedicationStream = Pin<Box<dyn Stream<Item = Vec<MedicationRecord>> + Send>>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An unknown or internal error happened with the store
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A record already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The record kind in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A record in the store doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
}

/// Helper trait to reduce boilerplate
pub trait StoreResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> StoreResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(StoreError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                StoreError::NotFound { .. } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can persist dosehub records and deliver changes to them
#[async_trait]
pub trait Store
where
    Self: 'static + Sync + Send,
{
    async fn user_by_id(&self, user_id: &UserId) -> Result<UserRecord>;
    async fn user_by_email(&self, email: &str) -> Result<UserRecord>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord>;
    async fn set_user_hub(&self, user_id: &UserId, hub_id: &HubId) -> Result<UserRecord>;

    async fn hub_by_id(&self, hub_id: &HubId) -> Result<HubRecord>;
    async fn hub_by_join_code(&self, join_code: &str) -> Result<HubRecord>;
    async fn create_hub(&self, new_hub: NewHub) -> Result<HubRecord>;
    async fn add_hub_member(&self, hub_id: &HubId, user_id: &UserId) -> Result<HubRecord>;

    async fn medications_by_hub(&self, hub_id: &HubId) -> Result<Vec<MedicationRecord>>;
    async fn create_medication(&self, new_medication: NewMedication) -> Result<MedicationRecord>;
    async fn update_medication(&self, update: UpdatedMedication) -> Result<MedicationRecord>;
    async fn set_dose_state(
        &self,
        medication_id: &MedicationId,
        status: DoseStatus,
        taken_on: Option<NaiveDate>,
    ) -> Result<MedicationRecord>;
    async fn delete_medication(&self, medication_id: &MedicationId) -> Result<()>;

    /// Delivers the current medication list for a hub immediately, then again
    /// on every change, until the stream is dropped.
    fn watch_medications(&self, hub_id: &HubId) -> MedicationStream;
}

#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug)]
pub struct NewHub {
    pub name: String,
    pub join_code: String,
    /// The founding member, who becomes the admin
    pub admin: UserId,
}

#[derive(Debug)]
pub struct NewMedication {
    pub hub_id: HubId,
    pub name: String,
    pub dosage: String,
    pub reminder_time: NaiveTime,
    pub image_url: Option<String>,
}

#[derive(Debug)]
pub struct UpdatedMedication {
    pub id: MedicationId,
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub reminder_time: Option<NaiveTime>,
    pub image_url: Option<String>,
}
