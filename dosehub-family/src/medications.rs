use thiserror::Error;

use dosehub_core::{
    HubId, MedicationId, MedicationRecord, NewMedication, Store, StoreError, UpdatedMedication,
};

use crate::{FamilyContext, IdentityProvider};

/// Images are stored inline as data urls, so they have to stay small
const MAX_IMAGE_BYTES: usize = 750_000;
const DEFAULT_DOSAGE: &str = "As directed";

pub struct MedicationManager<S, P> {
    context: FamilyContext<S, P>,
}

#[derive(Debug, Error)]
pub enum MedicationError {
    #[error("Please enter a medication name")]
    NameRequired,
    #[error("File too large. Max 750KB.")]
    ImageTooLarge,
    #[error(transparent)]
    Store(StoreError),
}

impl<S, P> MedicationManager<S, P>
where
    S: Store,
    P: IdentityProvider,
{
    pub fn new(context: &FamilyContext<S, P>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Adds a medication to a hub. New medications always start out pending
    /// with no taken date, regardless of the clock.
    pub async fn add(
        &self,
        mut new_medication: NewMedication,
    ) -> Result<MedicationRecord, MedicationError> {
        new_medication.name = required_name(&new_medication.name)?;
        new_medication.dosage = dosage_or_default(&new_medication.dosage);

        check_image(new_medication.image_url.as_deref())?;

        self.context
            .store
            .create_medication(new_medication)
            .await
            .map_err(MedicationError::Store)
    }

    /// Updates a medication's details. Status and taken date are owned by the
    /// tracker and cannot be changed from here.
    pub async fn update(
        &self,
        mut update: UpdatedMedication,
    ) -> Result<MedicationRecord, MedicationError> {
        if let Some(name) = &update.name {
            update.name = Some(required_name(name)?);
        }

        if let Some(dosage) = &update.dosage {
            update.dosage = Some(dosage_or_default(dosage));
        }

        check_image(update.image_url.as_deref())?;

        self.context
            .store
            .update_medication(update)
            .await
            .map_err(MedicationError::Store)
    }

    pub async fn delete(&self, medication_id: &MedicationId) -> Result<(), MedicationError> {
        self.context
            .store
            .delete_medication(medication_id)
            .await
            .map_err(MedicationError::Store)
    }

    /// All of a hub's medications, ordered by reminder time.
    pub async fn list(&self, hub_id: &HubId) -> Result<Vec<MedicationRecord>, MedicationError> {
        let mut records = self
            .context
            .store
            .medications_by_hub(hub_id)
            .await
            .map_err(MedicationError::Store)?;

        records.sort_by_key(|m| m.reminder_time);

        Ok(records)
    }
}

fn required_name(name: &str) -> Result<String, MedicationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(MedicationError::NameRequired);
    }

    Ok(name.to_string())
}

fn dosage_or_default(dosage: &str) -> String {
    let dosage = dosage.trim();

    if dosage.is_empty() {
        DEFAULT_DOSAGE.to_string()
    } else {
        dosage.to_string()
    }
}

fn check_image(image_url: Option<&str>) -> Result<(), MedicationError> {
    let size = image_url.map(|data| data.len()).unwrap_or_default();

    if size > MAX_IMAGE_BYTES {
        return Err(MedicationError::ImageTooLarge);
    }

    Ok(())
}
