use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A store-assigned identifier for a record of any kind.
pub struct Id<T> {
    value: String,
    kind: PhantomData<T>,
}

pub type UserId = Id<UserRecord>;
pub type HubId = Id<HubRecord>;
pub type MedicationId = Id<MedicationRecord>;

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: PhantomData,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            kind: PhantomData,
        }
    }
}

impl<T> Eq for Id<T> {}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Id::new)
    }
}

/// The lifecycle state of a medication's daily dose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    #[default]
    Pending,
    Taken,
    Missed,
}

/// A medication tracked by a hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecord {
    pub id: MedicationId,
    pub hub_id: HubId,
    pub name: String,
    /// Free-text dosage description, e.g. "100 mg"
    pub dosage: String,
    /// The daily time the dose is due, stored as "HH:MM"
    #[serde(with = "wire_time")]
    pub reminder_time: NaiveTime,
    pub status: DoseStatus,
    /// The date the dose was last marked taken, stored as "YYYY-MM-DD" or an empty string
    #[serde(with = "wire_date")]
    pub last_taken_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MedicationRecord {
    /// The status after the daily reset rule. A taken status only counts
    /// on the day it was set, so a leftover one reads as pending.
    pub fn effective_status(&self, today: NaiveDate) -> DoseStatus {
        match self.status {
            DoseStatus::Taken if self.last_taken_date != Some(today) => DoseStatus::Pending,
            status => status,
        }
    }

    /// True when the stored status claims taken for a day that has passed.
    pub fn has_stale_taken_status(&self, today: NaiveDate) -> bool {
        self.status == DoseStatus::Taken && self.last_taken_date != Some(today)
    }
}

/// A group of users sharing one medication list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubRecord {
    pub id: HubId,
    #[serde(rename = "hubName")]
    pub name: String,
    /// The code other users enter to join this hub
    pub join_code: String,
    pub members: Vec<UserId>,
    pub admin: UserId,
    pub created_at: DateTime<Utc>,
}

/// A dosehub account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// The hub this user belongs to, set when creating or joining one
    #[serde(rename = "familyHubId")]
    pub hub_id: Option<HubId>,
}

mod wire_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;

        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

mod wire_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;

        if raw.is_empty() {
            return Ok(None);
        }

        NaiveDate::parse_from_str(&raw, FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
