use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Longest span, in days between start and end date, a single request may cover.
pub const MAX_RANGE_DAYS: i64 = 30;

/// A slot never outlasts the working day it is cut from.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ==============================================================================
// STORED ROWS (read-only from this cell)
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub organization_id: Option<String>,
    /// Raw duration column; validated by [`Service::duration_minutes`].
    #[serde(default)]
    pub duration: Value,
}

impl Service {
    /// The slot size in minutes, if the stored duration is a positive integer
    /// no longer than a day.
    pub fn duration_minutes(&self) -> Option<u32> {
        let minutes = match &self.duration {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }?;

        match u32::try_from(minutes) {
            Ok(minutes) if (1..=MINUTES_PER_DAY).contains(&minutes) => Some(minutes),
            _ => None,
        }
    }

    pub fn belongs_to(&self, organization_id: u64) -> bool {
        self.organization_id.as_deref() == Some(organization_id.to_string().as_str())
    }
}

/// A professional's working window for one day, either recurring on a weekday
/// or an exception pinned to a single date.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkSchedule {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub professional_id: String,
    pub day_of_week: Option<i32>, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: String,
    pub end_time: String,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    #[serde(default)]
    pub is_exception: bool,
    pub exception_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleBreak {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub schedule_id: String,
    pub name: Option<String>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// An appointment or group activity occupying a professional's calendar.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedBlock {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub status: Option<String>,
}

impl BookedBlock {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.status.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("cancelled") | Some("canceled")
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VacationRequest {
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
}

impl VacationRequest {
    pub fn blocks(&self, date: NaiveDate) -> bool {
        self.status.eq_ignore_ascii_case("approved")
            && self.start_date <= date
            && date <= self.end_date
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Professional {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
}

impl Professional {
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAssignment {
    #[serde(deserialize_with = "id_string")]
    pub professional_id: String,
}

// ==============================================================================
// MINUTE INTERVALS
// ==============================================================================

/// Half-open `[start, end)` window in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteWindow {
    pub start: u32,
    pub end: u32,
}

impl MinuteWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Everything that can block a candidate slot on one professional's day.
#[derive(Debug, Clone, Default)]
pub struct SlotConflicts {
    /// Main break first, then additional breaks in load order.
    pub breaks: Vec<MinuteWindow>,
    pub appointments: Vec<MinuteWindow>,
    pub group_activities: Vec<MinuteWindow>,
}

// ==============================================================================
// REQUEST / RESPONSE DTOs
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsRequest {
    #[serde(default)]
    pub organization_id: Option<Value>,
    #[serde(default)]
    pub professional_id: Option<Value>,
    #[serde(default)]
    pub service_id: Option<Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfessionalSelector {
    Any,
    Specific(String),
}

impl ProfessionalSelector {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.eq_ignore_ascii_case("any") {
            Some(ProfessionalSelector::Any)
        } else {
            Some(ProfessionalSelector::Specific(trimmed.to_string()))
        }
    }
}

/// A request that passed every check that needs no data-store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSlotsQuery {
    pub organization_id: u64,
    pub professional: ProfessionalSelector,
    pub service_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ValidatedSlotsQuery {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub start_time: String,
    pub end_time: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsResponse {
    pub slots_by_date: BTreeMap<String, Vec<AvailableSlot>>,
    pub date_range: DateRange,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Missing required parameters: {0}")]
    MissingParameter(String),

    #[error("Invalid organization id")]
    InvalidOrganizationId,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Start date must be before or equal to end date")]
    InvalidDateRange,

    #[error("Date range cannot exceed {max_days} days")]
    RangeTooLarge { max_days: i64 },

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Invalid service duration: {0}")]
    InvalidServiceDuration(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for AvailabilityError {
    fn from(err: anyhow::Error) -> Self {
        AvailabilityError::DatabaseError(err.to_string())
    }
}

// ==============================================================================
// SERDE HELPERS
// ==============================================================================

fn default_true() -> bool {
    true
}

/// Ids arrive as integers for some tables and as uuids for others.
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_to_string(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

fn optional_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_to_string))
}
