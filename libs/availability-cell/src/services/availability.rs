use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    id_to_string, AvailabilityError, AvailableSlot, AvailableSlotsRequest, AvailableSlotsResponse,
    DateRange, MinuteWindow, Organization, Professional, ProfessionalSelector, Service, SlotConflicts,
    ValidatedSlotsQuery, MAX_RANGE_DAYS,
};
use crate::services::aggregator::{merge_professional_slots, ProfessionalPool};
use crate::services::clock::{minutes_to_time, BusinessClock, Clock, SystemClock};
use crate::services::conflicts::ConflictCollector;
use crate::services::schedule::{schedule_window, ScheduleResolver};
use crate::services::slots::generate_slots;

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
    clock: BusinessClock,
    resolver: ScheduleResolver,
    collector: ConflictCollector,
    pool: ProfessionalPool,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            clock: BusinessClock::from_config(config, clock),
            resolver: ScheduleResolver::new(supabase.clone()),
            collector: ConflictCollector::new(supabase.clone()),
            pool: ProfessionalPool::new(supabase.clone()),
            supabase,
        }
    }

    /// Available slots for every date of the requested range.
    pub async fn get_available_slots(
        &self,
        request: AvailableSlotsRequest,
        auth_token: Option<&str>,
    ) -> Result<AvailableSlotsResponse, AvailabilityError> {
        let query = validate_request(&request)?;
        debug!(
            "Computing slots for {:?}, service {} from {} to {}",
            query.professional, query.service_id, query.start_date, query.end_date
        );

        self.load_organization(query.organization_id, auth_token).await?;
        let duration = self.load_service_duration(&query.service_id, query.organization_id, auth_token).await?;

        let dates = query.dates();
        let per_date: Vec<Result<Vec<AvailableSlot>, AvailabilityError>> = match &query.professional {
            ProfessionalSelector::Specific(professional_id) => {
                join_all(dates.iter().map(|date| async move {
                    let windows = self.slots_for_professional(professional_id, *date, duration, auth_token).await?;
                    Ok::<_, AvailabilityError>(windows.into_iter().map(plain_slot).collect())
                }))
                .await
            }
            ProfessionalSelector::Any => {
                let professionals = self
                    .pool
                    .eligible_professionals(&query.service_id, query.organization_id, auth_token)
                    .await?;
                let professionals = &professionals;

                join_all(dates.iter().map(|date| async move {
                    Ok::<_, AvailabilityError>(
                        self.slots_for_any_professional(professionals, *date, duration, auth_token).await,
                    )
                }))
                .await
            }
        };

        let mut slots_by_date = BTreeMap::new();
        for (date, slots) in dates.iter().zip(per_date) {
            slots_by_date.insert(date.format("%Y-%m-%d").to_string(), slots?);
        }

        Ok(AvailableSlotsResponse {
            slots_by_date,
            date_range: DateRange {
                start_date: query.start_date.format("%Y-%m-%d").to_string(),
                end_date: query.end_date.format("%Y-%m-%d").to_string(),
            },
        })
    }

    /// Resolve the day's schedule, collect what blocks it, and walk each
    /// schedule window.
    pub async fn slots_for_professional(
        &self,
        professional_id: &str,
        date: NaiveDate,
        duration: u32,
        auth_token: Option<&str>,
    ) -> Result<Vec<MinuteWindow>, AvailabilityError> {
        let Some(resolved) = self.resolver.resolve(professional_id, date, auth_token).await? else {
            return Ok(Vec::new());
        };

        let bookings = self.collector.collect(professional_id, date, auth_token).await?;
        if bookings.on_vacation(date) {
            debug!("Professional {} is on approved vacation on {}", professional_id, date);
            return Ok(Vec::new());
        }

        let cutoff = self.clock.passed_cutoff(date);
        let appointments = bookings.appointment_windows();
        let group_activities = bookings.group_activity_windows();

        let mut slots = Vec::new();
        for schedule in &resolved.schedules {
            let conflicts = SlotConflicts {
                breaks: resolved.break_windows(schedule),
                appointments: appointments.clone(),
                group_activities: group_activities.clone(),
            };
            slots.extend(generate_slots(schedule_window(schedule), &conflicts, duration, cutoff));
        }

        debug!("Professional {} has {} free slots on {}", professional_id, slots.len(), date);
        Ok(slots)
    }

    /// A failure for one professional only removes that professional's slots.
    pub async fn slots_for_any_professional(
        &self,
        professionals: &[Professional],
        date: NaiveDate,
        duration: u32,
        auth_token: Option<&str>,
    ) -> Vec<AvailableSlot> {
        let results = join_all(professionals.iter().map(|professional| async move {
            match self.slots_for_professional(&professional.id, date, duration, auth_token).await {
                Ok(windows) => Some((professional.clone(), windows)),
                Err(e) => {
                    warn!("Failed to compute slots for professional {} on {}: {}", professional.id, date, e);
                    None
                }
            }
        }))
        .await;

        merge_professional_slots(results.into_iter().flatten().collect())
    }

    async fn load_organization(&self, organization_id: u64, auth_token: Option<&str>) -> Result<Organization, AvailabilityError> {
        let rows: Vec<Organization> = self
            .supabase
            .select(
                "organizations",
                &[("id", format!("eq.{}", organization_id)), ("select", "id,name".to_string())],
                auth_token,
            )
            .await?;

        rows.into_iter().next().ok_or(AvailabilityError::OrganizationNotFound)
    }

    async fn load_service_duration(
        &self,
        service_id: &str,
        organization_id: u64,
        auth_token: Option<&str>,
    ) -> Result<u32, AvailabilityError> {
        let rows: Vec<Service> = self
            .supabase
            .select(
                "services",
                &[
                    ("id", format!("eq.{}", service_id)),
                    ("organization_id", format!("eq.{}", organization_id)),
                ],
                auth_token,
            )
            .await?;

        // Rows must match both the id and the organization, whatever the filter returned.
        let service = rows
            .into_iter()
            .find(|s| s.id == service_id && s.belongs_to(organization_id))
            .ok_or(AvailabilityError::ServiceNotFound)?;

        service
            .duration_minutes()
            .ok_or_else(|| AvailabilityError::InvalidServiceDuration(service.duration.to_string()))
    }
}

fn plain_slot(window: MinuteWindow) -> AvailableSlot {
    AvailableSlot {
        start_time: minutes_to_time(window.start),
        end_time: minutes_to_time(window.end),
        available: true,
        professional_id: None,
        professional_name: None,
    }
}

/// Every check that needs no data-store access.
pub fn validate_request(request: &AvailableSlotsRequest) -> Result<ValidatedSlotsQuery, AvailabilityError> {
    let professional = request
        .professional_id
        .as_ref()
        .and_then(id_to_string)
        .and_then(|raw| ProfessionalSelector::parse(&raw));
    let service_id = request.service_id.as_ref().and_then(id_to_string);
    let start_date = non_blank(request.start_date.as_deref());
    let end_date = non_blank(request.end_date.as_deref());

    let mut missing = Vec::new();
    if professional.is_none() {
        missing.push("professionalId");
    }
    if service_id.is_none() {
        missing.push("serviceId");
    }
    if start_date.is_none() {
        missing.push("startDate");
    }
    if end_date.is_none() {
        missing.push("endDate");
    }

    let (Some(professional), Some(service_id), Some(start_date), Some(end_date)) =
        (professional, service_id, start_date, end_date)
    else {
        return Err(AvailabilityError::MissingParameter(missing.join(", ")));
    };

    let organization_id = request
        .organization_id
        .as_ref()
        .and_then(parse_organization_id)
        .ok_or(AvailabilityError::InvalidOrganizationId)?;

    let start_date = parse_date(start_date)?;
    let end_date = parse_date(end_date)?;

    if start_date > end_date {
        return Err(AvailabilityError::InvalidDateRange);
    }
    if (end_date - start_date).num_days() > MAX_RANGE_DAYS {
        return Err(AvailabilityError::RangeTooLarge { max_days: MAX_RANGE_DAYS });
    }

    Ok(ValidatedSlotsQuery {
        organization_id,
        professional,
        service_id,
        start_date,
        end_date,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_organization_id(value: &serde_json::Value) -> Option<u64> {
    let id = match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

/// Accepts `YYYY-MM-DD`, optionally followed by an ISO time part.
fn parse_date(raw: &str) -> Result<NaiveDate, AvailabilityError> {
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| AvailabilityError::InvalidDate(raw.to_string()))
}
