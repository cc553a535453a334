use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityError, BookedBlock, MinuteWindow, VacationRequest};
use crate::services::clock::time_to_minutes;

/// What already occupies a professional's day.
#[derive(Debug, Clone, Default)]
pub struct DayBookings {
    pub vacations: Vec<VacationRequest>,
    pub appointments: Vec<BookedBlock>,
    pub group_activities: Vec<BookedBlock>,
}

impl DayBookings {
    pub fn on_vacation(&self, date: NaiveDate) -> bool {
        self.vacations.iter().any(|v| v.blocks(date))
    }

    pub fn appointment_windows(&self) -> Vec<MinuteWindow> {
        to_windows(&self.appointments)
    }

    pub fn group_activity_windows(&self) -> Vec<MinuteWindow> {
        to_windows(&self.group_activities)
    }
}

fn to_windows(blocks: &[BookedBlock]) -> Vec<MinuteWindow> {
    blocks
        .iter()
        .filter(|b| !b.is_cancelled())
        .map(|b| MinuteWindow::new(time_to_minutes(&b.start_time), time_to_minutes(&b.end_time)))
        .filter(|w| !w.is_empty())
        .collect()
}

pub struct ConflictCollector {
    supabase: Arc<SupabaseClient>,
}

impl ConflictCollector {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// The three lookups are independent and run concurrently.
    pub async fn collect(
        &self,
        professional_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<DayBookings, AvailabilityError> {
        let (vacations, appointments, group_activities) = tokio::join!(
            self.approved_vacations(professional_id, date, auth_token),
            self.booked_blocks("appointments", professional_id, date, auth_token),
            self.booked_blocks("group_activities", professional_id, date, auth_token),
        );

        let bookings = DayBookings {
            vacations,
            appointments: appointments?,
            group_activities: group_activities?,
        };

        debug!(
            "Professional {} on {}: {} appointments, {} group activities, on vacation: {}",
            professional_id,
            date,
            bookings.appointments.len(),
            bookings.group_activities.len(),
            bookings.on_vacation(date)
        );

        Ok(bookings)
    }

    /// Best-effort: a failed lookup means "not on vacation".
    async fn approved_vacations(
        &self,
        professional_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Vec<VacationRequest> {
        let filters = [
            ("user_id", format!("eq.{}", professional_id)),
            ("status", "eq.approved".to_string()),
            ("start_date", format!("lte.{}", date)),
            ("end_date", format!("gte.{}", date)),
        ];

        match self.supabase.select::<VacationRequest>("vacation_requests", &filters, auth_token).await {
            Ok(rows) => rows.into_iter().filter(|v| v.blocks(date)).collect(),
            Err(e) => {
                warn!("Failed to load vacations for professional {} on {}: {}", professional_id, date, e);
                Vec::new()
            }
        }
    }

    async fn booked_blocks(
        &self,
        table: &str,
        professional_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<BookedBlock>, AvailabilityError> {
        let filters = [
            ("professional_id", format!("eq.{}", professional_id)),
            ("date", format!("eq.{}", date)),
            ("status", "neq.cancelled".to_string()),
            ("order", "start_time.asc".to_string()),
        ];

        let rows: Vec<BookedBlock> = self.supabase.select(table, &filters, auth_token).await?;
        Ok(rows
            .into_iter()
            .filter(|b| !b.is_cancelled() && b.date.map_or(true, |d| d == date))
            .collect())
    }
}
