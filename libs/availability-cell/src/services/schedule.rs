use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityError, MinuteWindow, ScheduleBreak, WorkSchedule};
use crate::services::clock::{day_of_week, time_to_minutes};

/// The authoritative schedule rows for one professional on one date, plus the
/// breaks attached to the first of them.
#[derive(Debug, Clone)]
pub struct ResolvedSchedule {
    pub schedules: Vec<WorkSchedule>,
    pub breaks: Vec<ScheduleBreak>,
}

impl ResolvedSchedule {
    /// Main break of `schedule` followed by the additional breaks, as windows.
    pub fn break_windows(&self, schedule: &WorkSchedule) -> Vec<MinuteWindow> {
        let mut windows = Vec::with_capacity(self.breaks.len() + 1);

        if let (Some(start), Some(end)) = (schedule.break_start.as_deref(), schedule.break_end.as_deref()) {
            let main = MinuteWindow::new(time_to_minutes(start), time_to_minutes(end));
            if !main.is_empty() {
                windows.push(main);
            }
        }

        windows.extend(
            self.breaks
                .iter()
                .filter(|b| b.is_active)
                .map(|b| MinuteWindow::new(time_to_minutes(&b.start_time), time_to_minutes(&b.end_time)))
                .filter(|w| !w.is_empty()),
        );

        windows
    }
}

pub fn schedule_window(schedule: &WorkSchedule) -> MinuteWindow {
    MinuteWindow::new(time_to_minutes(&schedule.start_time), time_to_minutes(&schedule.end_time))
}

pub struct ScheduleResolver {
    supabase: Arc<SupabaseClient>,
}

impl ScheduleResolver {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Exception rows dated exactly to `date` win; otherwise the weekly rows for
    /// the date's weekday. `None` means the professional does not work that day.
    pub async fn resolve(
        &self,
        professional_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Option<ResolvedSchedule>, AvailabilityError> {
        let mut schedules = self.exception_schedules(professional_id, date, auth_token).await?;

        if schedules.is_empty() {
            schedules = self.weekly_schedules(professional_id, date, auth_token).await?;
        } else {
            debug!("Exception schedule overrides weekly schedule for {} on {}", professional_id, date);
        }

        let Some(selected) = schedules.first() else {
            debug!("No work schedule for professional {} on {}", professional_id, date);
            return Ok(None);
        };

        if schedules.len() > 1 {
            warn!(
                "Professional {} has {} authoritative schedules on {}; breaks are taken from schedule {}",
                professional_id,
                schedules.len(),
                date,
                selected.id
            );
        }

        let breaks = self.breaks_for(&selected.id, auth_token).await;

        Ok(Some(ResolvedSchedule { schedules, breaks }))
    }

    async fn exception_schedules(
        &self,
        professional_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<WorkSchedule>, AvailabilityError> {
        let filters = [
            ("professional_id", format!("eq.{}", professional_id)),
            ("is_exception", "eq.true".to_string()),
            ("exception_date", format!("eq.{}", date)),
            ("is_active", "eq.true".to_string()),
            ("order", "start_time.asc".to_string()),
        ];

        let rows: Vec<WorkSchedule> = self.supabase.select("work_schedules", &filters, auth_token).await?;
        Ok(rows
            .into_iter()
            .filter(|s| s.is_active && s.is_exception && s.exception_date == Some(date))
            .collect())
    }

    async fn weekly_schedules(
        &self,
        professional_id: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<WorkSchedule>, AvailabilityError> {
        let weekday = day_of_week(date) as i32;
        let filters = [
            ("professional_id", format!("eq.{}", professional_id)),
            ("is_exception", "eq.false".to_string()),
            ("day_of_week", format!("eq.{}", weekday)),
            ("is_active", "eq.true".to_string()),
            ("order", "start_time.asc".to_string()),
        ];

        let rows: Vec<WorkSchedule> = self.supabase.select("work_schedules", &filters, auth_token).await?;
        Ok(rows
            .into_iter()
            .filter(|s| s.is_active && !s.is_exception && s.day_of_week == Some(weekday))
            .collect())
    }

    /// Best-effort: a failed lookup is logged and treated as "no extra breaks".
    async fn breaks_for(&self, schedule_id: &str, auth_token: Option<&str>) -> Vec<ScheduleBreak> {
        let filters = [
            ("schedule_id", format!("eq.{}", schedule_id)),
            ("is_active", "eq.true".to_string()),
            ("order", "start_time.asc".to_string()),
        ];

        match self.supabase.select::<ScheduleBreak>("schedule_breaks", &filters, auth_token).await {
            Ok(breaks) => {
                debug!("Loaded {} breaks for schedule {}", breaks.len(), schedule_id);
                breaks
            }
            Err(e) => {
                warn!("Failed to load breaks for schedule {}: {}", schedule_id, e);
                Vec::new()
            }
        }
    }
}
