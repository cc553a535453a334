use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use shared_config::AppConfig;

/// Parses a 24-hour `HH:MM` (or `HH:MM:SS`) string into minutes since midnight.
/// Anything malformed yields 0.
pub fn time_to_minutes(time: &str) -> u32 {
    let mut parts = time.trim().split(':');
    let hours = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minutes = parts.next().and_then(|m| m.trim().parse::<u32>().ok());

    match (hours, minutes) {
        (Some(h), Some(m)) if h < 24 && m < 60 => h * 60 + m,
        _ => 0,
    }
}

pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Ceiling of `minutes` to the next multiple of `duration`.
pub fn round_up_to_next_slot(minutes: u32, duration: u32) -> u32 {
    if duration == 0 {
        return minutes;
    }
    minutes.div_ceil(duration).saturating_mul(duration)
}

/// Half-open overlap: `[start_a, end_a)` and `[start_b, end_b)` share a minute.
pub fn overlaps(start_a: u32, end_a: u32, start_b: u32, end_b: u32) -> bool {
    start_a < end_b && start_b < end_a
}

/// 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Wall-clock questions asked in the clinic's business timezone.
#[derive(Clone)]
pub struct BusinessClock {
    timezone: Tz,
    buffer_minutes: u32,
    clock: Arc<dyn Clock>,
}

impl BusinessClock {
    pub fn new(timezone: Tz, buffer_minutes: u32, clock: Arc<dyn Clock>) -> Self {
        Self { timezone, buffer_minutes, clock }
    }

    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let timezone = config.business_timezone.parse::<Tz>().unwrap_or_else(|_| {
            warn!("Unknown business timezone '{}', falling back to UTC", config.business_timezone);
            Tz::UTC
        });

        Self::new(timezone, config.slot_buffer_minutes, clock)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn buffer_minutes(&self) -> u32 {
        self.buffer_minutes
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone).date_naive()
    }

    pub fn current_time_in_minutes(&self) -> u32 {
        let local = self.clock.now().with_timezone(&self.timezone);
        local.hour() * 60 + local.minute()
    }

    pub fn is_today(&self, date: NaiveDate) -> bool {
        date == self.today()
    }

    /// Slots on `date` starting at or before the returned minute have passed.
    /// `None` when `date` is not today.
    pub fn passed_cutoff(&self, date: NaiveDate) -> Option<u32> {
        if !self.is_today(date) {
            return None;
        }
        Some(self.current_time_in_minutes() + self.buffer_minutes)
    }

    pub fn has_slot_passed(&self, slot_start: u32, date: NaiveDate) -> bool {
        match self.passed_cutoff(date) {
            Some(cutoff) => slot_start <= cutoff,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock_at(utc: DateTime<Utc>) -> BusinessClock {
        BusinessClock::new(chrono_tz::America::Sao_Paulo, 5, Arc::new(FixedClock(utc)))
    }

    #[test]
    fn test_time_to_minutes_accepts_seconds_and_rejects_garbage() {
        assert_eq!(time_to_minutes("09:30"), 570);
        assert_eq!(time_to_minutes("09:30:00"), 570);
        assert_eq!(time_to_minutes(""), 0);
        assert_eq!(time_to_minutes("nine"), 0);
        assert_eq!(time_to_minutes("10:75"), 0);
        assert_eq!(time_to_minutes("25:00"), 0);
        assert_eq!(time_to_minutes("99999999:00"), 0);
        assert_eq!(time_to_minutes("23:59"), 1439);
    }

    #[test]
    fn test_minutes_round_trip_is_zero_padded() {
        assert_eq!(minutes_to_time(0), "00:00");
        assert_eq!(minutes_to_time(545), "09:05");
        assert_eq!(time_to_minutes(&minutes_to_time(1439)), 1439);
    }

    #[test]
    fn test_round_up_to_next_slot() {
        assert_eq!(round_up_to_next_slot(600, 30), 600);
        assert_eq!(round_up_to_next_slot(601, 30), 630);
        assert_eq!(round_up_to_next_slot(0, 45), 0);
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert!(overlaps(540, 600, 570, 630));
        assert!(!overlaps(540, 600, 600, 630));
        assert!(!overlaps(600, 630, 540, 600));
    }

    #[test]
    fn test_today_follows_business_timezone() {
        // 01:30 UTC on the 8th is still 22:30 on the 7th in Sao Paulo (UTC-3).
        let clock = clock_at(Utc.with_ymd_and_hms(2030, 1, 8, 1, 30, 0).unwrap());

        assert!(clock.is_today(NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()));
        assert!(!clock.is_today(NaiveDate::from_ymd_opt(2030, 1, 8).unwrap()));
        assert_eq!(clock.current_time_in_minutes(), 22 * 60 + 30);
    }

    #[test]
    fn test_has_slot_passed_applies_buffer_only_today() {
        // 13:00 UTC = 10:00 local.
        let clock = clock_at(Utc.with_ymd_and_hms(2030, 1, 7, 13, 0, 0).unwrap());
        let today = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2030, 1, 8).unwrap();

        assert!(clock.has_slot_passed(600, today));
        assert!(clock.has_slot_passed(605, today));
        assert!(!clock.has_slot_passed(606, today));
        assert!(!clock.has_slot_passed(0, tomorrow));
        assert_eq!(clock.passed_cutoff(tomorrow), None);
    }
}
