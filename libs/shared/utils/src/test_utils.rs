use std::sync::Arc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub business_timezone: String,
    pub slot_buffer_minutes: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            business_timezone: "America/Sao_Paulo".to_string(),
            slot_buffer_minutes: 5,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            business_timezone: self.business_timezone.clone(),
            slot_buffer_minutes: self.slot_buffer_minutes,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST rows for the scheduling tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn organization(id: u64) -> Value {
        json!({
            "id": id,
            "name": "Test Clinic"
        })
    }

    pub fn service(id: &str, organization_id: u64, duration: Value) -> Value {
        json!({
            "id": id,
            "organization_id": organization_id,
            "name": "Consultation",
            "duration": duration
        })
    }

    pub fn weekly_schedule(professional_id: &str, day_of_week: u32, start: &str, end: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "professional_id": professional_id,
            "day_of_week": day_of_week,
            "start_time": start,
            "end_time": end,
            "break_start": null,
            "break_end": null,
            "is_exception": false,
            "exception_date": null,
            "is_active": true
        })
    }

    pub fn exception_schedule(professional_id: &str, date: &str, start: &str, end: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "professional_id": professional_id,
            "day_of_week": null,
            "start_time": start,
            "end_time": end,
            "break_start": null,
            "break_end": null,
            "is_exception": true,
            "exception_date": date,
            "is_active": true
        })
    }

    pub fn schedule_break(schedule_id: &str, name: &str, start: &str, end: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "schedule_id": schedule_id,
            "name": name,
            "start_time": start,
            "end_time": end,
            "is_active": true
        })
    }

    pub fn booking(professional_id: &str, date: &str, start: &str, end: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "professional_id": professional_id,
            "date": date,
            "start_time": start,
            "end_time": end,
            "status": status
        })
    }

    pub fn vacation(user_id: &str, start_date: &str, end_date: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "user_id": user_id,
            "start_date": start_date,
            "end_date": end_date,
            "status": status
        })
    }

    pub fn professional(id: &str, full_name: &str, organization_id: u64) -> Value {
        json!({
            "id": id,
            "full_name": full_name,
            "organization_id": organization_id,
            "is_active": true
        })
    }

    pub fn service_assignment(service_id: &str, professional_id: &str) -> Value {
        json!({
            "service_id": service_id,
            "professional_id": professional_id
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
