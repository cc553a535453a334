use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityError, AvailableSlot, MinuteWindow, Professional, ServiceAssignment};
use crate::services::clock::minutes_to_time;

/// Unions per-professional slot lists for "any professional" requests.
///
/// Input order decides ownership: the first professional to offer a given
/// `(start, end)` window keeps it. The result is sorted by start time.
pub fn merge_professional_slots(per_professional: Vec<(Professional, Vec<MinuteWindow>)>) -> Vec<AvailableSlot> {
    let mut seen = HashSet::new();
    let mut merged: Vec<(MinuteWindow, &Professional)> = Vec::new();

    for (professional, windows) in &per_professional {
        for window in windows {
            if seen.insert(*window) {
                merged.push((*window, professional));
            }
        }
    }

    merged.sort_by_key(|(window, _)| (window.start, window.end));

    merged
        .into_iter()
        .map(|(window, professional)| AvailableSlot {
            start_time: minutes_to_time(window.start),
            end_time: minutes_to_time(window.end),
            available: true,
            professional_id: Some(professional.id.clone()),
            professional_name: Some(professional.display_name()),
        })
        .collect()
}

pub struct ProfessionalPool {
    supabase: Arc<SupabaseClient>,
}

impl ProfessionalPool {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Active professionals of the organization assigned to the service. A
    /// service with no assignment rows at all is open to every active
    /// professional of the organization.
    pub async fn eligible_professionals(
        &self,
        service_id: &str,
        organization_id: u64,
        auth_token: Option<&str>,
    ) -> Result<Vec<Professional>, AvailabilityError> {
        let assignments: Vec<ServiceAssignment> = self
            .supabase
            .select(
                "service_professionals",
                &[
                    ("service_id", format!("eq.{}", service_id)),
                    ("select", "professional_id".to_string()),
                ],
                auth_token,
            )
            .await?;

        let mut filters = vec![
            ("organization_id", format!("eq.{}", organization_id)),
            ("is_active", "eq.true".to_string()),
            ("select", "id,full_name".to_string()),
            ("order", "full_name.asc".to_string()),
        ];

        if assignments.is_empty() {
            debug!("Service {} has no assigned professionals, using all active professionals", service_id);
        } else {
            let ids: Vec<&str> = assignments.iter().map(|a| a.professional_id.as_str()).collect();
            filters.push(("id", format!("in.({})", ids.join(","))));
        }

        let professionals: Vec<Professional> = self.supabase.select("professionals", &filters, auth_token).await?;
        debug!("{} eligible professionals for service {}", professionals.len(), service_id);

        Ok(professionals)
    }
}
