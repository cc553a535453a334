pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{
    AvailabilityError, AvailableSlot, AvailableSlotsRequest, AvailableSlotsResponse,
    ProfessionalSelector, MAX_RANGE_DAYS,
};
pub use services::AvailabilityService;
