pub mod aggregator;
pub mod availability;
pub mod clock;
pub mod conflicts;
pub mod schedule;
pub mod slots;

pub use availability::AvailabilityService;
pub use clock::{BusinessClock, Clock, FixedClock, SystemClock};
