pub mod availability;
pub mod booking;
pub mod timeline;

pub use availability::{compute_available_slots, AvailabilityService, EditingSlot};
pub use booking::AppointmentBookingService;
pub use timeline::AppointmentTimelineService;
