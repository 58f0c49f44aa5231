//! Data models for the bus-pass server

pub mod admin;
pub mod admission;
pub mod booking;
pub mod bus;
pub mod route_code;
pub mod route_stop;
pub mod settings;

// Re-export commonly used types
pub use admission::AdmissionNumber;
pub use booking::{Booking, NewBooking};
pub use bus::Bus;
pub use route_code::RouteCode;
pub use route_stop::{Fare, RouteStop};
pub use settings::{AdminSettings, BookingRound};
