//! Booking platform API access
//!
//! A thin reqwest client plus the entity types the service returns. The
//! client methods double as poll probes: `|| client.find_booking(&t, 1, 3)`.

pub mod client;
pub mod models;

pub use client::{BookerClient, RawResponse};
pub use models::{
    Address, Booking, BookingDates, BookingList, Branding, Contact, LoginRequest, MapLocation,
    Message, MessageList, MessageSummary,
};
