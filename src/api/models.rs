//! Request and response bodies of the booking platform

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ValidateResponse {
    #[serde(default)]
    pub valid: bool,
}

/// Body of `POST /booking`; only the assigned id is read
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct CreatedBooking {
    #[serde(default)]
    pub bookingid: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

/// Check-in and check-out dates, `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookingDates {
    pub checkin: String,
    pub checkout: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookingid: Option<i64>,
    pub roomid: i64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub depositpaid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub bookingdates: BookingDates,
}

impl Booking {
    /// Find a booking by id in a room listing
    pub fn find_in(bookings: &[Booking], booking_id: i64) -> Option<&Booking> {
        bookings.iter().find(|b| b.bookingid == Some(booking_id))
    }
}

/// Body of `GET /booking?roomid=`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookingList {
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub post_town: Option<String>,
    pub county: Option<String>,
    pub post_code: Option<String>,
}

/// Body of `GET /branding` and `PUT /branding`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub name: Option<String>,
    #[serde(default)]
    pub map: MapLocation,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub directions: Option<String>,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub address: Address,
}

/// Entry of `GET /message`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: i64,
    pub name: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<MessageSummary>,
}

/// Body of `GET /message/{id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    pub messageid: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
}
