//! HTTP client for the booking platform

use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::models::{
    Booking, BookingList, Branding, CreatedBooking, LoginRequest, Message, MessageList,
    MessageSummary, SuccessResponse, TokenResponse, ValidateResponse,
};
use crate::common::config::ApiConfig;
use crate::common::{Error, Result};

pub const AUTH_LOGIN_ENDPOINT: &str = "/auth/login";
pub const AUTH_VALIDATE_ENDPOINT: &str = "/auth/validate";
pub const BOOKING_ENDPOINT: &str = "/booking";
pub const BRANDING_ENDPOINT: &str = "/branding";
pub const MESSAGE_ENDPOINT: &str = "/message";

/// Status code and decoded body of a raw call
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

/// Client for the booking platform API
#[derive(Debug, Clone)]
pub struct BookerClient {
    http: reqwest::Client,
    base_url: String,
}

impl BookerClient {
    /// Create a client for `base_url` (e.g. `https://automationintesting.online/api`)
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent("booker-verify")
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> Result<RequestBuilder> {
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            let cookie = HeaderValue::from_str(&format!("token={}", token)).map_err(|e| {
                Error::InvalidInput(format!("token is not a valid cookie value: {}", e))
            })?;
            builder = builder.header(COOKIE, cookie);
        }

        Ok(builder)
    }

    /// Send a request and decode whatever body comes back
    ///
    /// Never fails on status; the caller inspects [`RawResponse::status`].
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<RawResponse> {
        let mut builder = self.request(method.clone(), path, token)?;
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(%method, path, "Sending request");
        let response = builder.send().await?;
        decode_raw(response).await
    }

    async fn call<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.request(method, path, token)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::api_status(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::UnexpectedResponse(format!("{} (body: {})", e, truncate(&text, 200)))
        })
    }

    /// Log in and return the session token
    pub async fn login(&self, request: &LoginRequest) -> Result<String> {
        let response: TokenResponse = self
            .call(Method::POST, AUTH_LOGIN_ENDPOINT, Some(request), None)
            .await?;

        match response.token {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(Error::UnexpectedResponse(
                "login succeeded without a token".to_string(),
            )),
        }
    }

    /// Ask the service whether a token is still valid
    pub async fn validate(&self, token: &str) -> Result<bool> {
        let body = serde_json::json!({ "token": token });
        let response: ValidateResponse = self
            .call(Method::POST, AUTH_VALIDATE_ENDPOINT, Some(&body), None)
            .await?;
        Ok(response.valid)
    }

    /// All bookings for a room
    pub async fn bookings(&self, token: &str, room_id: i64) -> Result<Vec<Booking>> {
        let path = format!("{}?roomid={}", BOOKING_ENDPOINT, room_id);
        let list: BookingList = self
            .call::<Value, _>(Method::GET, &path, None, Some(token))
            .await?;
        Ok(list.bookings)
    }

    /// A booking looked up in its room's listing; `None` if not listed yet
    pub async fn find_booking(
        &self,
        token: &str,
        room_id: i64,
        booking_id: i64,
    ) -> Result<Option<Booking>> {
        let bookings = self.bookings(token, room_id).await?;
        Ok(Booking::find_in(&bookings, booking_id).cloned())
    }

    pub async fn booking(&self, token: &str, booking_id: i64) -> Result<Booking> {
        let path = format!("{}/{}", BOOKING_ENDPOINT, booking_id);
        self.call::<Value, _>(Method::GET, &path, None, Some(token))
            .await
    }

    /// Create a booking and return the id the service assigned, if it
    /// reported one
    pub async fn create_booking(&self, token: &str, booking: &Booking) -> Result<Option<i64>> {
        let created: CreatedBooking = self
            .call(Method::POST, BOOKING_ENDPOINT, Some(booking), Some(token))
            .await?;
        Ok(created.bookingid)
    }

    /// Delete a booking; returns the service's `success` flag
    ///
    /// The listing may keep showing the booking for a while. Wait for it to
    /// go away by polling [`find_booking`](Self::find_booking) until it
    /// returns `None`.
    pub async fn delete_booking(&self, token: &str, booking_id: i64) -> Result<bool> {
        let path = format!("{}/{}", BOOKING_ENDPOINT, booking_id);
        let response: SuccessResponse = self
            .call::<Value, _>(Method::DELETE, &path, None, Some(token))
            .await?;
        Ok(response.success)
    }

    /// Replace a booking; returns the service's `success` flag
    pub async fn update_booking(&self, token: &str, booking: &Booking) -> Result<bool> {
        let booking_id = booking.bookingid.ok_or_else(|| {
            Error::InvalidInput("cannot update a booking without a bookingid".to_string())
        })?;
        let path = format!("{}/{}", BOOKING_ENDPOINT, booking_id);
        let response: SuccessResponse = self
            .call(Method::PUT, &path, Some(booking), Some(token))
            .await?;
        Ok(response.success)
    }

    pub async fn branding(&self) -> Result<Branding> {
        self.call::<Value, _>(Method::GET, BRANDING_ENDPOINT, None, None)
            .await
    }

    /// Replace the branding; returns the service's `success` flag
    pub async fn update_branding(&self, token: &str, branding: &Branding) -> Result<bool> {
        let response: SuccessResponse = self
            .call(Method::PUT, BRANDING_ENDPOINT, Some(branding), Some(token))
            .await?;
        Ok(response.success)
    }

    pub async fn messages(&self) -> Result<Vec<MessageSummary>> {
        let list: MessageList = self
            .call::<Value, _>(Method::GET, MESSAGE_ENDPOINT, None, None)
            .await?;
        Ok(list.messages)
    }

    pub async fn message(&self, message_id: i64) -> Result<Message> {
        let path = format!("{}/{}", MESSAGE_ENDPOINT, message_id);
        self.call::<Value, _>(Method::GET, &path, None, None)
            .await
    }
}

async fn decode_raw(response: Response) -> Result<RawResponse> {
    let status = response.status().as_u16();
    let text = response.text().await?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    Ok(RawResponse { status, body })
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client =
            BookerClient::new("http://localhost:3000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(client.url("/booking"), "http://localhost:3000/api/booking");
        assert_eq!(client.url("branding"), "http://localhost:3000/api/branding");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
