//! Typed client for the storefront HTTP API.
//!
//! The client never looks up credentials on its own: it is built with a
//! [`TokenProvider`] (normally a [`session::SessionContext`]) and asks it for
//! the bearer token on every request.

pub mod session;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::models::{Booking, BookingRequest, TimeSlot};
use crate::services::booking_flow::{BookingDraft, Requirement};
use crate::services::catalog::Catalog;

pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("booking cannot be submitted yet, missing: {0:?}")]
    Incomplete(Vec<Requirement>),
}

/// Catalog read and booking write, as the booking flow needs them.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn fetch_catalog(&self, salon_id: &str) -> Result<Catalog, ClientError>;

    async fn fetch_slots(&self, salon_id: &str, date: NaiveDate)
        -> Result<Vec<TimeSlot>, ClientError>;

    async fn submit_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError>;
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            tokens,
        }
    }

    /// Request builder for `path` with the current bearer token attached, if any.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match self.tokens.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let res = builder.send().await?;
        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            tracing::warn!(status = status.as_u16(), %message, "storefront API error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl StorefrontApi for ApiClient {
    async fn fetch_catalog(&self, salon_id: &str) -> Result<Catalog, ClientError> {
        let builder = self.request(Method::GET, &format!("/api/salons/{salon_id}/catalog"));
        Self::send_json(builder).await
    }

    async fn fetch_slots(
        &self,
        salon_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, ClientError> {
        let builder = self
            .request(Method::GET, &format!("/api/salons/{salon_id}/slots"))
            .query(&[("date", date.format("%Y-%m-%d").to_string())]);
        Self::send_json(builder).await
    }

    async fn submit_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError> {
        let builder = self.request(Method::POST, "/api/bookings").json(request);
        Self::send_json(builder).await
    }
}

/// Opens a draft for `date` with that day's slots.
pub async fn start_draft(
    api: &dyn StorefrontApi,
    salon_id: &str,
    date: NaiveDate,
) -> Result<BookingDraft, ClientError> {
    let slots = api.fetch_slots(salon_id, date).await?;
    Ok(BookingDraft::new(date, slots))
}

/// Sends the draft if the submission gate is open; otherwise nothing is sent.
pub async fn submit_draft(
    api: &dyn StorefrontApi,
    salon_id: &str,
    draft: &BookingDraft,
) -> Result<Booking, ClientError> {
    let request = draft
        .to_request(salon_id)
        .ok_or_else(|| ClientError::Incomplete(draft.missing_requirements()))?;
    api.submit_booking(&request).await
}
