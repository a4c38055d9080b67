use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::ItemKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub salon_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    pub items: Vec<BookedItem>,
    pub total_price: f64,
    pub total_duration_minutes: u32,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Line item snapshot taken when the booking is placed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookedItem {
    pub item_id: String,
    pub kind: ItemKind,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestedItem {
    pub id: String,
    pub kind: ItemKind,
    pub quantity: u32,
}

/// Payload the storefront submits to place a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub salon_id: String,
    pub items: Vec<RequestedItem>,
    pub date: NaiveDate,
    pub time_slot: Option<String>,
    pub customer: CustomerContact,
}
