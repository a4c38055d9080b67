//! Server-side booking placement.
//!
//! The storefront already gates submission, but nothing here trusts that:
//! the gate is checked again, every item is resolved against the live catalog,
//! and prices come from the catalog rather than from the request.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    BookedItem, Booking, BookingRequest, BookingStatus, ItemKind, Selection, TimeSlot,
};
use crate::services::booking_flow::{missing_requirements, Requirement};
use crate::services::catalog::{self, Catalog};
use crate::services::format::parse_12_hour;
use crate::services::slots;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("booking is incomplete, missing: {}", join_requirements(.0))]
    Incomplete(Vec<Requirement>),

    #[error("item {0} appears more than once")]
    DuplicateItem(String),

    #[error("quantity for item {0} must be at least 1")]
    ZeroQuantity(String),

    #[error("quantity {quantity} for item {id} exceeds the limit of {max}")]
    QuantityTooLarge { id: String, quantity: u32, max: u32 },

    #[error("{kind} {id} is not bookable at this salon for the requested time")]
    UnknownItem { kind: &'static str, id: String },

    #[error("cannot book {0}, the date has passed")]
    PastDate(NaiveDate),

    #[error("{0} is not one of the salon's time slots")]
    UnknownSlot(String),

    #[error("time slot {0} is no longer available")]
    SlotUnavailable(String),

    #[error("package {package_id} is fully booked on {date}")]
    PackageFullyBooked { package_id: String, date: NaiveDate },
}

/// Upper bound on the quantity of a single line item.
pub const MAX_ITEM_QUANTITY: u32 = 99;

fn join_requirements(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(Requirement::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Turns the requested ids into a priced selection using catalog data.
pub fn resolve_items(
    request: &BookingRequest,
    catalog: &Catalog,
) -> Result<Selection, BookingError> {
    let mut selection = Selection::new();
    for requested in &request.items {
        if requested.quantity == 0 {
            return Err(BookingError::ZeroQuantity(requested.id.clone()));
        }
        if requested.quantity > MAX_ITEM_QUANTITY {
            return Err(BookingError::QuantityTooLarge {
                id: requested.id.clone(),
                quantity: requested.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if selection.contains(&requested.id) {
            return Err(BookingError::DuplicateItem(requested.id.clone()));
        }
        let item = catalog
            .find_item(requested.kind, &requested.id)
            .ok_or_else(|| BookingError::UnknownItem {
                kind: requested.kind.as_str(),
                id: requested.id.clone(),
            })?;
        selection.toggle(item);
        selection.set_quantity(&requested.id, requested.quantity);
    }
    Ok(selection)
}

pub fn check_slot(time: &str, slots: &[TimeSlot]) -> Result<String, BookingError> {
    match slots.iter().find(|s| s.time == time) {
        Some(slot) if slot.available => Ok(slot.time.clone()),
        Some(slot) => Err(BookingError::SlotUnavailable(slot.time.clone())),
        None => Err(BookingError::UnknownSlot(time.to_string())),
    }
}

pub fn place_booking(
    conn: &Connection,
    request: &BookingRequest,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    let requested_slot = request
        .time_slot
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let missing = missing_requirements(
        !request.items.is_empty(),
        requested_slot.is_some(),
        &request.customer,
    );
    if !missing.is_empty() {
        return Err(BookingError::Incomplete(missing).into());
    }
    if request.date < now.date() {
        return Err(BookingError::PastDate(request.date).into());
    }

    let salon = queries::get_salon(conn, &request.salon_id)?
        .ok_or_else(|| AppError::NotFound(format!("salon {}", request.salon_id)))?;

    let slots = slots::slots_for_date(conn, &salon, request.date, &now)?;
    let time_slot = check_slot(requested_slot.unwrap_or_default(), &slots)?;
    let slot_start = parse_12_hour(&time_slot)
        .ok_or_else(|| anyhow::anyhow!("generated slot label {time_slot:?} is not a time"))?;

    // Package validity windows apply to the appointment, not to the moment of booking.
    let starts_at = request.date.and_time(slot_start);
    let catalog = catalog::load_catalog(conn, &request.salon_id, &starts_at)?
        .ok_or_else(|| AppError::NotFound(format!("salon {}", request.salon_id)))?;

    let selection = resolve_items(request, &catalog)?;

    for item in selection.items().iter().filter(|i| i.kind == ItemKind::Package) {
        let Some(package) = catalog.package(&item.id) else {
            continue;
        };
        let booked = queries::count_package_bookings_on(conn, &package.id, &request.date)?;
        if booked.saturating_add(item.quantity) > package.max_bookings_per_day {
            tracing::info!(
                package = %package.id,
                date = %request.date,
                booked,
                requested = item.quantity,
                max = package.max_bookings_per_day,
                "package at daily capacity"
            );
            return Err(BookingError::PackageFullyBooked {
                package_id: package.id.clone(),
                date: request.date,
            }
            .into());
        }
    }

    let totals = selection.totals();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        salon_id: request.salon_id.clone(),
        customer_name: request.customer.name.trim().to_string(),
        customer_phone: request.customer.phone.trim().to_string(),
        customer_email: request.customer.email.clone(),
        notes: request.customer.notes.clone(),
        date: request.date,
        time_slot,
        items: selection
            .items()
            .iter()
            .map(|item| BookedItem {
                item_id: item.id.clone(),
                kind: item.kind,
                name: item.name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect(),
        total_price: totals.total_price,
        total_duration_minutes: totals.total_duration_minutes,
        status: BookingStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    queries::create_booking(conn, &booking)?;

    tracing::info!(
        booking = %booking.id,
        salon = %booking.salon_id,
        date = %booking.date,
        slot = %booking.time_slot,
        total_price = booking.total_price,
        "booking placed"
    );

    Ok(booking)
}
