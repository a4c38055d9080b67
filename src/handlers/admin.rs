use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingStatus, NewSalon, NewSalonService, NewServicePackage, PackageItem,
    PackageUpdate, Salon, SalonService, ServicePackage,
};
use crate::services::format::format_price;
use crate::services::pricing;
use crate::state::AppState;

use super::local_now;

const DEFAULT_BOOKINGS_LIMIT: i64 = 50;
const MAX_BOOKINGS_LIMIT: i64 = 500;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Every package item must name a service on the package's own salon menu.
fn check_package_items(
    conn: &Connection,
    salon_id: &str,
    items: &[PackageItem],
) -> Result<(), AppError> {
    let services = queries::get_services_for_salon(conn, salon_id, false)?;
    for item in items {
        if !services.iter().any(|s| s.id == item.service_id) {
            return Err(AppError::Validation(format!(
                "service {} does not belong to salon {salon_id}",
                item.service_id
            )));
        }
    }
    Ok(())
}

// POST /api/admin/salons
pub async fn create_salon(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<NewSalon>,
) -> Result<(StatusCode, Json<Salon>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    input.validate().map_err(AppError::Validation)?;

    let salon = Salon {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        city: input.city,
        opening_time: input.opening_time,
        closing_time: input.closing_time,
        slot_minutes: input.slot_minutes,
        created_at: local_now(),
    };

    let db = state.db()?;
    queries::create_salon(&db, &salon)?;
    tracing::info!(salon = %salon.id, name = %salon.name, "salon created");

    Ok((StatusCode::CREATED, Json(salon)))
}

// POST /api/admin/salons/:salon_id/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(salon_id): Path<String>,
    Json(input): Json<NewSalonService>,
) -> Result<(StatusCode, Json<SalonService>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    input.validate().map_err(AppError::Validation)?;

    let db = state.db()?;
    if queries::get_salon(&db, &salon_id)?.is_none() {
        return Err(AppError::NotFound(format!("salon {salon_id}")));
    }

    let service = SalonService {
        id: uuid::Uuid::new_v4().to_string(),
        salon_id,
        name: input.name.trim().to_string(),
        price: input.price,
        duration: input.duration.trim().to_string(),
        is_active: input.is_active,
    };
    queries::create_service(&db, &service)?;
    tracing::info!(service = %service.id, salon = %service.salon_id, "service created");

    Ok((StatusCode::CREATED, Json(service)))
}

// POST /api/admin/packages
pub async fn create_package(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(input): Json<NewServicePackage>,
) -> Result<(StatusCode, Json<ServicePackage>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    if queries::get_salon(&db, &input.salon_id)?.is_none() {
        return Err(AppError::NotFound(format!("salon {}", input.salon_id)));
    }
    check_package_items(&db, &input.salon_id, &input.services)?;

    let package =
        pricing::apply_creation_defaults(uuid::Uuid::new_v4().to_string(), input, local_now())?;
    queries::create_package(&db, &package)?;
    tracing::info!(
        package = %package.id,
        salon = %package.salon_id,
        discount = ?package.discount_percentage,
        "package created"
    );

    Ok((StatusCode::CREATED, Json(package)))
}

// PUT /api/admin/packages/:id
pub async fn update_package(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<PackageUpdate>,
) -> Result<Json<ServicePackage>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db()?;
    let mut package = queries::get_package_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("package {id}")))?;
    if let Some(ref items) = update.services {
        check_package_items(&db, &package.salon_id, items)?;
    }

    pricing::apply_update(&mut package, update, local_now())?;
    if !queries::update_package(&db, &package)? {
        return Err(AppError::NotFound(format!("package {id}")));
    }
    tracing::info!(package = %package.id, "package updated");

    Ok(Json(package))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    booking: Booking,
    total_price_label: String,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status_filter = match query.status.as_deref() {
        None | Some("") => None,
        Some(s @ ("pending" | "confirmed" | "cancelled")) => Some(s),
        Some(other) => {
            return Err(AppError::Validation(format!("unknown booking status: {other}")));
        }
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_BOOKINGS_LIMIT)
        .clamp(1, MAX_BOOKINGS_LIMIT);

    let bookings = {
        let db = state.db()?;
        queries::get_all_bookings(&db, status_filter, limit)?
    };

    let response = bookings
        .into_iter()
        .map(|booking| BookingResponse {
            total_price_label: format_price(booking.total_price),
            booking,
        })
        .collect();

    Ok(Json(response))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let updated = {
        let db = state.db()?;
        queries::update_booking_status(&db, &id, &BookingStatus::Cancelled)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("booking {id}")));
    }
    tracing::info!(booking = %id, "booking cancelled");
    Ok(Json(serde_json::json!({ "ok": true })))
}
