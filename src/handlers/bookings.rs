use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Booking, BookingRequest};
use crate::services::booking;
use crate::state::AppState;

use super::local_now;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let db = state.db()?;
    let booking = booking::place_booking(&db, &request, local_now())?;
    Ok((StatusCode::CREATED, Json(booking)))
}
