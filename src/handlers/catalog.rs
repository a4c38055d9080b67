use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Salon, SalonService, ServicePackage, TimeSlot};
use crate::services::catalog::{self, Catalog};
use crate::services::format::format_price;
use crate::services::slots;
use crate::state::AppState;

use super::local_now;

// GET /api/salons/:salon_id/catalog
#[derive(Serialize)]
pub struct CatalogResponse {
    pub salon: Salon,
    pub services: Vec<SalonService>,
    pub packages: Vec<PackageView>,
}

impl From<Catalog> for CatalogResponse {
    fn from(catalog: Catalog) -> Self {
        Self {
            salon: catalog.salon,
            services: catalog.services,
            packages: catalog.packages.into_iter().map(PackageView::from).collect(),
        }
    }
}

pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Path(salon_id): Path<String>,
) -> Result<Json<CatalogResponse>, AppError> {
    let db = state.db()?;
    let catalog = catalog::load_catalog(&db, &salon_id, &local_now())?
        .ok_or_else(|| AppError::NotFound(format!("salon {salon_id}")))?;
    Ok(Json(catalog.into()))
}

// GET /api/salons/:salon_id/slots?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path(salon_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let db = state.db()?;
    let salon = queries::get_salon(&db, &salon_id)?
        .ok_or_else(|| AppError::NotFound(format!("salon {salon_id}")))?;
    let slots = slots::slots_for_date(&db, &salon, query.date, &local_now())?;
    Ok(Json(slots))
}

// GET /api/packages/:id
#[derive(Serialize)]
pub struct PackageView {
    #[serde(flatten)]
    pub package: ServicePackage,
    pub savings_amount: f64,
    pub price_label: String,
    pub original_price_label: String,
    pub savings_label: String,
    pub duration_label: String,
}

impl From<ServicePackage> for PackageView {
    fn from(package: ServicePackage) -> Self {
        let savings = package.savings_amount();
        Self {
            savings_amount: savings,
            price_label: format_price(package.package_price),
            original_price_label: format_price(package.original_price),
            savings_label: format_price(savings),
            duration_label: package.duration_label(),
            package,
        }
    }
}

pub async fn get_package(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PackageView>, AppError> {
    let db = state.db()?;
    let package = queries::get_package_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("package {id}")))?;
    Ok(Json(package.into()))
}
