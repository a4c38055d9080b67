use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::models::{ItemKind, Salon, SalonService, SelectedItem, ServicePackage};

/// What a customer can book at one salon right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub salon: Salon,
    pub services: Vec<SalonService>,
    pub packages: Vec<ServicePackage>,
}

impl Catalog {
    pub fn find_item(&self, kind: ItemKind, id: &str) -> Option<SelectedItem> {
        match kind {
            ItemKind::Service => self
                .services
                .iter()
                .find(|s| s.id == id)
                .map(SelectedItem::from_service),
            ItemKind::Package => self
                .packages
                .iter()
                .find(|p| p.id == id)
                .map(SelectedItem::from_package),
        }
    }

    pub fn package(&self, id: &str) -> Option<&ServicePackage> {
        self.packages.iter().find(|p| p.id == id)
    }
}

/// Active services plus packages that are active and inside their validity
/// window at `now`. `None` when the salon does not exist.
pub fn load_catalog(
    conn: &Connection,
    salon_id: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<Option<Catalog>> {
    let Some(salon) = queries::get_salon(conn, salon_id)? else {
        return Ok(None);
    };

    let services = queries::get_services_for_salon(conn, salon_id, true)?;
    let packages = queries::get_packages_for_salon(conn, salon_id)?
        .into_iter()
        .filter(|p| p.is_bookable_at(now))
        .collect();

    Ok(Some(Catalog {
        salon,
        services,
        packages,
    }))
}
