use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::services::pricing;

pub const DEFAULT_MAX_BOOKINGS_PER_DAY: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PackageCategory {
    #[serde(rename = "Hair & Beard")]
    HairAndBeard,
    #[serde(rename = "Facial & Skincare")]
    FacialAndSkincare,
    #[serde(rename = "Body Care")]
    BodyCare,
    #[serde(rename = "Grooming Package")]
    GroomingPackage,
    #[serde(rename = "Premium Package")]
    PremiumPackage,
}

impl PackageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageCategory::HairAndBeard => "Hair & Beard",
            PackageCategory::FacialAndSkincare => "Facial & Skincare",
            PackageCategory::BodyCare => "Body Care",
            PackageCategory::GroomingPackage => "Grooming Package",
            PackageCategory::PremiumPackage => "Premium Package",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Hair & Beard" => Some(PackageCategory::HairAndBeard),
            "Facial & Skincare" => Some(PackageCategory::FacialAndSkincare),
            "Body Care" => Some(PackageCategory::BodyCare),
            "Grooming Package" => Some(PackageCategory::GroomingPackage),
            "Premium Package" => Some(PackageCategory::PremiumPackage),
            _ => None,
        }
    }
}

fn default_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// One constituent service of a package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageItem {
    pub service_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// A salon's sellable bundle of services.
///
/// `discount_percentage` is derived once when the package is created and is
/// left alone by later price edits. `savings_amount` is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServicePackage {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub description: Option<String>,
    pub services: Vec<PackageItem>,
    pub package_price: f64,
    pub original_price: f64,
    pub discount_percentage: Option<u8>,
    pub total_duration: u32,
    pub category: PackageCategory,
    pub is_active: bool,
    pub valid_from: NaiveDateTime,
    pub valid_until: Option<NaiveDateTime>,
    pub max_bookings_per_day: u32,
    pub available_employees: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ServicePackage {
    pub fn savings_amount(&self) -> f64 {
        pricing::savings_amount(self.original_price, self.package_price)
    }

    /// Active and inside its validity window at `now`.
    pub fn is_bookable_at(&self, now: &NaiveDateTime) -> bool {
        self.is_active
            && self.valid_from <= *now
            && self.valid_until.map(|until| *now <= until).unwrap_or(true)
    }

    pub fn duration_label(&self) -> String {
        format!("{} min", self.total_duration)
    }
}

/// Creation payload for a package, as posted by a salon owner.
#[derive(Debug, Clone, Deserialize)]
pub struct NewServicePackage {
    pub salon_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub services: Vec<PackageItem>,
    pub package_price: f64,
    pub original_price: f64,
    #[serde(default)]
    pub discount_percentage: Option<u8>,
    pub total_duration: u32,
    pub category: PackageCategory,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub valid_from: Option<NaiveDateTime>,
    #[serde(default)]
    pub valid_until: Option<NaiveDateTime>,
    #[serde(default)]
    pub max_bookings_per_day: Option<u32>,
    #[serde(default)]
    pub available_employees: Vec<String>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial edit of an existing package. Absent fields are left untouched;
/// `"valid_until": null` reopens the package indefinitely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub services: Option<Vec<PackageItem>>,
    pub package_price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percentage: Option<u8>,
    pub total_duration: Option<u32>,
    pub category: Option<PackageCategory>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub valid_until: Option<Option<NaiveDateTime>>,
    pub max_bookings_per_day: Option<u32>,
    pub available_employees: Option<Vec<String>>,
}
