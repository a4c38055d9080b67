use serde::{Deserialize, Serialize};

use crate::models::selection::parse_duration_minutes;

/// A single bookable treatment on a salon's menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalonService {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub price: f64,
    /// Human-readable, e.g. "45 min".
    pub duration: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSalonService {
    pub name: String,
    pub price: f64,
    pub duration: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl NewSalonService {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("service name cannot be empty".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("invalid service price: {}", self.price));
        }
        if parse_duration_minutes(&self.duration).is_none() {
            return Err(format!(
                "duration must start with a number of minutes: {:?}",
                self.duration
            ));
        }
        Ok(())
    }
}
