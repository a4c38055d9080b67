use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Salon {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_minutes: u32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSalon {
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_opening")]
    pub opening_time: NaiveTime,
    #[serde(default = "default_closing")]
    pub closing_time: NaiveTime,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
}

fn default_opening() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_closing() -> NaiveTime {
    NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_slot_minutes() -> u32 {
    60
}

impl NewSalon {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("salon name cannot be empty".to_string());
        }
        if self.slot_minutes == 0 {
            return Err("slot_minutes must be positive".to_string());
        }
        if self.opening_time >= self.closing_time {
            return Err(format!(
                "opening time {} must be before closing time {}",
                self.opening_time, self.closing_time
            ));
        }
        Ok(())
    }
}
