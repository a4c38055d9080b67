use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Salon, TimeSlot};
use crate::services::format::to_12_hour;

/// Fixed-length slots between opening and closing time on `date`.
///
/// A slot is unavailable when its label is already taken or when it starts
/// at or before `now`.
pub fn generate_slots(
    salon: &Salon,
    date: NaiveDate,
    taken: &[String],
    now: &NaiveDateTime,
) -> Vec<TimeSlot> {
    let mut slots = vec![];
    if salon.slot_minutes == 0 {
        return slots;
    }
    let step = Duration::minutes(i64::from(salon.slot_minutes));

    let mut start = salon.opening_time;
    loop {
        let (end, wrapped) = start.overflowing_add_signed(step);
        if wrapped != 0 || end > salon.closing_time {
            break;
        }
        let label = to_12_hour(start);
        let in_future = date.and_time(start) > *now;
        let available = in_future && !taken.iter().any(|t| *t == label);
        slots.push(TimeSlot::new(label, available));
        start = end;
    }
    slots
}

pub fn slots_for_date(
    conn: &Connection,
    salon: &Salon,
    date: NaiveDate,
    now: &NaiveDateTime,
) -> anyhow::Result<Vec<TimeSlot>> {
    let taken = queries::get_taken_slots(conn, &salon.id, &date)?;
    Ok(generate_slots(salon, date, &taken, now))
}
