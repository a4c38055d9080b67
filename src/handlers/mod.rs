pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod health;

use chrono::NaiveDateTime;

/// Wall-clock time at the salon. Slots and package validity windows are
/// expressed in local time.
pub(crate) fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
