use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    BookedItem, Booking, BookingStatus, ItemKind, PackageCategory, Salon, SalonService,
    ServicePackage,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";

fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .with_context(|| format!("invalid stored timestamp: {s}"))
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).with_context(|| format!("invalid stored date: {s}"))
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT).with_context(|| format!("invalid stored time: {s}"))
}

// ── Salons ──

pub fn create_salon(conn: &Connection, salon: &Salon) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO salons (id, name, city, opening_time, closing_time, slot_minutes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            salon.id,
            salon.name,
            salon.city,
            salon.opening_time.format(TIME_FMT).to_string(),
            salon.closing_time.format(TIME_FMT).to_string(),
            salon.slot_minutes,
            fmt_datetime(&salon.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_salon(conn: &Connection, id: &str) -> anyhow::Result<Option<Salon>> {
    let row = conn
        .query_row(
            "SELECT id, name, city, opening_time, closing_time, slot_minutes, created_at
             FROM salons WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, name, city, opening, closing, slot_minutes, created_at)) => Ok(Some(Salon {
            id,
            name,
            city,
            opening_time: parse_time(&opening)?,
            closing_time: parse_time(&closing)?,
            slot_minutes,
            created_at: parse_datetime(&created_at)?,
        })),
        None => Ok(None),
    }
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &SalonService) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, salon_id, name, price, duration, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            service.id,
            service.salon_id,
            service.name,
            service.price,
            service.duration,
            service.is_active,
        ],
    )?;
    Ok(())
}

pub fn get_services_for_salon(
    conn: &Connection,
    salon_id: &str,
    active_only: bool,
) -> anyhow::Result<Vec<SalonService>> {
    let mut stmt = conn.prepare(
        "SELECT id, salon_id, name, price, duration, is_active
         FROM services WHERE salon_id = ?1 AND (is_active = 1 OR ?2 = 0)
         ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map(params![salon_id, active_only], |row| {
        Ok(SalonService {
            id: row.get(0)?,
            salon_id: row.get(1)?,
            name: row.get(2)?,
            price: row.get(3)?,
            duration: row.get(4)?,
            is_active: row.get(5)?,
        })
    })?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

// ── Service packages ──

const PACKAGE_COLUMNS: &str = "id, salon_id, name, description, services, package_price, original_price, \
     discount_percentage, total_duration, category, is_active, valid_from, valid_until, \
     max_bookings_per_day, available_employees, created_at, updated_at";

pub fn create_package(conn: &Connection, pkg: &ServicePackage) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO service_packages ({PACKAGE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        ),
        params![
            pkg.id,
            pkg.salon_id,
            pkg.name,
            pkg.description,
            serde_json::to_string(&pkg.services)?,
            pkg.package_price,
            pkg.original_price,
            pkg.discount_percentage,
            pkg.total_duration,
            pkg.category.as_str(),
            pkg.is_active,
            fmt_datetime(&pkg.valid_from),
            pkg.valid_until.as_ref().map(fmt_datetime),
            pkg.max_bookings_per_day,
            serde_json::to_string(&pkg.available_employees)?,
            fmt_datetime(&pkg.created_at),
            fmt_datetime(&pkg.updated_at),
        ],
    )?;
    Ok(())
}

/// Overwrites every mutable column of an existing package. The stored
/// discount is written back as-is.
pub fn update_package(conn: &Connection, pkg: &ServicePackage) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE service_packages SET
           name = ?2, description = ?3, services = ?4, package_price = ?5, original_price = ?6,
           discount_percentage = ?7, total_duration = ?8, category = ?9, is_active = ?10,
           valid_until = ?11, max_bookings_per_day = ?12, available_employees = ?13, updated_at = ?14
         WHERE id = ?1",
        params![
            pkg.id,
            pkg.name,
            pkg.description,
            serde_json::to_string(&pkg.services)?,
            pkg.package_price,
            pkg.original_price,
            pkg.discount_percentage,
            pkg.total_duration,
            pkg.category.as_str(),
            pkg.is_active,
            pkg.valid_until.as_ref().map(fmt_datetime),
            pkg.max_bookings_per_day,
            serde_json::to_string(&pkg.available_employees)?,
            fmt_datetime(&pkg.updated_at),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_package_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<ServicePackage>> {
    let result = conn
        .query_row(
            &format!("SELECT {PACKAGE_COLUMNS} FROM service_packages WHERE id = ?1"),
            params![id],
            |row| Ok(parse_package_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn get_packages_for_salon(
    conn: &Connection,
    salon_id: &str,
) -> anyhow::Result<Vec<ServicePackage>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PACKAGE_COLUMNS} FROM service_packages WHERE salon_id = ?1 ORDER BY created_at ASC, rowid ASC"
    ))?;

    let rows = stmt.query_map(params![salon_id], |row| Ok(parse_package_row(row)))?;

    let mut packages = vec![];
    for row in rows {
        packages.push(row??);
    }
    Ok(packages)
}

fn parse_package_row(row: &rusqlite::Row) -> anyhow::Result<ServicePackage> {
    let services_json: String = row.get(4)?;
    let category_str: String = row.get(9)?;
    let valid_from: String = row.get(11)?;
    let valid_until: Option<String> = row.get(12)?;
    let employees_json: String = row.get(14)?;
    let created_at: String = row.get(15)?;
    let updated_at: String = row.get(16)?;

    let category = PackageCategory::parse(&category_str)
        .with_context(|| format!("unknown package category: {category_str}"))?;

    Ok(ServicePackage {
        id: row.get(0)?,
        salon_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        services: serde_json::from_str(&services_json).context("invalid package services")?,
        package_price: row.get(5)?,
        original_price: row.get(6)?,
        discount_percentage: row.get(7)?,
        total_duration: row.get(8)?,
        category,
        is_active: row.get(10)?,
        valid_from: parse_datetime(&valid_from)?,
        valid_until: valid_until.as_deref().map(parse_datetime).transpose()?,
        max_bookings_per_day: row.get(13)?,
        available_employees: serde_json::from_str(&employees_json)
            .context("invalid package employees")?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO bookings (id, salon_id, customer_name, customer_phone, customer_email, notes, date, time_slot,
                               total_price, total_duration_minutes, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.salon_id,
            booking.customer_name,
            booking.customer_phone,
            booking.customer_email,
            booking.notes,
            booking.date.format(DATE_FMT).to_string(),
            booking.time_slot,
            booking.total_price,
            booking.total_duration_minutes,
            booking.status.as_str(),
            fmt_datetime(&booking.created_at),
            fmt_datetime(&booking.updated_at),
        ],
    )?;

    for (position, item) in booking.items.iter().enumerate() {
        tx.execute(
            "INSERT INTO booking_items (booking_id, position, item_id, kind, name, unit_price, quantity)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                booking.id,
                position as i64,
                item.item_id,
                item.kind.as_str(),
                item.name,
                item.unit_price,
                item.quantity,
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

const BOOKING_COLUMNS: &str = "id, salon_id, customer_name, customer_phone, customer_email, notes, date, time_slot, \
     total_price, total_duration_minutes, status, created_at, updated_at";

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    match result {
        Some(booking) => {
            let mut booking = booking?;
            booking.items = get_booking_items(conn, &booking.id)?;
            Ok(Some(booking))
        }
        None => Ok(None),
    }
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY date DESC, created_at DESC LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![status_filter, limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        let mut booking = row??;
        booking.items = get_booking_items(conn, &booking.id)?;
        bookings.push(booking);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_datetime(&Local::now().naive_local());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// Time-slot labels already held by non-cancelled bookings on `date`.
pub fn get_taken_slots(
    conn: &Connection,
    salon_id: &str,
    date: &NaiveDate,
) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT time_slot FROM bookings
         WHERE salon_id = ?1 AND date = ?2 AND status != 'cancelled'",
    )?;
    let rows = stmt.query_map(
        params![salon_id, date.format(DATE_FMT).to_string()],
        |row| row.get::<_, String>(0),
    )?;

    let mut taken = vec![];
    for row in rows {
        taken.push(row?);
    }
    Ok(taken)
}

/// Units of the package held by non-cancelled bookings on `date`. A booking
/// with quantity 3 holds three units.
pub fn count_package_bookings_on(
    conn: &Connection,
    package_id: &str,
    date: &NaiveDate,
) -> anyhow::Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COALESCE(SUM(i.quantity), 0) FROM bookings b
         JOIN booking_items i ON i.booking_id = b.id
         WHERE i.item_id = ?1 AND i.kind = 'package' AND b.date = ?2 AND b.status != 'cancelled'",
        params![package_id, date.format(DATE_FMT).to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn get_booking_items(conn: &Connection, booking_id: &str) -> anyhow::Result<Vec<BookedItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, kind, name, unit_price, quantity FROM booking_items
         WHERE booking_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![booking_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, u32>(4)?,
        ))
    })?;

    let mut items = vec![];
    for row in rows {
        let (item_id, kind, name, unit_price, quantity) = row?;
        let kind = ItemKind::parse(&kind).with_context(|| format!("unknown item kind: {kind}"))?;
        items.push(BookedItem {
            item_id,
            kind,
            name,
            unit_price,
            quantity,
        });
    }
    Ok(items)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(6)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Booking {
        id: row.get(0)?,
        salon_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_phone: row.get(3)?,
        customer_email: row.get(4)?,
        notes: row.get(5)?,
        date: parse_date(&date_str)?,
        time_slot: row.get(7)?,
        items: vec![],
        total_price: row.get(8)?,
        total_duration_minutes: row.get(9)?,
        status: BookingStatus::parse(&status_str),
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::PackageItem;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        create_salon(
            &conn,
            &Salon {
                id: "salon-1".to_string(),
                name: "Glow Studio".to_string(),
                city: Some("Pune".to_string()),
                opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                closing_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
                slot_minutes: 60,
                created_at: dt("2025-06-01 08:00"),
            },
        )
        .unwrap();
        conn
    }

    fn package(id: &str) -> ServicePackage {
        ServicePackage {
            id: id.to_string(),
            salon_id: "salon-1".to_string(),
            name: "Groom Deluxe".to_string(),
            description: Some("Cut, shave and facial".to_string()),
            services: vec![PackageItem {
                service_id: "svc-1".to_string(),
                quantity: 2,
            }],
            package_price: 799.0,
            original_price: 999.0,
            discount_percentage: Some(20),
            total_duration: 90,
            category: PackageCategory::GroomingPackage,
            is_active: true,
            valid_from: dt("2025-06-01 00:00"),
            valid_until: None,
            max_bookings_per_day: 10,
            available_employees: vec!["emp-1".to_string()],
            created_at: dt("2025-06-01 00:00"),
            updated_at: dt("2025-06-01 00:00"),
        }
    }

    fn booking(id: &str, slot: &str, items: Vec<BookedItem>) -> Booking {
        Booking {
            id: id.to_string(),
            salon_id: "salon-1".to_string(),
            customer_name: "Asha".to_string(),
            customer_phone: "+919800000000".to_string(),
            customer_email: None,
            notes: None,
            date: date("2025-06-16"),
            time_slot: slot.to_string(),
            items,
            total_price: 799.0,
            total_duration_minutes: 90,
            status: BookingStatus::Pending,
            created_at: dt("2025-06-10 12:00"),
            updated_at: dt("2025-06-10 12:00"),
        }
    }

    fn package_item(id: &str) -> BookedItem {
        BookedItem {
            item_id: id.to_string(),
            kind: ItemKind::Package,
            name: "Groom Deluxe".to_string(),
            unit_price: 799.0,
            quantity: 1,
        }
    }

    #[test]
    fn test_salon_round_trip() {
        let conn = setup_db();
        let salon = get_salon(&conn, "salon-1").unwrap().unwrap();
        assert_eq!(salon.name, "Glow Studio");
        assert_eq!(salon.opening_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(get_salon(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_services_active_filter() {
        let conn = setup_db();
        for (id, active) in [("svc-1", true), ("svc-2", false)] {
            create_service(
                &conn,
                &SalonService {
                    id: id.to_string(),
                    salon_id: "salon-1".to_string(),
                    name: format!("Service {id}"),
                    price: 199.0,
                    duration: "30 min".to_string(),
                    is_active: active,
                },
            )
            .unwrap();
        }

        assert_eq!(get_services_for_salon(&conn, "salon-1", true).unwrap().len(), 1);
        assert_eq!(get_services_for_salon(&conn, "salon-1", false).unwrap().len(), 2);
    }

    #[test]
    fn test_package_round_trip() {
        let conn = setup_db();
        let pkg = package("pkg-1");
        create_package(&conn, &pkg).unwrap();

        let loaded = get_package_by_id(&conn, "pkg-1").unwrap().unwrap();
        assert_eq!(loaded, pkg);
        assert_eq!(get_packages_for_salon(&conn, "salon-1").unwrap().len(), 1);
    }

    #[test]
    fn test_package_without_discount_round_trip() {
        let conn = setup_db();
        let mut pkg = package("pkg-free");
        pkg.original_price = 0.0;
        pkg.package_price = 0.0;
        pkg.discount_percentage = None;
        pkg.valid_until = Some(dt("2025-12-31 23:59"));
        create_package(&conn, &pkg).unwrap();

        let loaded = get_package_by_id(&conn, "pkg-free").unwrap().unwrap();
        assert_eq!(loaded.discount_percentage, None);
        assert_eq!(loaded.valid_until, pkg.valid_until);
    }

    #[test]
    fn test_update_package() {
        let conn = setup_db();
        let mut pkg = package("pkg-1");
        create_package(&conn, &pkg).unwrap();

        pkg.package_price = 699.0;
        pkg.is_active = false;
        assert!(update_package(&conn, &pkg).unwrap());

        let loaded = get_package_by_id(&conn, "pkg-1").unwrap().unwrap();
        assert_eq!(loaded.package_price, 699.0);
        assert!(!loaded.is_active);
        assert_eq!(loaded.discount_percentage, Some(20));

        assert!(!update_package(&conn, &package("missing")).unwrap());
    }

    #[test]
    fn test_booking_round_trip_with_items() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "9:00 AM", vec![package_item("pkg-1")])).unwrap();

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.items, vec![package_item("pkg-1")]);
        assert_eq!(loaded.date, date("2025-06-16"));
        assert_eq!(loaded.status, BookingStatus::Pending);
    }

    #[test]
    fn test_taken_slots_ignore_cancelled() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "9:00 AM", vec![])).unwrap();
        create_booking(&conn, &booking("b2", "10:00 AM", vec![])).unwrap();
        update_booking_status(&conn, "b2", &BookingStatus::Cancelled).unwrap();

        let taken = get_taken_slots(&conn, "salon-1", &date("2025-06-16")).unwrap();
        assert_eq!(taken, vec!["9:00 AM".to_string()]);
        assert!(get_taken_slots(&conn, "salon-1", &date("2025-06-17")).unwrap().is_empty());
    }

    #[test]
    fn test_count_package_bookings() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "9:00 AM", vec![package_item("pkg-1")])).unwrap();
        create_booking(&conn, &booking("b2", "10:00 AM", vec![package_item("pkg-1")])).unwrap();
        create_booking(&conn, &booking("b3", "11:00 AM", vec![package_item("pkg-2")])).unwrap();
        update_booking_status(&conn, "b2", &BookingStatus::Cancelled).unwrap();

        let count = count_package_bookings_on(&conn, "pkg-1", &date("2025-06-16")).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_count_package_bookings_sums_quantity() {
        let conn = setup_db();
        let mut triple = package_item("pkg-1");
        triple.quantity = 3;
        create_booking(&conn, &booking("b1", "9:00 AM", vec![triple])).unwrap();
        create_booking(&conn, &booking("b2", "10:00 AM", vec![package_item("pkg-1")])).unwrap();

        let count = count_package_bookings_on(&conn, "pkg-1", &date("2025-06-16")).unwrap();
        assert_eq!(count, 4);
        let none = count_package_bookings_on(&conn, "pkg-1", &date("2025-06-17")).unwrap();
        assert_eq!(none, 0);
    }

    #[test]
    fn test_all_bookings_status_filter() {
        let conn = setup_db();
        create_booking(&conn, &booking("b1", "9:00 AM", vec![])).unwrap();
        create_booking(&conn, &booking("b2", "10:00 AM", vec![])).unwrap();
        update_booking_status(&conn, "b2", &BookingStatus::Cancelled).unwrap();

        assert_eq!(get_all_bookings(&conn, None, 50).unwrap().len(), 2);
        let cancelled = get_all_bookings(&conn, Some("cancelled"), 50).unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, "b2");
    }
}
