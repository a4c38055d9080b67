//! Package pricing rules.
//!
//! The discount shown on a package is derived from its two prices exactly once,
//! when the package is first stored, and only if the owner did not supply one.
//! Later edits to either price keep the stored discount as it was.

use chrono::NaiveDateTime;

use crate::models::service_package::DEFAULT_MAX_BOOKINGS_PER_DAY;
use crate::models::{NewServicePackage, PackageItem, PackageUpdate, ServicePackage};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("package price {package_price} exceeds original price {original_price}")]
    PackageAboveOriginal {
        package_price: f64,
        original_price: f64,
    },

    #[error("discount percentage must be between 0 and 100 (got {0})")]
    DiscountOutOfRange(u8),

    #[error("quantity for service {0} must be at least 1")]
    ZeroQuantity(String),

    #[error("package name cannot be empty")]
    EmptyName,

    #[error("valid_until {valid_until} is before valid_from {valid_from}")]
    InvertedWindow {
        valid_from: NaiveDateTime,
        valid_until: NaiveDateTime,
    },
}

/// `round((original - package) / original * 100)`, or `None` for a zero original price.
pub fn discount_percentage(original_price: f64, package_price: f64) -> Option<u8> {
    if original_price == 0.0 {
        return None;
    }
    let pct = ((original_price - package_price) / original_price * 100.0).round();
    Some(pct.clamp(0.0, 100.0) as u8)
}

pub fn savings_amount(original_price: f64, package_price: f64) -> f64 {
    original_price - package_price
}

pub fn validate_prices(original_price: f64, package_price: f64) -> Result<(), PricingError> {
    check_amount("original_price", original_price)?;
    check_amount("package_price", package_price)?;
    if package_price > original_price {
        return Err(PricingError::PackageAboveOriginal {
            package_price,
            original_price,
        });
    }
    Ok(())
}

pub fn validate_discount(pct: u8) -> Result<(), PricingError> {
    if pct > 100 {
        return Err(PricingError::DiscountOutOfRange(pct));
    }
    Ok(())
}

fn check_amount(field: &'static str, value: f64) -> Result<(), PricingError> {
    if !value.is_finite() {
        return Err(PricingError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(PricingError::Negative { field, value });
    }
    Ok(())
}

fn validate_items(items: &[PackageItem]) -> Result<(), PricingError> {
    match items.iter().find(|i| i.quantity == 0) {
        Some(item) => Err(PricingError::ZeroQuantity(item.service_id.clone())),
        None => Ok(()),
    }
}

fn validate_window(
    valid_from: NaiveDateTime,
    valid_until: Option<NaiveDateTime>,
) -> Result<(), PricingError> {
    match valid_until {
        Some(until) if until < valid_from => Err(PricingError::InvertedWindow {
            valid_from,
            valid_until: until,
        }),
        _ => Ok(()),
    }
}

fn dedup_employees(employees: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(employees.len());
    for employee in employees {
        if !seen.contains(&employee) {
            seen.push(employee);
        }
    }
    seen
}

/// Builds a stored package from a creation payload, filling defaults and
/// deriving the discount when the owner left it out.
pub fn apply_creation_defaults(
    id: String,
    input: NewServicePackage,
    now: NaiveDateTime,
) -> Result<ServicePackage, PricingError> {
    if input.name.trim().is_empty() {
        return Err(PricingError::EmptyName);
    }
    validate_prices(input.original_price, input.package_price)?;
    validate_items(&input.services)?;

    let discount = match input.discount_percentage {
        Some(pct) => {
            validate_discount(pct)?;
            Some(pct)
        }
        None => discount_percentage(input.original_price, input.package_price),
    };

    let valid_from = input.valid_from.unwrap_or(now);
    validate_window(valid_from, input.valid_until)?;

    Ok(ServicePackage {
        id,
        salon_id: input.salon_id,
        name: input.name.trim().to_string(),
        description: input.description,
        services: input.services,
        package_price: input.package_price,
        original_price: input.original_price,
        discount_percentage: discount,
        total_duration: input.total_duration,
        category: input.category,
        is_active: input.is_active,
        valid_from,
        valid_until: input.valid_until,
        max_bookings_per_day: input
            .max_bookings_per_day
            .unwrap_or(DEFAULT_MAX_BOOKINGS_PER_DAY),
        available_employees: dedup_employees(input.available_employees),
        created_at: now,
        updated_at: now,
    })
}

/// Applies an edit in place. Price changes never recompute the stored discount;
/// only an explicit `discount_percentage` in the update changes it.
pub fn apply_update(
    package: &mut ServicePackage,
    update: PackageUpdate,
    now: NaiveDateTime,
) -> Result<(), PricingError> {
    let original_price = update.original_price.unwrap_or(package.original_price);
    let package_price = update.package_price.unwrap_or(package.package_price);
    validate_prices(original_price, package_price)?;

    if let Some(pct) = update.discount_percentage {
        validate_discount(pct)?;
    }
    if let Some(ref items) = update.services {
        validate_items(items)?;
    }
    if let Some(ref name) = update.name {
        if name.trim().is_empty() {
            return Err(PricingError::EmptyName);
        }
    }
    let valid_until = update.valid_until.unwrap_or(package.valid_until);
    validate_window(package.valid_from, valid_until)?;

    package.original_price = original_price;
    package.package_price = package_price;
    package.valid_until = valid_until;
    if let Some(pct) = update.discount_percentage {
        package.discount_percentage = Some(pct);
    }
    if let Some(name) = update.name {
        package.name = name.trim().to_string();
    }
    if let Some(description) = update.description {
        package.description = Some(description);
    }
    if let Some(items) = update.services {
        package.services = items;
    }
    if let Some(total_duration) = update.total_duration {
        package.total_duration = total_duration;
    }
    if let Some(category) = update.category {
        package.category = category;
    }
    if let Some(is_active) = update.is_active {
        package.is_active = is_active;
    }
    if let Some(max) = update.max_bookings_per_day {
        package.max_bookings_per_day = max;
    }
    if let Some(employees) = update.available_employees {
        package.available_employees = dedup_employees(employees);
    }
    package.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PackageCategory;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-06-16 10:00", "%Y-%m-%d %H:%M").unwrap()
    }

    fn new_package(original: f64, package: f64, discount: Option<u8>) -> NewServicePackage {
        NewServicePackage {
            salon_id: "salon-1".to_string(),
            name: "Bridal Glow".to_string(),
            description: None,
            services: vec![PackageItem {
                service_id: "svc-1".to_string(),
                quantity: 1,
            }],
            package_price: package,
            original_price: original,
            discount_percentage: discount,
            total_duration: 120,
            category: PackageCategory::FacialAndSkincare,
            is_active: true,
            valid_from: None,
            valid_until: None,
            max_bookings_per_day: None,
            available_employees: vec!["emp-1".to_string(), "emp-1".to_string()],
        }
    }

    #[test]
    fn test_discount_formula() {
        assert_eq!(discount_percentage(1000.0, 750.0), Some(25));
        assert_eq!(discount_percentage(999.0, 799.0), Some(20));
        assert_eq!(discount_percentage(300.0, 200.0), Some(33));
        assert_eq!(discount_percentage(300.0, 100.0), Some(67));
        assert_eq!(discount_percentage(500.0, 500.0), Some(0));
        assert_eq!(discount_percentage(500.0, 0.0), Some(100));
    }

    #[test]
    fn test_discount_rounds_half_up() {
        // 12.5% → 13
        assert_eq!(discount_percentage(200.0, 175.0), Some(13));
    }

    #[test]
    fn test_zero_original_price_leaves_discount_unset() {
        assert_eq!(discount_percentage(0.0, 0.0), None);
    }

    #[test]
    fn test_savings_amount() {
        assert_eq!(savings_amount(1000.0, 750.0), 250.0);
    }

    #[test]
    fn test_validate_prices_rejects_negative() {
        assert!(matches!(
            validate_prices(-1.0, 0.0),
            Err(PricingError::Negative { field: "original_price", .. })
        ));
        assert!(matches!(
            validate_prices(100.0, -5.0),
            Err(PricingError::Negative { field: "package_price", .. })
        ));
    }

    #[test]
    fn test_validate_prices_rejects_nan() {
        assert!(matches!(
            validate_prices(f64::NAN, 0.0),
            Err(PricingError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_validate_prices_rejects_package_above_original() {
        assert!(matches!(
            validate_prices(100.0, 150.0),
            Err(PricingError::PackageAboveOriginal { .. })
        ));
    }

    #[test]
    fn test_creation_derives_discount_when_absent() {
        let pkg = apply_creation_defaults("p1".to_string(), new_package(1000.0, 750.0, None), now())
            .unwrap();
        assert_eq!(pkg.discount_percentage, Some(25));
        assert_eq!(pkg.savings_amount(), 250.0);
    }

    #[test]
    fn test_creation_keeps_supplied_discount() {
        let pkg =
            apply_creation_defaults("p1".to_string(), new_package(1000.0, 750.0, Some(30)), now())
                .unwrap();
        assert_eq!(pkg.discount_percentage, Some(30));
    }

    #[test]
    fn test_creation_rejects_discount_over_100() {
        let result =
            apply_creation_defaults("p1".to_string(), new_package(1000.0, 750.0, Some(150)), now());
        assert_eq!(result.unwrap_err(), PricingError::DiscountOutOfRange(150));
    }

    #[test]
    fn test_creation_zero_original_price() {
        let pkg = apply_creation_defaults("p1".to_string(), new_package(0.0, 0.0, None), now())
            .unwrap();
        assert_eq!(pkg.discount_percentage, None);
    }

    #[test]
    fn test_creation_fills_defaults() {
        let pkg = apply_creation_defaults("p1".to_string(), new_package(1000.0, 750.0, None), now())
            .unwrap();
        assert_eq!(pkg.valid_from, now());
        assert_eq!(pkg.max_bookings_per_day, 10);
        assert_eq!(pkg.available_employees, vec!["emp-1".to_string()]);
    }

    #[test]
    fn test_creation_rejects_zero_quantity() {
        let mut input = new_package(1000.0, 750.0, None);
        input.services[0].quantity = 0;
        assert_eq!(
            apply_creation_defaults("p1".to_string(), input, now()).unwrap_err(),
            PricingError::ZeroQuantity("svc-1".to_string())
        );
    }

    #[test]
    fn test_creation_rejects_inverted_window() {
        let mut input = new_package(1000.0, 750.0, None);
        input.valid_until = Some(now() - chrono::Duration::days(1));
        assert!(matches!(
            apply_creation_defaults("p1".to_string(), input, now()),
            Err(PricingError::InvertedWindow { .. })
        ));
    }

    #[test]
    fn test_update_does_not_recompute_discount() {
        let mut pkg =
            apply_creation_defaults("p1".to_string(), new_package(1000.0, 750.0, None), now())
                .unwrap();
        let update = PackageUpdate {
            package_price: Some(500.0),
            ..Default::default()
        };
        apply_update(&mut pkg, update, now()).unwrap();
        assert_eq!(pkg.package_price, 500.0);
        assert_eq!(pkg.discount_percentage, Some(25));
        assert_eq!(pkg.savings_amount(), 500.0);
    }

    #[test]
    fn test_update_explicit_discount() {
        let mut pkg =
            apply_creation_defaults("p1".to_string(), new_package(1000.0, 750.0, None), now())
                .unwrap();
        let update = PackageUpdate {
            discount_percentage: Some(40),
            ..Default::default()
        };
        apply_update(&mut pkg, update, now()).unwrap();
        assert_eq!(pkg.discount_percentage, Some(40));
    }

    #[test]
    fn test_update_rejects_price_inversion_and_leaves_package_untouched() {
        let mut pkg =
            apply_creation_defaults("p1".to_string(), new_package(1000.0, 750.0, None), now())
                .unwrap();
        let before = pkg.clone();
        let update = PackageUpdate {
            original_price: Some(600.0),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(apply_update(&mut pkg, update, now()).is_err());
        assert_eq!(pkg, before);
    }

    #[test]
    fn test_update_can_clear_valid_until() {
        let mut input = new_package(1000.0, 750.0, None);
        input.valid_until = Some(now() + chrono::Duration::days(30));
        let mut pkg = apply_creation_defaults("p1".to_string(), input, now()).unwrap();

        apply_update(&mut pkg, PackageUpdate::default(), now()).unwrap();
        assert!(pkg.valid_until.is_some());

        let update = PackageUpdate {
            valid_until: Some(None),
            ..Default::default()
        };
        apply_update(&mut pkg, update, now()).unwrap();
        assert_eq!(pkg.valid_until, None);

        let until = now() + chrono::Duration::days(7);
        let update = PackageUpdate {
            valid_until: Some(Some(until)),
            ..Default::default()
        };
        apply_update(&mut pkg, update, now()).unwrap();
        assert_eq!(pkg.valid_until, Some(until));
    }
}
