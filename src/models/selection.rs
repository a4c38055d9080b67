use serde::{Deserialize, Serialize};

use crate::models::{SalonService, ServicePackage};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Service,
    Package,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Service => "service",
            ItemKind::Package => "package",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "service" => Some(ItemKind::Service),
            "package" => Some(ItemKind::Package),
            _ => None,
        }
    }
}

/// A service or package the customer has picked, with its own quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedItem {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub unit_price: f64,
    pub duration: String,
    pub quantity: u32,
}

impl SelectedItem {
    pub fn from_service(service: &SalonService) -> Self {
        Self {
            id: service.id.clone(),
            kind: ItemKind::Service,
            name: service.name.clone(),
            unit_price: service.price,
            duration: service.duration.clone(),
            quantity: 1,
        }
    }

    pub fn from_package(package: &ServicePackage) -> Self {
        Self {
            id: package.id.clone(),
            kind: ItemKind::Package,
            name: package.name.clone(),
            unit_price: package.package_price,
            duration: package.duration_label(),
            quantity: 1,
        }
    }

    /// Minutes per unit; malformed durations count as zero.
    pub fn unit_minutes(&self) -> u32 {
        match parse_duration_minutes(&self.duration) {
            Some(minutes) => minutes,
            None => {
                tracing::warn!(
                    item = %self.id,
                    duration = %self.duration,
                    "unparseable duration, counting as 0 minutes"
                );
                0
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SelectionTotals {
    pub total_price: f64,
    pub total_duration_minutes: u32,
}

/// The customer's in-progress basket, keyed by item id.
///
/// Totals are always recomputed from the items; nothing is accumulated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Selection {
    items: Vec<SelectedItem>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SelectedItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&SelectedItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Removes the item if it is selected, otherwise adds it with quantity 1.
    /// Returns whether the item is selected afterwards.
    pub fn toggle(&mut self, mut item: SelectedItem) -> bool {
        if let Some(pos) = self.items.iter().position(|i| i.id == item.id) {
            self.items.remove(pos);
            false
        } else {
            item.quantity = 1;
            self.items.push(item);
            true
        }
    }

    /// Shifts an item's quantity by `delta`, never below 1. Unknown ids are ignored.
    pub fn adjust_quantity(&mut self, id: &str, delta: i32) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            let next = i64::from(item.quantity) + i64::from(delta);
            item.quantity = u32::try_from(next.max(1)).unwrap_or(u32::MAX);
        }
    }

    /// Sets an item's quantity outright, never below 1. Unknown ids are ignored.
    pub fn set_quantity(&mut self, id: &str, quantity: u32) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity.max(1);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn totals(&self) -> SelectionTotals {
        compute_totals(&self.items)
    }
}

/// Prices are summed as whole paise so the result does not depend on item order.
pub fn compute_totals(items: &[SelectedItem]) -> SelectionTotals {
    let mut paise: i64 = 0;
    let mut minutes: u32 = 0;
    for item in items {
        let unit_paise = (item.unit_price * 100.0).round() as i64;
        paise = paise.saturating_add(unit_paise.saturating_mul(i64::from(item.quantity)));
        minutes = minutes.saturating_add(item.unit_minutes().saturating_mul(item.quantity));
    }
    SelectionTotals {
        total_price: paise as f64 / 100.0,
        total_duration_minutes: minutes,
    }
}

/// Leading integer of a human duration such as "45 min".
pub fn parse_duration_minutes(s: &str) -> Option<u32> {
    let trimmed = s.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: f64, duration: &str) -> SelectedItem {
        SelectedItem {
            id: id.to_string(),
            kind: ItemKind::Service,
            name: format!("Service {id}"),
            unit_price: price,
            duration: duration.to_string(),
            quantity: 1,
        }
    }

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration_minutes("45 min"), Some(45));
        assert_eq!(parse_duration_minutes("120"), Some(120));
        assert_eq!(parse_duration_minutes("  30mins"), Some(30));
        assert_eq!(parse_duration_minutes("min 45"), None);
        assert_eq!(parse_duration_minutes(""), None);
        assert_eq!(parse_duration_minutes("-5 min"), None);
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut selection = Selection::new();
        assert!(selection.toggle(item("a", 299.0, "45 min")));
        assert!(selection.contains("a"));
        assert!(!selection.toggle(item("a", 299.0, "45 min")));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_reselect_resets_quantity() {
        let mut selection = Selection::new();
        selection.toggle(item("a", 299.0, "45 min"));
        selection.adjust_quantity("a", 2);
        assert_eq!(selection.get("a").unwrap().quantity, 3);

        selection.toggle(item("a", 299.0, "45 min"));
        selection.toggle(item("a", 299.0, "45 min"));
        assert_eq!(selection.get("a").unwrap().quantity, 1);
    }

    #[test]
    fn test_toggle_ignores_incoming_quantity() {
        let mut selection = Selection::new();
        let mut a = item("a", 100.0, "10 min");
        a.quantity = 7;
        selection.toggle(a);
        assert_eq!(selection.get("a").unwrap().quantity, 1);
    }

    #[test]
    fn test_same_name_different_ids_are_distinct() {
        let mut selection = Selection::new();
        let mut first = item("a", 100.0, "10 min");
        let mut second = item("b", 150.0, "15 min");
        first.name = "Haircut".to_string();
        second.name = "Haircut".to_string();
        selection.toggle(first);
        selection.toggle(second);
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_adjust_quantity_clamps_at_one() {
        let mut selection = Selection::new();
        selection.toggle(item("a", 100.0, "10 min"));
        selection.adjust_quantity("a", -5);
        assert_eq!(selection.get("a").unwrap().quantity, 1);
    }

    #[test]
    fn test_adjust_quantity_unknown_item_is_noop() {
        let mut selection = Selection::new();
        selection.toggle(item("a", 100.0, "10 min"));
        let before = selection.clone();
        selection.adjust_quantity("missing", 3);
        assert_eq!(selection, before);
    }

    #[test]
    fn test_totals_example() {
        let mut selection = Selection::new();
        selection.toggle(item("a", 299.0, "45 min"));
        selection.toggle(item("b", 199.0, "30 min"));
        selection.adjust_quantity("b", 1);

        let totals = selection.totals();
        assert_eq!(totals.total_price, 697.0);
        assert_eq!(totals.total_duration_minutes, 105);
    }

    #[test]
    fn test_totals_order_independent() {
        let mut a = item("a", 299.0, "45 min");
        let mut b = item("b", 199.0, "30 min");
        let c = item("c", 499.0, "60 min");
        a.quantity = 2;
        b.quantity = 3;

        let forward = compute_totals(&[a.clone(), b.clone(), c.clone()]);
        let reversed = compute_totals(&[c.clone(), b.clone(), a.clone()]);
        let shuffled = compute_totals(&[b, c, a]);
        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_fractional_totals_order_independent() {
        let a = item("a", 0.1, "10 min");
        let b = item("b", 0.2, "10 min");
        let c = item("c", 0.3, "10 min");

        let forward = compute_totals(&[a.clone(), b.clone(), c.clone()]);
        let reversed = compute_totals(&[c.clone(), b.clone(), a.clone()]);
        let shuffled = compute_totals(&[b, a, c]);
        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
        assert_eq!(forward.total_price, 0.6);
    }

    #[test]
    fn test_fractional_totals_with_quantity() {
        let mut a = item("a", 249.99, "45 min");
        a.quantity = 3;
        let b = item("b", 0.01, "5 min");
        assert_eq!(compute_totals(&[a, b]).total_price, 749.98);
    }

    #[test]
    fn test_set_quantity() {
        let mut selection = Selection::new();
        selection.toggle(item("a", 100.0, "10 min"));
        selection.set_quantity("a", 4_000_000_000);
        assert_eq!(selection.get("a").unwrap().quantity, 4_000_000_000);
        selection.set_quantity("a", 0);
        assert_eq!(selection.get("a").unwrap().quantity, 1);
        selection.set_quantity("missing", 5);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_totals_are_idempotent() {
        let mut selection = Selection::new();
        selection.toggle(item("a", 299.0, "45 min"));
        assert_eq!(selection.totals(), selection.totals());
    }

    #[test]
    fn test_malformed_duration_counts_as_zero() {
        let mut selection = Selection::new();
        selection.toggle(item("a", 299.0, "about an hour"));
        selection.toggle(item("b", 100.0, "20 min"));
        let totals = selection.totals();
        assert_eq!(totals.total_price, 399.0);
        assert_eq!(totals.total_duration_minutes, 20);
    }

    #[test]
    fn test_empty_selection_totals() {
        assert_eq!(Selection::new().totals(), SelectionTotals::default());
    }
}
