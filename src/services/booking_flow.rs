//! Client-side booking flow: what the customer has picked so far and whether
//! the booking button may be enabled.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    BookingRequest, CustomerContact, RequestedItem, SelectedItem, Selection, SelectionTotals,
    SlotPicker, TimeSlot,
};

/// One precondition of the submission gate.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    ServiceSelected,
    SlotChosen,
    CustomerName,
    CustomerPhone,
}

impl Requirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Requirement::ServiceSelected => "at least one service",
            Requirement::SlotChosen => "a time slot",
            Requirement::CustomerName => "customer name",
            Requirement::CustomerPhone => "customer phone",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks every precondition of the gate and reports the ones not met.
pub fn missing_requirements(
    has_items: bool,
    slot_chosen: bool,
    contact: &CustomerContact,
) -> Vec<Requirement> {
    let mut missing = vec![];
    if !has_items {
        missing.push(Requirement::ServiceSelected);
    }
    if !slot_chosen {
        missing.push(Requirement::SlotChosen);
    }
    if contact.name.trim().is_empty() {
        missing.push(Requirement::CustomerName);
    }
    if contact.phone.trim().is_empty() {
        missing.push(Requirement::CustomerPhone);
    }
    missing
}

#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub selection: Selection,
    pub date: NaiveDate,
    pub slots: SlotPicker,
    pub contact: CustomerContact,
}

impl BookingDraft {
    pub fn new(date: NaiveDate, slots: Vec<TimeSlot>) -> Self {
        Self {
            selection: Selection::new(),
            date,
            slots: SlotPicker::new(slots),
            contact: CustomerContact::default(),
        }
    }

    pub fn toggle(&mut self, item: SelectedItem) -> bool {
        self.selection.toggle(item)
    }

    pub fn adjust_quantity(&mut self, id: &str, delta: i32) {
        self.selection.adjust_quantity(id, delta);
    }

    pub fn select_slot(&mut self, time: &str) -> bool {
        self.slots.select(time)
    }

    pub fn change_date(&mut self, date: NaiveDate, slots: Vec<TimeSlot>) {
        self.date = date;
        self.slots.replace_slots(slots);
    }

    pub fn totals(&self) -> SelectionTotals {
        self.selection.totals()
    }

    pub fn missing_requirements(&self) -> Vec<Requirement> {
        missing_requirements(
            !self.selection.is_empty(),
            self.slots.selected_time().is_some(),
            &self.contact,
        )
    }

    pub fn can_submit(&self) -> bool {
        self.missing_requirements().is_empty()
    }

    /// The payload to send, or `None` while the gate is closed.
    pub fn to_request(&self, salon_id: &str) -> Option<BookingRequest> {
        if !self.can_submit() {
            return None;
        }
        Some(BookingRequest {
            salon_id: salon_id.to_string(),
            items: self
                .selection
                .items()
                .iter()
                .map(|item| RequestedItem {
                    id: item.id.clone(),
                    kind: item.kind,
                    quantity: item.quantity,
                })
                .collect(),
            date: self.date,
            time_slot: self.slots.selected_time().map(str::to_string),
            customer: CustomerContact {
                name: self.contact.name.trim().to_string(),
                phone: self.contact.phone.trim().to_string(),
                email: self.contact.email.clone(),
                notes: self.contact.notes.clone(),
            },
        })
    }
}
