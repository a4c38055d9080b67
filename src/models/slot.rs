use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub time: String,
    pub available: bool,
}

impl TimeSlot {
    pub fn new(time: impl Into<String>, available: bool) -> Self {
        Self {
            time: time.into(),
            available,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SlotState {
    #[default]
    NoSlotChosen,
    SlotChosen(String),
}

/// Slot choice for a single date. Only available slots can be chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPicker {
    slots: Vec<TimeSlot>,
    state: SlotState,
}

impl SlotPicker {
    pub fn new(slots: Vec<TimeSlot>) -> Self {
        Self {
            slots,
            state: SlotState::NoSlotChosen,
        }
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    pub fn selected_time(&self) -> Option<&str> {
        match &self.state {
            SlotState::SlotChosen(time) => Some(time),
            SlotState::NoSlotChosen => None,
        }
    }

    pub fn is_available(&self, time: &str) -> bool {
        self.slots.iter().any(|s| s.time == time && s.available)
    }

    /// Returns false and keeps the current state when the slot is unknown or taken.
    pub fn select(&mut self, time: &str) -> bool {
        if !self.is_available(time) {
            tracing::debug!(time, "ignoring selection of unavailable slot");
            return false;
        }
        self.state = SlotState::SlotChosen(time.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.state = SlotState::NoSlotChosen;
    }

    /// Swaps in a fresh slot list, dropping the choice if it is no longer offered.
    pub fn replace_slots(&mut self, slots: Vec<TimeSlot>) {
        self.slots = slots;
        let still_open = self
            .selected_time()
            .map(|time| self.is_available(time))
            .unwrap_or(true);
        if !still_open {
            self.state = SlotState::NoSlotChosen;
        }
    }
}
