pub mod booking;
pub mod salon;
pub mod selection;
pub mod service;
pub mod service_package;
pub mod slot;

pub use booking::{
    BookedItem, Booking, BookingRequest, BookingStatus, CustomerContact, RequestedItem,
};
pub use salon::{NewSalon, Salon};
pub use selection::{ItemKind, SelectedItem, Selection, SelectionTotals};
pub use service::{NewSalonService, SalonService};
pub use service_package::{
    NewServicePackage, PackageCategory, PackageItem, PackageUpdate, ServicePackage,
};
pub use slot::{SlotPicker, SlotState, TimeSlot};
