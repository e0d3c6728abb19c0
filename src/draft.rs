// Booking draft
// The single mutable form state plus the derivation rules that keep it consistent with the catalog

use crate::vehicle::{find_vehicle, VehicleOffering};
use serde::{Deserialize, Serialize};

pub const MIN_PASSENGERS: u32 = 1;
pub const MAX_PASSENGERS: u32 = 8;

// Selector limits used when no vehicle is selected
pub const DEFAULT_BAGGAGE_LIMIT: u32 = 15;
pub const DEFAULT_CAR_SEAT_LIMIT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_date: String,
    pub pickup_time: String,
    pub passengers: u32,
    pub vehicle_type: Option<String>,
    // Set when the user picked the vehicle rather than the passenger rule
    pub vehicle_pinned: bool,
    pub car_seats_count: u32,
    pub baggage: u32,
    pub baggage_unsure: bool,
    pub station_assistance: bool,
    pub additional_notes: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            pickup_address: String::new(),
            dropoff_address: String::new(),
            pickup_date: String::new(),
            pickup_time: String::new(),
            passengers: MIN_PASSENGERS,
            vehicle_type: None,
            vehicle_pinned: false,
            car_seats_count: 0,
            baggage: 0,
            baggage_unsure: false,
            station_assistance: false,
            additional_notes: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            email: String::new(),
        }
    }
}

impl BookingDraft {
    pub fn selected_vehicle<'a>(&self, catalog: &'a [VehicleOffering]) -> Option<&'a VehicleOffering> {
        self.vehicle_type
            .as_deref()
            .and_then(|vehicle_type| find_vehicle(catalog, vehicle_type))
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// Form field names, also used as keys of the validation error set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    PickupAddress,
    DropoffAddress,
    PickupDate,
    PickupTime,
    Passengers,
    VehicleType,
    CarSeatsCount,
    Baggage,
    BaggageUnsure,
    StationAssistance,
    AdditionalNotes,
    FirstName,
    LastName,
    PhoneNumber,
    Email,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::PickupAddress => "pickupAddress",
            Field::DropoffAddress => "dropoffAddress",
            Field::PickupDate => "pickupDate",
            Field::PickupTime => "pickupTime",
            Field::Passengers => "passengers",
            Field::VehicleType => "vehicleType",
            Field::CarSeatsCount => "carSeatsCount",
            Field::Baggage => "baggage",
            Field::BaggageUnsure => "baggageUnsure",
            Field::StationAssistance => "stationAssistance",
            Field::AdditionalNotes => "additionalNotes",
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::PhoneNumber => "phoneNumber",
            Field::Email => "email",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user edit. On the wire: `{ "field": "passengers", "value": 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldUpdate {
    PickupAddress(String),
    DropoffAddress(String),
    PickupDate(String),
    PickupTime(String),
    Passengers(u32),
    // Empty string or null clears the selection
    VehicleType(Option<String>),
    CarSeatsCount(u32),
    Baggage(u32),
    BaggageUnsure(bool),
    StationAssistance(bool),
    AdditionalNotes(String),
    FirstName(String),
    LastName(String),
    PhoneNumber(String),
    Email(String),
}

impl FieldUpdate {
    pub fn field(&self) -> Field {
        match self {
            FieldUpdate::PickupAddress(_) => Field::PickupAddress,
            FieldUpdate::DropoffAddress(_) => Field::DropoffAddress,
            FieldUpdate::PickupDate(_) => Field::PickupDate,
            FieldUpdate::PickupTime(_) => Field::PickupTime,
            FieldUpdate::Passengers(_) => Field::Passengers,
            FieldUpdate::VehicleType(_) => Field::VehicleType,
            FieldUpdate::CarSeatsCount(_) => Field::CarSeatsCount,
            FieldUpdate::Baggage(_) => Field::Baggage,
            FieldUpdate::BaggageUnsure(_) => Field::BaggageUnsure,
            FieldUpdate::StationAssistance(_) => Field::StationAssistance,
            FieldUpdate::AdditionalNotes(_) => Field::AdditionalNotes,
            FieldUpdate::FirstName(_) => Field::FirstName,
            FieldUpdate::LastName(_) => Field::LastName,
            FieldUpdate::PhoneNumber(_) => Field::PhoneNumber,
            FieldUpdate::Email(_) => Field::Email,
        }
    }
}

/// Upper bound of the baggage selector for the current selection.
pub fn baggage_limit(vehicle: Option<&VehicleOffering>) -> u32 {
    vehicle.map_or(DEFAULT_BAGGAGE_LIMIT, |v| v.max_baggage)
}

/// Upper bound of the car-seat selector for the current selection.
pub fn car_seat_limit(vehicle: Option<&VehicleOffering>) -> u32 {
    vehicle.map_or(DEFAULT_CAR_SEAT_LIMIT, |v| v.max_car_seats)
}

/// Offerings able to carry `passengers`, in catalog order.
pub fn eligible_vehicles(
    catalog: &[VehicleOffering],
    passengers: u32,
) -> impl Iterator<Item = &VehicleOffering> {
    catalog.iter().filter(move |v| v.accommodates(passengers))
}

/// Passenger-driven vehicle eligibility.
///
/// A vehicle the user picked is kept while it still accommodates the
/// passenger count. Otherwise the selection moves to the first eligible
/// offering in catalog order, or is cleared when none qualifies. Returns
/// whether the selection changed.
pub fn reconcile_vehicle(draft: &mut BookingDraft, catalog: &[VehicleOffering]) -> bool {
    let pinned_still_eligible = draft.vehicle_pinned
        && draft
            .selected_vehicle(catalog)
            .map_or(false, |v| v.accommodates(draft.passengers));
    if pinned_still_eligible {
        return false;
    }

    let replacement = eligible_vehicles(catalog, draft.passengers)
        .next()
        .map(|v| v.vehicle_type.clone());
    let changed = draft.vehicle_type != replacement;
    draft.vehicle_type = replacement;
    draft.vehicle_pinned = false;
    changed
}

/// Capacity clamping against the selected vehicle. Only fields above the
/// vehicle's limits are touched, so reapplying it is a no-op.
pub fn clamp_to_vehicle(draft: &mut BookingDraft, vehicle: &VehicleOffering) {
    if draft.car_seats_count > vehicle.max_car_seats {
        draft.car_seats_count = vehicle.max_car_seats;
    }
    if draft.baggage > vehicle.max_baggage {
        draft.baggage = vehicle.max_baggage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<VehicleOffering> {
        vec![
            VehicleOffering::new("Sedan", "Berlina", "Mercedes Classe E", 3, 3, 1),
            VehicleOffering::new("Van", "Van", "Mercedes Vito/Sprinter", 8, 15, 3),
        ]
    }

    #[test]
    fn test_default_draft() {
        let draft = BookingDraft::default();
        assert_eq!(draft.passengers, 1);
        assert_eq!(draft.vehicle_type, None);
        assert!(!draft.vehicle_pinned);
        assert_eq!(draft.car_seats_count, 0);
        assert_eq!(draft.baggage, 0);
        assert!(!draft.baggage_unsure);
        assert!(!draft.station_assistance);
    }

    #[test]
    fn test_reconcile_picks_first_eligible() {
        let catalog = catalog();
        let mut draft = BookingDraft::default();

        assert!(reconcile_vehicle(&mut draft, &catalog));
        assert_eq!(draft.vehicle_type.as_deref(), Some("Sedan"));

        draft.passengers = 5;
        assert!(reconcile_vehicle(&mut draft, &catalog));
        assert_eq!(draft.vehicle_type.as_deref(), Some("Van"));

        // Auto-selected vehicles follow the passenger count back down
        draft.passengers = 1;
        assert!(reconcile_vehicle(&mut draft, &catalog));
        assert_eq!(draft.vehicle_type.as_deref(), Some("Sedan"));
    }

    #[test]
    fn test_reconcile_keeps_pinned_vehicle_while_eligible() {
        let catalog = catalog();
        let mut draft = BookingDraft {
            vehicle_type: Some("Van".to_string()),
            vehicle_pinned: true,
            ..Default::default()
        };

        assert!(!reconcile_vehicle(&mut draft, &catalog));
        assert_eq!(draft.vehicle_type.as_deref(), Some("Van"));
        assert!(draft.vehicle_pinned);

        // A pinned vehicle that no longer fits is replaced and unpinned
        let mut draft = BookingDraft {
            passengers: 5,
            vehicle_type: Some("Sedan".to_string()),
            vehicle_pinned: true,
            ..Default::default()
        };
        assert!(reconcile_vehicle(&mut draft, &catalog));
        assert_eq!(draft.vehicle_type.as_deref(), Some("Van"));
        assert!(!draft.vehicle_pinned);
    }

    #[test]
    fn test_reconcile_clears_when_nothing_fits() {
        let catalog = vec![VehicleOffering::new("Sedan", "Berlina", "", 3, 3, 1)];
        let mut draft = BookingDraft {
            passengers: 6,
            vehicle_type: Some("Sedan".to_string()),
            ..Default::default()
        };

        assert!(reconcile_vehicle(&mut draft, &catalog));
        assert_eq!(draft.vehicle_type, None);
        assert!(!reconcile_vehicle(&mut draft, &catalog));
    }

    #[test]
    fn test_reconcile_property_over_passenger_counts() {
        let catalog = catalog();
        for passengers in 0..=12 {
            let mut draft = BookingDraft {
                passengers,
                vehicle_type: Some("Sedan".to_string()),
                ..Default::default()
            };
            reconcile_vehicle(&mut draft, &catalog);
            match draft.selected_vehicle(&catalog) {
                Some(vehicle) => assert!(vehicle.max_passengers >= passengers),
                None => assert!(catalog.iter().all(|v| v.max_passengers < passengers)),
            }
        }
    }

    #[test]
    fn test_clamp_touches_only_excess_fields() {
        let sedan = VehicleOffering::new("Sedan", "Berlina", "", 3, 3, 1);
        let mut draft = BookingDraft {
            car_seats_count: 3,
            baggage: 2,
            ..Default::default()
        };

        clamp_to_vehicle(&mut draft, &sedan);
        assert_eq!(draft.car_seats_count, 1);
        assert_eq!(draft.baggage, 2);

        let once = draft.clone();
        clamp_to_vehicle(&mut draft, &sedan);
        assert_eq!(draft, once);
    }

    #[test]
    fn test_selector_limits() {
        let catalog = catalog();
        assert_eq!(baggage_limit(None), 15);
        assert_eq!(car_seat_limit(None), 3);
        assert_eq!(baggage_limit(catalog.first()), 3);
        assert_eq!(car_seat_limit(catalog.first()), 1);
    }

    #[test]
    fn test_field_update_wire_format() {
        let update: FieldUpdate =
            serde_json::from_str(r#"{"field": "passengers", "value": 5}"#).unwrap();
        assert_eq!(update, FieldUpdate::Passengers(5));
        assert_eq!(update.field(), Field::Passengers);

        let update: FieldUpdate =
            serde_json::from_str(r#"{"field": "vehicleType", "value": null}"#).unwrap();
        assert_eq!(update, FieldUpdate::VehicleType(None));

        let update: FieldUpdate =
            serde_json::from_str(r#"{"field": "email", "value": "mario@esempio.com"}"#).unwrap();
        assert_eq!(update.field().as_str(), "email");

        assert!(serde_json::from_str::<FieldUpdate>(r#"{"field": "fax", "value": "1"}"#).is_err());
    }
}
