// Vehicle catalog model
// A snapshot of bookable vehicle classes, either loaded from the CMS or the built-in fallback

use serde::{Deserialize, Serialize};

// One bookable vehicle class. `vehicle_type` is the stable key inside a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleOffering {
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub title: String,
    pub description: String,
    pub max_passengers: u32,
    pub max_baggage: u32,
    pub max_car_seats: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl VehicleOffering {
    pub fn new(
        vehicle_type: &str,
        title: &str,
        description: &str,
        max_passengers: u32,
        max_baggage: u32,
        max_car_seats: u32,
    ) -> Self {
        Self {
            vehicle_type: vehicle_type.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            max_passengers,
            max_baggage,
            max_car_seats,
            image: None,
        }
    }

    /// Whether this vehicle can carry `passengers` people.
    pub fn accommodates(&self, passengers: u32) -> bool {
        passengers <= self.max_passengers
    }

    pub fn category(&self) -> VehicleCategory {
        VehicleCategory::from_type(&self.vehicle_type)
    }
}

// Presentation category used to pick an icon for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Sedan,
    Minivan,
    Van,
    Generic,
}

impl VehicleCategory {
    // "minivan" must be checked before "van" since it contains it
    pub fn from_type(vehicle_type: &str) -> Self {
        let lowered = vehicle_type.to_lowercase();
        if lowered.contains("sedan") || lowered.contains("berlina") {
            VehicleCategory::Sedan
        } else if lowered.contains("minivan") {
            VehicleCategory::Minivan
        } else if lowered.contains("van") {
            VehicleCategory::Van
        } else {
            VehicleCategory::Generic
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            VehicleCategory::Sedan => "sedan",
            VehicleCategory::Minivan => "minivan",
            VehicleCategory::Van => "van",
            VehicleCategory::Generic => "car",
        }
    }
}

/// The built-in catalog served whenever the CMS cannot be reached or parsed.
pub fn fallback_catalog() -> Vec<VehicleOffering> {
    vec![
        VehicleOffering::new("Sedan", "Berlina", "Mercedes Classe E", 3, 3, 1),
        VehicleOffering::new("Sedan VIP", "Berlina Executive", "Mercedes Classe S", 3, 3, 1),
        VehicleOffering::new("Minivan", "Minivan", "Mercedes Classe V", 7, 12, 3),
        VehicleOffering::new("Van", "Van", "Mercedes Vito/Sprinter", 8, 15, 3),
    ]
}

/// Looks up an offering by its type key.
pub fn find_vehicle<'a>(
    catalog: &'a [VehicleOffering],
    vehicle_type: &str,
) -> Option<&'a VehicleOffering> {
    catalog.iter().find(|v| v.vehicle_type == vehicle_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Sedan", VehicleCategory::Sedan; "sedan")]
    #[test_case("Sedan VIP", VehicleCategory::Sedan; "sedan vip")]
    #[test_case("berlina-lusso", VehicleCategory::Sedan; "italian sedan")]
    #[test_case("Minivan", VehicleCategory::Minivan; "minivan")]
    #[test_case("VAN", VehicleCategory::Van; "uppercase van")]
    #[test_case("Caravan 9", VehicleCategory::Van; "substring van")]
    #[test_case("Limousine", VehicleCategory::Generic; "unknown type")]
    #[test_case("", VehicleCategory::Generic; "empty type")]
    fn test_category_from_type(vehicle_type: &str, expected: VehicleCategory) {
        assert_eq!(VehicleCategory::from_type(vehicle_type), expected);
    }

    #[test_case(VehicleCategory::Sedan, "sedan"; "sedan icon")]
    #[test_case(VehicleCategory::Minivan, "minivan"; "minivan icon")]
    #[test_case(VehicleCategory::Van, "van"; "van icon")]
    #[test_case(VehicleCategory::Generic, "car"; "generic icon")]
    fn test_icon_name(category: VehicleCategory, expected: &str) {
        assert_eq!(category.icon_name(), expected);
    }

    #[test]
    fn test_fallback_catalog_shape() {
        let catalog = fallback_catalog();
        assert_eq!(catalog.len(), 4);

        let types: Vec<&str> = catalog.iter().map(|v| v.vehicle_type.as_str()).collect();
        assert_eq!(types, vec!["Sedan", "Sedan VIP", "Minivan", "Van"]);

        let van = find_vehicle(&catalog, "Van").unwrap();
        assert_eq!(van.max_passengers, 8);
        assert_eq!(van.max_baggage, 15);
        assert_eq!(van.max_car_seats, 3);
        assert_eq!(van.category(), VehicleCategory::Van);
        assert!(catalog.iter().all(|v| v.image.is_none()));
    }

    #[test]
    fn test_offering_wire_format() {
        let mut offering = VehicleOffering::new("Minivan", "Minivan", "Mercedes Classe V", 7, 12, 3);
        let json = serde_json::to_value(&offering).unwrap();
        assert_eq!(json["type"], "Minivan");
        assert_eq!(json["maxPassengers"], 7);
        assert_eq!(json["maxBaggage"], 12);
        assert_eq!(json["maxCarSeats"], 3);
        assert!(json.get("image").is_none());

        offering.image = Some("https://cdn.example.com/v.jpg".to_string());
        let json = serde_json::to_value(&offering).unwrap();
        assert_eq!(json["image"], "https://cdn.example.com/v.jpg");
    }

    #[test]
    fn test_accommodates_is_inclusive() {
        let sedan = VehicleOffering::new("Sedan", "Berlina", "", 3, 3, 1);
        assert!(sedan.accommodates(3));
        assert!(!sedan.accommodates(4));
    }
}
