// CMS collection payload
// Records as delivered by the collection-items endpoint, and their mapping into VehicleOffering

use crate::vehicle::VehicleOffering;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

pub const DEFAULT_MAX_PASSENGERS: u32 = 4;
pub const DEFAULT_MAX_BAGGAGE: u32 = 3;
pub const DEFAULT_MAX_CAR_SEATS: u32 = 2;

// Envelope of the collection-items response
#[derive(Debug, Deserialize, Serialize)]
pub struct CmsItemsResponse {
    pub items: Vec<CmsVehicleItem>,
}

// Every field is optional on the CMS side; defaults are applied during mapping
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CmsVehicleItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(rename = "vehicle-type")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "vehicle-title")]
    pub vehicle_title: Option<String>,
    #[serde(rename = "vehicle-description")]
    pub vehicle_description: Option<String>,
    #[serde(rename = "max-passengers")]
    pub max_passengers: Option<f64>,
    #[serde(rename = "max-baggage")]
    pub max_baggage: Option<f64>,
    #[serde(rename = "max-car-seats")]
    pub max_car_seats: Option<f64>,
    #[serde(rename = "vehicle-image")]
    pub vehicle_image: Option<CmsImage>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CmsImage {
    pub url: Option<String>,
    pub alt: Option<String>,
}

// Empty strings count as missing; kept values are stored as delivered
fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

// The CMS number fields may carry decimals. Fractions are truncated, and
// anything that ends up below one seat counts as missing.
fn capacity(value: Option<f64>, default: u32) -> u32 {
    value
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n.trunc().min(f64::from(u32::MAX)) as u32)
        .unwrap_or(default)
}

impl CmsVehicleItem {
    /// Maps the record into an offering, or `None` when no type key can be resolved.
    pub fn to_offering(&self) -> Option<VehicleOffering> {
        let vehicle_type = text(&self.vehicle_type).or_else(|| text(&self.slug))?;
        let title = text(&self.vehicle_title)
            .or_else(|| text(&self.name))
            .unwrap_or(vehicle_type);

        Some(VehicleOffering {
            vehicle_type: vehicle_type.to_string(),
            title: title.to_string(),
            description: text(&self.vehicle_description).unwrap_or_default().to_string(),
            max_passengers: capacity(self.max_passengers, DEFAULT_MAX_PASSENGERS),
            max_baggage: capacity(self.max_baggage, DEFAULT_MAX_BAGGAGE),
            max_car_seats: capacity(self.max_car_seats, DEFAULT_MAX_CAR_SEATS),
            image: self
                .vehicle_image
                .as_ref()
                .and_then(|image| text(&image.url))
                .map(str::to_string),
        })
    }
}

impl CmsItemsResponse {
    // Keeps CMS order; drops records without a type and repeated types
    pub fn into_catalog(self) -> Vec<VehicleOffering> {
        let mut seen = HashSet::new();
        let mut catalog = Vec::with_capacity(self.items.len());

        for item in &self.items {
            let Some(offering) = item.to_offering() else {
                warn!(item_id = ?item.id, "Skipping CMS vehicle without a type or slug");
                continue;
            };

            if !seen.insert(offering.vehicle_type.clone()) {
                warn!(
                    item_id = ?item.id,
                    vehicle_type = %offering.vehicle_type,
                    "Skipping CMS vehicle with duplicate type"
                );
                continue;
            }

            catalog.push(offering);
        }

        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ITEMS_JSON: &str = r#"{
        "items": [
            {
                "_id": "6650a1",
                "name": "Berlina",
                "slug": "berlina",
                "vehicle-type": "Sedan",
                "vehicle-title": "Berlina",
                "vehicle-description": "Mercedes Classe E",
                "max-passengers": 3,
                "max-baggage": 3,
                "max-car-seats": 1,
                "vehicle-image": {
                    "url": "https://cdn.example.com/berlina.jpg",
                    "alt": "Berlina"
                }
            },
            {
                "_id": "6650a2",
                "name": "Navetta",
                "slug": "navetta"
            }
        ],
        "count": 2,
        "limit": 100,
        "offset": 0,
        "total": 2
    }"#;

    #[test]
    fn test_parse_and_map_items() {
        let response: CmsItemsResponse = serde_json::from_str(SAMPLE_ITEMS_JSON).unwrap();
        let catalog = response.into_catalog();
        assert_eq!(catalog.len(), 2);

        let sedan = &catalog[0];
        assert_eq!(sedan.vehicle_type, "Sedan");
        assert_eq!(sedan.title, "Berlina");
        assert_eq!(sedan.description, "Mercedes Classe E");
        assert_eq!(sedan.max_passengers, 3);
        assert_eq!(sedan.max_baggage, 3);
        assert_eq!(sedan.max_car_seats, 1);
        assert_eq!(sedan.image.as_deref(), Some("https://cdn.example.com/berlina.jpg"));

        // Bare record falls back to slug, name and default capacities
        let shuttle = &catalog[1];
        assert_eq!(shuttle.vehicle_type, "navetta");
        assert_eq!(shuttle.title, "Navetta");
        assert_eq!(shuttle.description, "");
        assert_eq!(shuttle.max_passengers, DEFAULT_MAX_PASSENGERS);
        assert_eq!(shuttle.max_baggage, DEFAULT_MAX_BAGGAGE);
        assert_eq!(shuttle.max_car_seats, DEFAULT_MAX_CAR_SEATS);
        assert!(shuttle.image.is_none());
    }

    #[test]
    fn test_falsy_values_take_defaults() {
        let item = CmsVehicleItem {
            slug: Some("van".to_string()),
            vehicle_type: Some("".to_string()),
            vehicle_title: Some("".to_string()),
            name: Some("Van".to_string()),
            max_passengers: Some(0.0),
            max_baggage: Some(-2.0),
            max_car_seats: Some(0.5),
            ..Default::default()
        };

        let offering = item.to_offering().unwrap();
        assert_eq!(offering.vehicle_type, "van");
        assert_eq!(offering.title, "Van");
        assert_eq!(offering.max_passengers, 4);
        assert_eq!(offering.max_baggage, 3);
        assert_eq!(offering.max_car_seats, 2);
    }

    #[test]
    fn test_untyped_and_duplicate_items_are_dropped() {
        let response = CmsItemsResponse {
            items: vec![
                CmsVehicleItem {
                    vehicle_type: Some("Van".to_string()),
                    max_passengers: Some(8.0),
                    ..Default::default()
                },
                CmsVehicleItem {
                    name: Some("No key".to_string()),
                    ..Default::default()
                },
                CmsVehicleItem {
                    vehicle_type: Some("Van".to_string()),
                    max_passengers: Some(9.0),
                    ..Default::default()
                },
            ],
        };

        let catalog = response.into_catalog();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].max_passengers, 8);
        assert_eq!(catalog[0].title, "Van");
    }

    #[test]
    fn test_decimal_capacities_are_accepted() {
        let response: CmsItemsResponse = serde_json::from_str(
            r#"{"items":[
                {"vehicle-type":"Van","max-passengers":8.0,"max-baggage":14.7,"max-car-seats":3},
                {"vehicle-type":"Sedan","max-passengers":3}
            ]}"#,
        )
        .unwrap();

        let catalog = response.into_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].max_passengers, 8);
        assert_eq!(catalog[0].max_baggage, 14);
        assert_eq!(catalog[0].max_car_seats, 3);
        assert_eq!(catalog[1].max_passengers, 3);
    }

    #[test]
    fn test_non_finite_capacity_takes_default() {
        assert_eq!(capacity(Some(f64::NAN), DEFAULT_MAX_PASSENGERS), 4);
        assert_eq!(capacity(Some(f64::INFINITY), DEFAULT_MAX_BAGGAGE), 3);
        assert_eq!(capacity(Some(6.0), DEFAULT_MAX_PASSENGERS), 6);
    }

    #[test]
    fn test_text_values_are_kept_verbatim() {
        let item = CmsVehicleItem {
            vehicle_type: Some(" Van ".to_string()),
            vehicle_title: Some("  ".to_string()),
            name: Some("Van".to_string()),
            ..Default::default()
        };

        let offering = item.to_offering().unwrap();
        assert_eq!(offering.vehicle_type, " Van ");
        assert_eq!(offering.title, "  ");
    }

    #[test]
    fn test_missing_items_envelope_is_an_error() {
        let result = serde_json::from_str::<CmsItemsResponse>(r#"{"collection": "vehicles"}"#);
        assert!(result.is_err());
    }
}
