// Booking summary
// Read-only values derived from a draft: display strings, the night flag and the final recap

use crate::draft::BookingDraft;
use crate::vehicle::{find_vehicle, VehicleOffering};
use chrono::{Locale, NaiveDate};
use serde::Serialize;
use std::fmt;

pub const NOT_SPECIFIED: &str = "Non specificato";
pub const NOT_SELECTED: &str = "Non selezionato";
pub const TO_BE_DEFINED: &str = "Da definire";
pub const EXTRA_FEE_EUR: u32 = 10;

const NIGHT_START_HOUR: u32 = 22;
const NIGHT_END_HOUR: u32 = 6;

// Leading integer of the "HH" part, the way a lenient parser reads "7:30" or "07h"
fn leading_hour(time: &str) -> Option<u32> {
    let hour_part = time.split(':').next()?.trim_start();
    let digits: String = hour_part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// True when the pickup hour falls in the 22:00-06:00 surcharge window.
pub fn is_night_trip(pickup_time: &str) -> bool {
    match leading_hour(pickup_time) {
        Some(hour) => hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR,
        None => false,
    }
}

/// "1 giugno 2025 alle 10:30", or the placeholder when date or time is missing.
pub fn format_pickup(pickup_date: &str, pickup_time: &str) -> String {
    if pickup_date.is_empty() || pickup_time.is_empty() {
        return NOT_SPECIFIED.to_string();
    }

    let date = NaiveDate::parse_from_str(pickup_date, "%Y-%m-%d")
        .map(|d| d.format_localized("%-d %B %Y", Locale::it_IT).to_string())
        .unwrap_or_else(|_| pickup_date.to_string());

    format!("{} alle {}", date, pickup_time)
}

/// `title (description) - N pax`, or the raw type when it is not in the catalog.
pub fn vehicle_display_name(catalog: &[VehicleOffering], vehicle_type: &str) -> String {
    match find_vehicle(catalog, vehicle_type) {
        Some(v) => format!("{} ({}) - {} pax", v.title, v.description, v.max_passengers),
        None => vehicle_type.to_string(),
    }
}

pub fn baggage_helper_text(vehicle: &VehicleOffering) -> String {
    format!(
        "Stima approssimativa - massimo {} bagagli per questo veicolo (valigie grandi contano come 2). Potremo sempre aggiustare i dettagli in seguito.",
        vehicle.max_baggage
    )
}

pub fn car_seat_helper_text(vehicle: &VehicleOffering) -> String {
    format!("Massimo {} seggiolini per questo veicolo", vehicle.max_car_seats)
}

// Paid options listed at the bottom of the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Extra {
    CarSeats { count: u32 },
    StationAssistance,
    NightTrip,
}

impl Extra {
    pub fn fee_eur(self) -> u32 {
        EXTRA_FEE_EUR
    }
}

impl fmt::Display for Extra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extra::CarSeats { count } => {
                write!(f, "Seggiolini: {} (+€{})", count, self.fee_eur())
            }
            Extra::StationAssistance => {
                write!(f, "Assistenza in stazione (+€{})", self.fee_eur())
            }
            Extra::NightTrip => write!(f, "Notturno (22:00 - 06:00) (+€{})", self.fee_eur()),
        }
    }
}

pub fn extras(draft: &BookingDraft) -> Vec<Extra> {
    let mut extras = Vec::new();
    if draft.car_seats_count > 0 {
        extras.push(Extra::CarSeats {
            count: draft.car_seats_count,
        });
    }
    if draft.station_assistance {
        extras.push(Extra::StationAssistance);
    }
    if is_night_trip(&draft.pickup_time) {
        extras.push(Extra::NightTrip);
    }
    extras
}

// Recap shown on the last wizard step and returned on submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub pickup: String,
    pub dropoff: String,
    pub date_time: String,
    pub passengers: u32,
    pub vehicle: String,
    // Only present when baggage was given or left undecided
    pub baggage: Option<String>,
    pub notes: Option<String>,
    pub name: String,
    pub contact: String,
    pub extras: Vec<Extra>,
}

fn or_not_specified(value: &str) -> String {
    if value.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        value.to_string()
    }
}

impl BookingSummary {
    pub fn from_draft(draft: &BookingDraft, catalog: &[VehicleOffering]) -> Self {
        let baggage = if draft.baggage_unsure {
            Some(TO_BE_DEFINED.to_string())
        } else if draft.baggage > 0 {
            Some(draft.baggage.to_string())
        } else {
            None
        };

        Self {
            pickup: or_not_specified(&draft.pickup_address),
            dropoff: or_not_specified(&draft.dropoff_address),
            date_time: format_pickup(&draft.pickup_date, &draft.pickup_time),
            passengers: draft.passengers,
            vehicle: draft
                .vehicle_type
                .as_deref()
                .map_or_else(|| NOT_SELECTED.to_string(), |t| vehicle_display_name(catalog, t)),
            baggage,
            notes: Some(draft.additional_notes.clone()).filter(|n| !n.is_empty()),
            name: draft.full_name(),
            contact: format!("{} / {}", draft.email, draft.phone_number),
            extras: extras(draft),
        }
    }
}

impl fmt::Display for BookingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partenza: {}", self.pickup)?;
        writeln!(f, "Arrivo: {}", self.dropoff)?;
        writeln!(f, "Data e Ora: {}", self.date_time)?;
        writeln!(f, "Passeggeri: {}", self.passengers)?;
        writeln!(f, "Vettura: {}", self.vehicle)?;
        if let Some(baggage) = &self.baggage {
            writeln!(f, "Bagagli: {}", baggage)?;
        }
        if let Some(notes) = &self.notes {
            writeln!(f, "Note aggiuntive: {}", notes)?;
        }
        writeln!(f, "Nome: {}", self.name)?;
        write!(f, "Contatto: {}", self.contact)?;
        if !self.extras.is_empty() {
            write!(f, "\nOpzioni Aggiuntive:")?;
            for extra in &self.extras {
                write!(f, "\n• {}", extra)?;
            }
        }
        Ok(())
    }
}
