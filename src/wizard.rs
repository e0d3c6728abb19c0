// Booking wizard
// Four-step form state machine: field updates, derived state, per-step validation and submission

use crate::catalog::CatalogProvider;
use crate::draft::{
    baggage_limit, car_seat_limit, clamp_to_vehicle, reconcile_vehicle, BookingDraft, Field,
    FieldUpdate, MAX_PASSENGERS, MIN_PASSENGERS,
};
use crate::summary::{self, BookingSummary};
use crate::vehicle::{find_vehicle, VehicleOffering};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

pub const PICKUP_IN_PAST: &str = "La data e l'ora di partenza devono essere nel futuro";
pub const PICKUP_INVALID: &str = "Data o orario non validi";
pub const VEHICLE_REQUIRED: &str = "Seleziona una vettura";
pub const FIRST_NAME_REQUIRED: &str = "Il nome è obbligatorio";
pub const LAST_NAME_REQUIRED: &str = "Il cognome è obbligatorio";
pub const PHONE_REQUIRED: &str = "Il numero di telefono è obbligatorio";
pub const EMAIL_REQUIRED: &str = "L'email è obbligatoria";
pub const EMAIL_INVALID: &str = "Inserisci un'email valida";
pub const SUBMISSION_CONFIRMED: &str =
    "Prenotazione inviata con successo! Ti contatteremo presto per confermare la tua prenotazione.";

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    TripDetails,
    VehicleAndOptions,
    ContactInfo,
    Summary,
}

pub const TOTAL_STEPS: u8 = 4;

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::TripDetails,
        WizardStep::VehicleAndOptions,
        WizardStep::ContactInfo,
        WizardStep::Summary,
    ];

    /// 1-based position in the wizard.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::TripDetails => 1,
            WizardStep::VehicleAndOptions => 2,
            WizardStep::ContactInfo => 3,
            WizardStep::Summary => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::TripDetails => "Dettagli Viaggio",
            WizardStep::VehicleAndOptions => "Vettura e Opzioni",
            WizardStep::ContactInfo => "Info Contatti",
            WizardStep::Summary => "Riepilogo",
        }
    }

    // Width of the progress bar, in percent
    pub fn progress(self) -> u8 {
        let percent = u16::from(self.number()) * 100 / u16::from(TOTAL_STEPS);
        percent as u8
    }
}

/// Field-keyed messages for the active step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }

    pub fn remove(&mut self, field: Field) -> Option<String> {
        self.0.remove(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("Unknown vehicle type: {0}")]
    UnknownVehicle(String),

    #[error("Vehicle {vehicle_type} cannot carry {passengers} passengers")]
    VehicleUnavailable {
        vehicle_type: String,
        passengers: u32,
    },

    #[error("Submission is only available from the summary step (current step {0})")]
    NotAtSummary(u8),

    #[error("Validation failed for {} field(s)", .0.len())]
    ValidationFailed(ValidationErrors),
}

// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub message: String,
    pub summary: BookingSummary,
}

fn parse_pickup(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M:%S"))
        .ok()?;
    Some(date.and_time(time))
}

pub struct Wizard {
    catalog: Vec<VehicleOffering>,
    draft: BookingDraft,
    errors: ValidationErrors,
    step: WizardStep,
}

impl Wizard {
    /// Starts a wizard on the first step with a default draft. The passenger
    /// rule runs once so the first eligible vehicle is preselected.
    pub fn new(catalog: Vec<VehicleOffering>) -> Self {
        let mut wizard = Self {
            catalog,
            draft: BookingDraft::default(),
            errors: ValidationErrors::default(),
            step: WizardStep::TripDetails,
        };
        reconcile_vehicle(&mut wizard.draft, &wizard.catalog);
        wizard
    }

    /// Fetches the catalog once and starts a wizard over it.
    pub async fn load(provider: &dyn CatalogProvider) -> Self {
        Self::new(provider.fetch_catalog().await)
    }

    pub fn catalog(&self) -> &[VehicleOffering] {
        &self.catalog
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selected_vehicle(&self) -> Option<&VehicleOffering> {
        self.draft.selected_vehicle(&self.catalog)
    }

    // Ineligible offerings stay listed but cannot be picked
    pub fn is_vehicle_disabled(&self, vehicle: &VehicleOffering) -> bool {
        self.draft.passengers > vehicle.max_passengers
    }

    pub fn baggage_limit(&self) -> u32 {
        baggage_limit(self.selected_vehicle())
    }

    pub fn car_seat_limit(&self) -> u32 {
        car_seat_limit(self.selected_vehicle())
    }

    pub fn is_night_trip(&self) -> bool {
        summary::is_night_trip(&self.draft.pickup_time)
    }

    pub fn formatted_pickup(&self) -> String {
        summary::format_pickup(&self.draft.pickup_date, &self.draft.pickup_time)
    }

    pub fn vehicle_display_name(&self, vehicle_type: &str) -> String {
        summary::vehicle_display_name(&self.catalog, vehicle_type)
    }

    pub fn summary(&self) -> BookingSummary {
        BookingSummary::from_draft(&self.draft, &self.catalog)
    }

    /// Applies one edit, clears that field's error and reruns the derivation
    /// rules touched by the edit.
    pub fn update_field(&mut self, update: FieldUpdate) -> Result<(), WizardError> {
        let field = update.field();
        let previous_passengers = self.draft.passengers;
        let previous_vehicle = self.draft.vehicle_type.clone();

        match update {
            FieldUpdate::PickupAddress(value) => self.draft.pickup_address = value,
            FieldUpdate::DropoffAddress(value) => self.draft.dropoff_address = value,
            FieldUpdate::PickupDate(value) => self.draft.pickup_date = value,
            FieldUpdate::PickupTime(value) => self.draft.pickup_time = value,
            FieldUpdate::Passengers(count) => {
                self.draft.passengers = count.clamp(MIN_PASSENGERS, MAX_PASSENGERS);
            }
            FieldUpdate::VehicleType(vehicle_type) => self.select_vehicle(vehicle_type)?,
            FieldUpdate::CarSeatsCount(count) => {
                self.draft.car_seats_count = count.min(self.car_seat_limit());
            }
            FieldUpdate::Baggage(count) => {
                if !self.draft.baggage_unsure {
                    self.draft.baggage = count.min(self.baggage_limit());
                }
            }
            FieldUpdate::BaggageUnsure(unsure) => {
                self.draft.baggage_unsure = unsure;
                if unsure {
                    self.draft.baggage = 0;
                }
            }
            FieldUpdate::StationAssistance(value) => self.draft.station_assistance = value,
            FieldUpdate::AdditionalNotes(value) => self.draft.additional_notes = value,
            FieldUpdate::FirstName(value) => self.draft.first_name = value,
            FieldUpdate::LastName(value) => self.draft.last_name = value,
            FieldUpdate::PhoneNumber(value) => self.draft.phone_number = value,
            FieldUpdate::Email(value) => self.draft.email = value,
        }

        self.errors.remove(field);
        self.apply_derivations(previous_passengers, previous_vehicle);
        Ok(())
    }

    fn select_vehicle(&mut self, vehicle_type: Option<String>) -> Result<(), WizardError> {
        let Some(vehicle_type) = vehicle_type.filter(|t| !t.trim().is_empty()) else {
            self.draft.vehicle_type = None;
            self.draft.vehicle_pinned = false;
            return Ok(());
        };

        let vehicle = find_vehicle(&self.catalog, &vehicle_type)
            .ok_or_else(|| WizardError::UnknownVehicle(vehicle_type.clone()))?;
        if !vehicle.accommodates(self.draft.passengers) {
            return Err(WizardError::VehicleUnavailable {
                vehicle_type,
                passengers: self.draft.passengers,
            });
        }

        self.draft.vehicle_type = Some(vehicle_type);
        self.draft.vehicle_pinned = true;
        Ok(())
    }

    // Passenger rule first, since it may change the vehicle the clamp runs against
    fn apply_derivations(&mut self, previous_passengers: u32, previous_vehicle: Option<String>) {
        if self.draft.passengers != previous_passengers
            && reconcile_vehicle(&mut self.draft, &self.catalog)
        {
            debug!(
                passengers = self.draft.passengers,
                vehicle_type = ?self.draft.vehicle_type,
                "Vehicle reselected for passenger count"
            );
        }

        if self.draft.vehicle_type != previous_vehicle {
            if let Some(vehicle) = self.draft.selected_vehicle(&self.catalog) {
                clamp_to_vehicle(&mut self.draft, vehicle);
            }
        }
    }

    fn validate_trip_details(&self, now: NaiveDateTime, errors: &mut ValidationErrors) {
        let (date, time) = (&self.draft.pickup_date, &self.draft.pickup_time);
        if date.is_empty() || time.is_empty() {
            return;
        }

        let message = match parse_pickup(date, time) {
            Some(pickup) if pickup > now => return,
            Some(_) => PICKUP_IN_PAST,
            None => PICKUP_INVALID,
        };
        errors.insert(Field::PickupDate, message);
        errors.insert(Field::PickupTime, message);
    }

    fn validate_contact_info(&self, errors: &mut ValidationErrors) {
        if self.draft.first_name.trim().is_empty() {
            errors.insert(Field::FirstName, FIRST_NAME_REQUIRED);
        }
        if self.draft.last_name.trim().is_empty() {
            errors.insert(Field::LastName, LAST_NAME_REQUIRED);
        }
        if self.draft.phone_number.trim().is_empty() {
            errors.insert(Field::PhoneNumber, PHONE_REQUIRED);
        }
        if self.draft.email.trim().is_empty() {
            errors.insert(Field::Email, EMAIL_REQUIRED);
        } else if !email_pattern().is_match(&self.draft.email) {
            errors.insert(Field::Email, EMAIL_INVALID);
        }
    }

    /// Replaces the error set with the current step's findings, judging
    /// pickup times against `now`.
    pub fn validate_current_step_at(&mut self, now: NaiveDateTime) -> &ValidationErrors {
        let mut errors = ValidationErrors::default();
        match self.step {
            WizardStep::TripDetails => self.validate_trip_details(now, &mut errors),
            WizardStep::VehicleAndOptions => {
                if self.draft.vehicle_type.is_none() {
                    errors.insert(Field::VehicleType, VEHICLE_REQUIRED);
                }
            }
            WizardStep::ContactInfo => self.validate_contact_info(&mut errors),
            WizardStep::Summary => {}
        }
        self.errors = errors;
        &self.errors
    }

    pub fn validate_current_step(&mut self) -> &ValidationErrors {
        self.validate_current_step_at(Local::now().naive_local())
    }

    /// Moves one step forward when the current step validates. Returns
    /// whether the step changed; the summary step never advances.
    pub fn advance_at(&mut self, now: NaiveDateTime) -> bool {
        if !self.validate_current_step_at(now).is_empty() {
            let fields: Vec<&str> = self.errors.iter().map(|(field, _)| field.as_str()).collect();
            debug!(
                step = self.step.number(),
                errors = self.errors.len(),
                fields = ?fields,
                "Step validation failed"
            );
            return false;
        }

        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    pub fn advance(&mut self) -> bool {
        self.advance_at(Local::now().naive_local())
    }

    /// Moves one step back without validating. Errors belong to the step
    /// being left, so they are dropped.
    pub fn retreat(&mut self) -> bool {
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                self.errors = ValidationErrors::default();
                true
            }
            None => false,
        }
    }

    pub fn submit_at(&mut self, now: NaiveDateTime) -> Result<Submission, WizardError> {
        if self.step != WizardStep::Summary {
            return Err(WizardError::NotAtSummary(self.step.number()));
        }
        if !self.validate_current_step_at(now).is_empty() {
            return Err(WizardError::ValidationFailed(self.errors.clone()));
        }

        // No downstream sink yet: the booking is only recorded in the log
        info!(draft = ?self.draft, "Booking submitted");

        Ok(Submission {
            message: SUBMISSION_CONFIRMED.to_string(),
            summary: self.summary(),
        })
    }

    pub fn submit(&mut self) -> Result<Submission, WizardError> {
        self.submit_at(Local::now().naive_local())
    }
}
