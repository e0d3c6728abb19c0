// Taxi booking service
// Vehicle catalog, booking wizard and the HTTP surface that exposes them

pub mod catalog;
pub mod cms;
pub mod config;
pub mod draft;
pub mod server;
pub mod summary;
pub mod vehicle;
pub mod wizard;

// Re-export key types for convenience
pub use catalog::{
    CatalogConfig, CatalogError, CatalogProvider, CmsCatalogProvider, StaticCatalogProvider,
};
pub use config::{AppConfig, ConfigError, LogFormat};
pub use draft::{BookingDraft, Field, FieldUpdate};
pub use server::{router, AppState, ServerError, SessionView};
pub use summary::{BookingSummary, Extra};
pub use vehicle::{fallback_catalog, VehicleCategory, VehicleOffering};
pub use wizard::{Submission, ValidationErrors, Wizard, WizardError, WizardStep};
