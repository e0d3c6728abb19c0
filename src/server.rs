// HTTP surface
// Vehicle catalog endpoint plus in-memory booking sessions, one independent wizard per session

use crate::catalog::CatalogProvider;
use crate::draft::{BookingDraft, FieldUpdate};
use crate::summary::{baggage_helper_text, car_seat_helper_text, BookingSummary};
use crate::vehicle::{VehicleCategory, VehicleOffering};
use crate::wizard::{Submission, ValidationErrors, Wizard, WizardError, WizardStep};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const HEALTH_PATH: &str = "/health";
pub const VEHICLES_PATH: &str = "/api/vehicles";
pub const BOOKINGS_PATH: &str = "/api/bookings";
pub const BOOKING_PATH: &str = "/api/bookings/{id}";

pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// A wizard plus the time it was last touched by a request
struct Session {
    wizard: Wizard,
    last_seen: Instant,
}

impl Session {
    fn new(wizard: Wizard) -> Self {
        Self {
            wizard,
            last_seen: Instant::now(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<dyn CatalogProvider>,
    sessions: Arc<DashMap<Uuid, Session>>,
    max_idle: Duration,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self {
            catalog,
            sessions: Arc::new(DashMap::new()),
            max_idle: DEFAULT_SESSION_IDLE,
        }
    }

    /// Sessions untouched for longer than `max_idle` are dropped by the sweeper.
    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // Looks up a session and marks it as active
    fn session_mut(&self, id: Uuid) -> Result<RefMut<'_, Uuid, Session>, ServerError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(ServerError::SessionNotFound(id))?;
        session.last_seen = Instant::now();
        Ok(session)
    }

    /// Removes idle sessions and returns how many were dropped.
    pub fn sweep_idle_sessions(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_seen.elapsed() <= self.max_idle);
        let removed = before.saturating_sub(self.sessions.len());

        if removed > 0 {
            info!(removed, remaining = self.sessions.len(), "Expired idle booking sessions");
        } else {
            debug!(sessions = self.sessions.len(), "No idle booking sessions to expire");
        }
        removed
    }

    /// Runs `sweep_idle_sessions` every `every` on the current runtime.
    pub fn spawn_session_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                state.sweep_idle_sessions();
            }
        })
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to fetch vehicles")]
    CatalogUnavailable,

    #[error("Booking session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Invalid field update: {0}")]
    InvalidUpdate(String),

    #[error(transparent)]
    Wizard(#[from] WizardError),
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::InvalidUpdate(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let code = match &self {
            ServerError::CatalogUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidUpdate(_) => StatusCode::BAD_REQUEST,
            ServerError::Wizard(WizardError::NotAtSummary(_)) => StatusCode::CONFLICT,
            ServerError::Wizard(WizardError::ValidationFailed(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServerError::Wizard(_) => StatusCode::BAD_REQUEST,
        };
        let body = match &self {
            ServerError::Wizard(WizardError::ValidationFailed(errors)) => {
                serde_json::json!({ "error": self.to_string(), "errors": errors })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (code, Json(body)).into_response()
    }
}

// A catalog entry as offered to the picker
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleChoice {
    #[serde(flatten)]
    pub offering: VehicleOffering,
    pub category: VehicleCategory,
    pub icon: &'static str,
    pub disabled: bool,
}

// Everything a client needs to render the current wizard step
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub step: u8,
    pub step_label: &'static str,
    pub progress: u8,
    pub draft: BookingDraft,
    pub errors: ValidationErrors,
    pub night_trip: bool,
    pub pickup_display: String,
    pub vehicles: Vec<VehicleChoice>,
    pub baggage_limit: u32,
    pub car_seat_limit: u32,
    pub baggage_help: Option<String>,
    pub car_seat_help: Option<String>,
    pub summary: Option<BookingSummary>,
}

impl SessionView {
    pub fn new(id: Uuid, wizard: &Wizard) -> Self {
        let step = wizard.step();
        let selected = wizard.selected_vehicle();

        Self {
            id,
            step: step.number(),
            step_label: step.label(),
            progress: step.progress(),
            draft: wizard.draft().clone(),
            errors: wizard.errors().clone(),
            night_trip: wizard.is_night_trip(),
            pickup_display: wizard.formatted_pickup(),
            vehicles: wizard
                .catalog()
                .iter()
                .map(|offering| VehicleChoice {
                    offering: offering.clone(),
                    category: offering.category(),
                    icon: offering.category().icon_name(),
                    disabled: wizard.is_vehicle_disabled(offering),
                })
                .collect(),
            baggage_limit: wizard.baggage_limit(),
            car_seat_limit: wizard.car_seat_limit(),
            baggage_help: selected.map(baggage_helper_text),
            car_seat_help: selected.map(car_seat_helper_text),
            summary: (step == WizardStep::Summary).then(|| wizard.summary()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(VEHICLES_PATH, get(list_vehicles))
        .route(BOOKINGS_PATH, post(create_session))
        .route(
            BOOKING_PATH,
            get(get_session).patch(update_session).delete(delete_session),
        )
        .route("/api/bookings/{id}/advance", post(advance_session))
        .route("/api/bookings/{id}/retreat", post(retreat_session))
        .route("/api/bookings/{id}/submit", post(submit_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn list_vehicles(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleOffering>>, ServerError> {
    // The provider absorbs its own failures; a failed task is the only error left
    let provider = Arc::clone(&state.catalog);
    let vehicles = tokio::spawn(async move { provider.fetch_catalog().await })
        .await
        .map_err(|e| {
            error!(error = %e, "Error in vehicles API");
            ServerError::CatalogUnavailable
        })?;

    Ok(Json(vehicles))
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let wizard = Wizard::load(state.catalog.as_ref()).await;
    let id = Uuid::new_v4();
    let view = SessionView::new(id, &wizard);
    state.sessions.insert(id, Session::new(wizard));

    info!(session_id = %id, "Booking session created");
    (StatusCode::CREATED, Json(view))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ServerError> {
    let session = state.session_mut(id)?;
    Ok(Json(SessionView::new(id, &session.wizard)))
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    update: Result<Json<FieldUpdate>, JsonRejection>,
) -> Result<Json<SessionView>, ServerError> {
    let mut session = state.session_mut(id)?;
    let Json(update) = update?;
    session.wizard.update_field(update)?;
    Ok(Json(SessionView::new(id, &session.wizard)))
}

async fn advance_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SessionView>), ServerError> {
    let mut session = state.session_mut(id)?;

    let moved = session.wizard.advance();
    let code = if !moved && !session.wizard.errors().is_empty() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    Ok((code, Json(SessionView::new(id, &session.wizard))))
}

async fn retreat_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ServerError> {
    let mut session = state.session_mut(id)?;
    session.wizard.retreat();
    Ok(Json(SessionView::new(id, &session.wizard)))
}

async fn submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Submission>, ServerError> {
    // The entry guard must be released before the session is removed
    let submission = {
        let mut session = state.session_mut(id)?;
        session.wizard.submit()?
    };
    state.sessions.remove(&id);

    info!(session_id = %id, "Booking session submitted");
    Ok(Json(submission))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .sessions
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ServerError::SessionNotFound(id))
}
