// Vehicle catalog provider
// Loads the vehicle catalog from the CMS and degrades to the built-in list on any failure

use crate::cms::CmsItemsResponse;
use crate::vehicle::{fallback_catalog, VehicleOffering};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

pub const DEFAULT_CMS_BASE_URL: &str = "https://api.webflow.com";
pub const DEFAULT_COLLECTION: &str = "vehicles";
pub const CMS_API_VERSION: &str = "1.0.0";

// Failures while retrieving the remote catalog. Never surfaced past `fetch_catalog`.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Missing CMS credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("CMS API error: {0}")]
    StatusError(u16),

    #[error("Payload error: {0}")]
    PayloadError(String),

    #[error("Client error: {0}")]
    ClientError(String),
}

// Connection settings for the CMS collection endpoint
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub site_id: Option<String>,
    pub api_token: Option<String>,
    pub collection: String,
    pub timeout_ms: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CMS_BASE_URL.to_string(),
            site_id: None,
            api_token: None,
            collection: DEFAULT_COLLECTION.to_string(),
            timeout_ms: None,
        }
    }
}

impl CatalogConfig {
    pub fn items_url(&self, site_id: &str) -> String {
        format!(
            "{}/sites/{}/collections/{}/items",
            self.base_url.trim_end_matches('/'),
            site_id,
            self.collection
        )
    }
}

/// Source of the vehicle catalog for a booking wizard.
///
/// Implementations must never fail: retrieval problems are absorbed and
/// replaced with a usable catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync + 'static {
    async fn fetch_catalog(&self) -> Vec<VehicleOffering>;
}

// Catalog backed by the CMS collection-items API
pub struct CmsCatalogProvider {
    config: CatalogConfig,
    http: reqwest::Client,
}

impl CmsCatalogProvider {
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let http = builder
            .build()
            .map_err(|e| CatalogError::ClientError(e.to_string()))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn headers(&self, api_token: &str) -> Result<HeaderMap, CatalogError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_token))
            .map_err(|e| CatalogError::ClientError(e.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("accept-version", HeaderValue::from_static(CMS_API_VERSION));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Single attempt against the CMS, with every failure reported.
    pub async fn try_fetch(&self) -> Result<Vec<VehicleOffering>, CatalogError> {
        let site_id = self
            .config
            .site_id
            .as_deref()
            .ok_or(CatalogError::MissingCredentials("site id"))?;
        let api_token = self
            .config
            .api_token
            .as_deref()
            .ok_or(CatalogError::MissingCredentials("api token"))?;

        let url = self.config.items_url(site_id);
        debug!(url = %url, "Requesting vehicle catalog from CMS");

        let response = self
            .http
            .get(&url)
            .headers(self.headers(api_token)?)
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::StatusError(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;
        let payload: CmsItemsResponse =
            serde_json::from_str(&body).map_err(|e| CatalogError::PayloadError(e.to_string()))?;

        Ok(payload.into_catalog())
    }
}

#[async_trait]
impl CatalogProvider for CmsCatalogProvider {
    async fn fetch_catalog(&self) -> Vec<VehicleOffering> {
        match self.try_fetch().await {
            Ok(catalog) => {
                info!(vehicles = catalog.len(), "Loaded vehicle catalog from CMS");
                catalog
            }
            Err(e) => {
                error!(error = %e, "Error fetching vehicles from CMS, serving fallback catalog");
                fallback_catalog()
            }
        }
    }
}

// Fixed in-memory catalog
#[derive(Debug, Clone)]
pub struct StaticCatalogProvider {
    vehicles: Vec<VehicleOffering>,
}

impl StaticCatalogProvider {
    pub fn new(vehicles: Vec<VehicleOffering>) -> Self {
        Self { vehicles }
    }
}

impl Default for StaticCatalogProvider {
    fn default() -> Self {
        Self::new(fallback_catalog())
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalogProvider {
    async fn fetch_catalog(&self) -> Vec<VehicleOffering> {
        self.vehicles.clone()
    }
}
