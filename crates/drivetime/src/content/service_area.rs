use thiserror::Error;
use tracing::{event, Level};

use crate::{
    content::{Client, FeatureCollection, SolveServiceAreaResponse},
    helpers::{boxed, Geocoordinate, MaybeSendSync, PlatformFuture},
    world::RoutingConfig,
};

pub const DEFAULT_SERVICE_AREA_URL: &str = "https://route-api.arcgis.com/arcgis/rest/services/World/ServiceAreas/NAServer/ServiceArea_World/solveServiceArea";

#[derive(Debug, Error)]
pub enum ServiceAreaError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("routing service answered HTTP {0}")]
    Http(u16),

    #[error("routing service error {code}: {message}")]
    Service { code: i64, message: String },

    #[error("could not decode routing response: {0}")]
    Decode(String),

    #[error("routing response carries no WGS84 service-area polygons")]
    MissingPolygons,
}

/// Anything that can turn one facility into drive-time polygons.
pub trait ServiceAreaProvider: MaybeSendSync {
    fn solve(
        &self,
        facility: Geocoordinate,
    ) -> PlatformFuture<'static, Result<FeatureCollection, ServiceAreaError>>;
}

/// `solveServiceArea` client for the ArcGIS routing service.
#[derive(Debug, Clone)]
pub struct ServiceAreaClient {
    client: Client,
    url: String,
    api_key: String,
    default_breaks: Vec<f64>,
}

impl ServiceAreaClient {
    pub fn new(client: Client, config: &RoutingConfig) -> Self {
        Self {
            client,
            url: config.service_url.clone(),
            api_key: config.api_key.clone(),
            default_breaks: config.default_breaks.clone(),
        }
    }

    /// Request body for a single-facility solve.
    pub fn form_params(&self, facility: Geocoordinate) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("f", "json".to_string()),
            ("token", self.api_key.clone()),
            (
                "facilities",
                format!("{},{}", facility.longitude, facility.latitude),
            ),
            ("outSR", "4326".to_string()),
            ("returnFacilities", "true".to_string()),
            ("preserveObjectID", "true".to_string()),
        ];

        if !self.default_breaks.is_empty() {
            let breaks = self
                .default_breaks
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("defaultBreaks", breaks));
        }

        params
    }

    pub async fn fetch_service_area(
        &self,
        facility: Geocoordinate,
    ) -> Result<FeatureCollection, ServiceAreaError> {
        event!(
            Level::DEBUG,
            lon = facility.longitude,
            lat = facility.latitude,
            "requesting service area"
        );

        let result = self.request(facility).await;
        if let Err(e) = &result {
            event!(Level::WARN, error = %e, "Failed to load service area");
        }
        result
    }

    async fn request(&self, facility: Geocoordinate) -> Result<FeatureCollection, ServiceAreaError> {
        let response = self
            .client
            .post(&self.url)
            .form(&self.form_params(facility))
            .send()
            .await
            .map_err(|e| ServiceAreaError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceAreaError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceAreaError::Transport(e.to_string()))?;

        parse_solve_response(&body)
    }
}

impl ServiceAreaProvider for ServiceAreaClient {
    fn solve(
        &self,
        facility: Geocoordinate,
    ) -> PlatformFuture<'static, Result<FeatureCollection, ServiceAreaError>> {
        let this = self.clone();
        boxed(async move { this.fetch_service_area(facility).await })
    }
}

/// Pulls the service-area polygons out of a `solveServiceArea` JSON body.
pub fn parse_solve_response(body: &str) -> Result<FeatureCollection, ServiceAreaError> {
    let response: SolveServiceAreaResponse =
        serde_json::from_str(body).map_err(|e| ServiceAreaError::Decode(e.to_string()))?;

    // the service reports failures with a 200 and an error object
    if let Some(error) = response.error {
        let message = if error.details.is_empty() {
            error.message
        } else {
            format!("{} ({})", error.message, error.details.join("; "))
        };
        return Err(ServiceAreaError::Service {
            code: error.code,
            message,
        });
    }

    for message in &response.messages {
        event!(Level::DEBUG, kind = message.kind, "{}", message.description);
    }

    match response.sa_polygons {
        Some(polygons) if polygons.is_wgs84() => Ok(polygons.to_geojson()),
        _ => Err(ServiceAreaError::MissingPolygons),
    }
}
