use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use cep_weather_core::{WeatherError, WeatherReport, WeatherService};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

/// Routes for the weather service.
///
/// `/weather` and `/weather/` exist only to answer 400 for a missing CEP
/// instead of the router's default 404.
pub fn router(service: WeatherService) -> Router {
    Router::new()
        .route("/weather", get(missing_cep))
        .route("/weather/", get(missing_cep))
        .route("/weather/:cep", get(get_weather))
        .route("/health", get(health))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn get_weather(
    State(service): State<WeatherService>,
    cep: Result<Path<String>, PathRejection>,
) -> Result<Json<WeatherReport>, ApiError> {
    // A segment that doesn't even decode to UTF-8 can't be a CEP either.
    let cep = match cep {
        Ok(Path(cep)) => cep,
        Err(PathRejection::MissingPathParams(_)) => return Err(ApiError::MissingCep),
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "undecodable cep segment");
            return Err(WeatherError::InvalidZipCode.into());
        }
    };

    if cep.is_empty() {
        return Err(ApiError::MissingCep);
    }

    let report = service.resolve(&cep).await?;
    Ok(Json(report))
}

async fn missing_cep() -> ApiError {
    ApiError::MissingCep
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Maps service failures onto status codes and plain-text bodies.
#[derive(Debug)]
pub enum ApiError {
    MissingCep,
    Weather(WeatherError),
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        ApiError::Weather(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingCep => (StatusCode::BAD_REQUEST, "zipcode is required"),
            ApiError::Weather(WeatherError::InvalidZipCode) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid zipcode")
            }
            ApiError::Weather(WeatherError::ZipCodeNotFound) => {
                (StatusCode::NOT_FOUND, "can not find zipcode")
            }
            ApiError::Weather(WeatherError::Upstream(err)) => {
                if err.is_transient() {
                    warn!(service = err.service(), error = %err, "upstream unavailable");
                } else {
                    error!(service = err.service(), error = %err, "upstream request failed");
                }
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        (status, message).into_response()
    }
}
