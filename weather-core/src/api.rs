//! HTTP surface: a single `GET /api/weather` route.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{ErrorPayload, WeatherAggregator};

pub const WEATHER_PATH: &str = "/api/weather";

pub fn router(aggregator: Arc<WeatherAggregator>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route(WEATHER_PATH, get(get_weather))
        .with_state(aggregator)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn get_weather(State(aggregator): State<Arc<WeatherAggregator>>) -> Response {
    match aggregator.current_weather().await {
        Ok(payload) => Json(payload).into_response(),
        Err(err) => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorPayload::from_error(&err))).into_response()
        }
    }
}
