//! The thin HTTP surface: health, text grid and bitmap chart.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use forecast_core::{
    ChartRenderer, Config, Coordinate, DisplayConfig, ForecastError, WeatherService,
    render::chart::register_configured_font, render_grid, service_from_config, upcoming_periods,
};
use serde_json::{Value, json};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<dyn WeatherService>,
    pub renderer: ChartRenderer,
    pub display: DisplayConfig,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Forecast(err) => {
                let status = match err {
                    ForecastError::InvalidCoordinate(_) => StatusCode::BAD_REQUEST,
                    ForecastError::EmptySeries => StatusCode::NOT_FOUND,
                    ForecastError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, err.kind())
            }
            ApiError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, "task"),
        };

        if status.is_server_error() {
            error!(kind, error = %self, "forecast request failed");
        }

        (status, Json(json!({ "error": self.to_string(), "kind": kind }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/forecast/{coordinate}", get(text_forecast))
        .route("/forecast-img/{coordinate}", get(image_forecast))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Plain-text grid of the first `display.text_periods` upcoming periods.
async fn text_forecast(
    State(state): State<AppState>,
    Path(coordinate): Path<String>,
) -> Result<String, ApiError> {
    let coordinate: Coordinate = coordinate.parse()?;
    let periods =
        upcoming_periods(state.service.as_ref(), coordinate, state.display.text_periods).await?;

    Ok(render_grid(&periods))
}

/// 1-bit BMP chart of the first `display.chart_periods` upcoming periods.
async fn image_forecast(
    State(state): State<AppState>,
    Path(coordinate): Path<String>,
) -> Result<Response, ApiError> {
    let coordinate: Coordinate = coordinate.parse()?;
    let periods =
        upcoming_periods(state.service.as_ref(), coordinate, state.display.chart_periods).await?;

    let renderer = state.renderer.clone();
    let bitmap = tokio::task::spawn_blocking(move || renderer.render(&periods))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, bitmap.content_type())], bitmap.into_bytes()).into_response())
}

pub async fn serve(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    if register_configured_font(&config.chart)? {
        info!(family = %config.chart.font_family, "registered chart font");
    }

    let state = AppState {
        service: Arc::from(service_from_config(&config)?),
        renderer: ChartRenderer::new(config.chart.clone()),
        display: config.display.clone(),
    };

    let addr = bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "serving forecasts");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    #[derive(Debug)]
    enum Stub {
        Hourly(Vec<i64>),
        Down,
    }

    #[async_trait]
    impl WeatherService for Stub {
        async fn fetch_hourly_periods(&self, _: Coordinate) -> Result<Vec<Value>, ForecastError> {
            match self {
                Stub::Hourly(temps) => Ok(temps
                    .iter()
                    .enumerate()
                    .map(|(i, t)| raw_period(i as i64 + 1, *t))
                    .collect()),
                Stub::Down => Err(ForecastError::FetchFailure("connection refused".into())),
            }
        }
    }

    fn raw_period(hours_ahead: i64, temperature: i64) -> Value {
        let start = Utc::now() + Duration::hours(hours_ahead);
        json!({
            "number": 1,
            "name": "",
            "startTime": start.to_rfc3339(),
            "endTime": (start + Duration::hours(1)).to_rfc3339(),
            "isDaytime": true,
            "temperature": temperature,
            "temperatureUnit": "F",
            "temperatureTrend": null,
            "probabilityOfPrecipitation": { "unitCode": "wmoUnit:percent", "value": 10 },
            "dewpoint": { "unitCode": "wmoUnit:degC", "value": 9.4 },
            "relativeHumidity": { "unitCode": "wmoUnit:percent", "value": 70 },
            "windSpeed": "5 mph",
            "windDirection": "N",
            "icon": "/icons/land/night/few",
            "shortForecast": "Mostly Clear",
            "detailedForecast": ""
        })
    }

    fn app(stub: Stub) -> Router {
        router(AppState {
            service: Arc::new(stub),
            renderer: ChartRenderer::default(),
            display: DisplayConfig::default(),
        })
    }

    async fn request(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, _, body) = request(app(Stub::Down), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn text_endpoint_shows_four_cells() {
        let (status, content_type, body) =
            request(app(Stub::Hourly(vec![50, 48, 55, 60, 52, 58])), "/forecast/40.7128,-74.006").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/plain"));

        let text = String::from_utf8(body).unwrap();
        let first: Vec<&str> = text.lines().next().unwrap().split('|').map(str::trim).collect();
        assert_eq!(first, vec!["50F", "48F", "55F", "60F"]);
        assert_eq!(text.lines().count(), 7);
    }

    #[tokio::test]
    async fn image_endpoint_returns_bmp() {
        let (status, content_type, body) =
            request(app(Stub::Hourly(vec![50, 48, 55, 60, 52, 58])), "/forecast-img/40.7128,-74.006").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/bmp"));
        assert_eq!(&body[..2], b"BM");
    }

    #[tokio::test]
    async fn bad_coordinate_is_a_client_error() {
        let (status, _, body) = request(app(Stub::Hourly(vec![50])), "/forecast/north,pole").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["kind"], "invalid_coordinate");
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let (status, _, _) = request(app(Stub::Down), "/forecast/40.7128,-74.006").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn chart_with_no_upcoming_periods_is_not_found() {
        let (status, _, body) = request(app(Stub::Hourly(vec![])), "/forecast-img/40.7128,-74.006").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["kind"], "empty_series");
    }
}
