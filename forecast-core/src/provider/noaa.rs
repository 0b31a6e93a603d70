use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{config::NoaaConfig, error::ForecastError, model::Coordinate};

use super::WeatherService;

/// Client for the api.weather.gov hourly forecast.
///
/// A forecast takes two round trips: `/points/{lat},{lon}` resolves the grid
/// and hands back the `forecastHourly` URL, which is then fetched for the
/// `periods` array.
#[derive(Debug, Clone)]
pub struct NoaaClient {
    config: NoaaConfig,
    http: Client,
}

impl NoaaClient {
    pub fn new(config: NoaaConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(anyhow!(
                "NOAA requires an identifying user agent.\n\
                 Hint: run `forecast configure` and enter a contact (e.g. your email)."
            ));
        }

        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client for NOAA")?;

        Ok(Self { config, http })
    }

    fn points_url(&self, coordinate: Coordinate) -> String {
        format!(
            "{}/points/{},{}",
            self.config.base_url.trim_end_matches('/'),
            format_degrees(coordinate.latitude),
            format_degrees(coordinate.longitude),
        )
    }

    async fn get_json(&self, url: &str, what: &str) -> Result<Value, ForecastError> {
        let res = self
            .http
            .get(url)
            .header(ACCEPT, "application/geo+json")
            .send()
            .await
            .map_err(|e| ForecastError::FetchFailure(format!("Failed to send NOAA {what} request: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ForecastError::FetchFailure(format!("Failed to read NOAA {what} response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(ForecastError::FetchFailure(format!(
                "NOAA {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ForecastError::FetchFailure(format!("Failed to parse NOAA {what} JSON: {e}")))
    }
}

#[async_trait]
impl WeatherService for NoaaClient {
    #[instrument(skip_all, fields(coordinate = %coordinate))]
    async fn fetch_hourly_periods(&self, coordinate: Coordinate) -> Result<Vec<Value>, ForecastError> {
        let points = self.get_json(&self.points_url(coordinate), "points").await?;

        let hourly_url = points
            .pointer("/properties/forecastHourly")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ForecastError::FetchFailure("NOAA points response has no forecastHourly URL".into())
            })?;
        debug!(%hourly_url, "resolved hourly forecast endpoint");

        let mut hourly = self.get_json(hourly_url, "hourly forecast").await?;

        match hourly.pointer_mut("/properties/periods").map(Value::take) {
            Some(Value::Array(periods)) => {
                debug!(count = periods.len(), "received hourly periods");
                Ok(periods)
            }
            _ => Err(ForecastError::FetchFailure(
                "NOAA hourly forecast response has no periods array".into(),
            )),
        }
    }
}

/// NOAA redirects requests with more than four decimals, so round up front.
fn format_degrees(value: f64) -> String {
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
