use async_trait::async_trait;
use serde_json::Value;
use std::{fmt::Debug, time::Duration};

use crate::{config::Config, error::ForecastError, model::Coordinate, provider::noaa::NoaaClient};

pub mod noaa;

/// The external weather service. One call, no retries: callers that need a
/// timeout or retry policy wrap the implementation.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    /// Raw hourly period records for `coordinate`, in whatever order the
    /// service returns them.
    async fn fetch_hourly_periods(&self, coordinate: Coordinate) -> Result<Vec<Value>, ForecastError>;
}

/// Gives up on a fetch that takes longer than `limit`.
#[derive(Debug)]
pub struct TimeLimited<S> {
    inner: S,
    limit: Duration,
}

impl<S> TimeLimited<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<S: WeatherService> WeatherService for TimeLimited<S> {
    async fn fetch_hourly_periods(&self, coordinate: Coordinate) -> Result<Vec<Value>, ForecastError> {
        tokio::time::timeout(self.limit, self.inner.fetch_hourly_periods(coordinate))
            .await
            .map_err(|_| {
                ForecastError::FetchFailure(format!(
                    "Weather service did not answer within {}s",
                    self.limit.as_secs_f64()
                ))
            })?
    }
}

/// Construct the weather service from config, bounded by `noaa.timeout_secs`.
pub fn service_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherService>> {
    let client = NoaaClient::new(config.noaa.clone())?;
    Ok(Box::new(TimeLimited::new(client, Duration::from_secs(config.noaa.timeout_secs))))
}
