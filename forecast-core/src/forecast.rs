//! Turning raw service output into the ordered list of periods the renderers
//! consume.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    error::ForecastError,
    model::{Coordinate, ForecastPeriod},
    provider::WeatherService,
};

/// Fetch, parse, drop stale periods and sort by start time.
///
/// A single malformed period fails the whole call. Periods starting before
/// `now` are discarded; the service occasionally returns a stale leading entry.
pub async fn fetch_periods<S>(
    service: &S,
    coordinate: Coordinate,
    now: DateTime<Utc>,
) -> Result<Vec<ForecastPeriod>, ForecastError>
where
    S: WeatherService + ?Sized,
{
    let raw = service.fetch_hourly_periods(coordinate).await?;
    let received = raw.len();

    let mut periods = raw
        .into_iter()
        .map(ForecastPeriod::from_raw)
        .collect::<Result<Vec<_>, _>>()?;

    periods.retain(|p| p.start_time >= now);
    periods.sort_by_key(|p| p.start_time);

    debug!(received, kept = periods.len(), "filtered forecast periods");
    Ok(periods)
}

/// The first `count` upcoming periods as of the current instant.
pub async fn upcoming_periods<S>(
    service: &S,
    coordinate: Coordinate,
    count: usize,
) -> Result<Vec<ForecastPeriod>, ForecastError>
where
    S: WeatherService + ?Sized,
{
    let mut periods = fetch_periods(service, coordinate, Utc::now()).await?;
    periods.truncate(count);
    Ok(periods)
}
