use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

pub mod field_names;
pub mod period;
pub mod unit;

pub use period::{CELL_LINES, Cell, ForecastPeriod};
pub use unit::{UnitCode, UnitValue};

/// A point on the globe to forecast for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ForecastError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ForecastError::InvalidCoordinate(format!(
                "latitude {latitude} is outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ForecastError::InvalidCoordinate(format!(
                "longitude {longitude} is outside -180..=180"
            )));
        }

        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses the `lat,lon` form used in request paths and on the command line.
impl FromStr for Coordinate {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| ForecastError::InvalidCoordinate(format!("expected 'lat,lon', got '{s}'")))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| ForecastError::InvalidCoordinate(format!("'{part}' is not a number")))
        };

        Coordinate::new(parse(lat)?, parse(lon)?)
    }
}
