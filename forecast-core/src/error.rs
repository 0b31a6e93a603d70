use thiserror::Error;

/// Every way a single forecast request can fail.
///
/// All variants are terminal for the request that produced them; nothing in
/// this crate retries or degrades to partial output.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Unit identifier outside the known `wmoUnit:*` set.
    #[error("Unrecognized unit code '{0}'")]
    UnrecognizedUnit(String),

    /// A numeric field carried something other than a number.
    #[error("Expected a number for '{field}', found {found}")]
    TypeMismatch { field: String, found: &'static str },

    /// Icon reference that cannot be turned into an absolute URL.
    #[error("Invalid icon reference '{0}'")]
    InvalidIcon(String),

    /// The raw record does not fit the upstream period schema.
    #[error("Malformed forecast period: {0}")]
    MalformedPeriod(#[source] serde_json::Error),

    #[error("Forecast period '{name}' does not end after it starts")]
    InvalidTimeWindow { name: String },

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// The weather service could not be reached or answered with garbage.
    #[error("Failed to fetch forecast: {0}")]
    FetchFailure(String),

    #[error("Cannot render a chart from zero samples")]
    EmptySeries,

    #[error("Rendering failed: {0}")]
    Render(String),
}

impl ForecastError {
    /// Short machine-friendly name of the variant, used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::UnrecognizedUnit(_) => "unrecognized_unit",
            ForecastError::TypeMismatch { .. } => "type_mismatch",
            ForecastError::InvalidIcon(_) => "invalid_icon",
            ForecastError::MalformedPeriod(_) => "malformed_period",
            ForecastError::InvalidTimeWindow { .. } => "invalid_time_window",
            ForecastError::InvalidCoordinate(_) => "invalid_coordinate",
            ForecastError::FetchFailure(_) => "fetch_failure",
            ForecastError::EmptySeries => "empty_series",
            ForecastError::Render(_) => "render",
        }
    }
}
