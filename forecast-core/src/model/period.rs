use std::fmt;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use url::Url;

use crate::{
    error::ForecastError,
    model::{
        field_names::{keys_to_camel, keys_to_snake},
        unit::UnitValue,
    },
};

/// Host that path-only icon references are resolved against.
pub const DEFAULT_ICON_HOST: &str = "api.weather.gov";

/// Number of text lines in a rendered cell.
pub const CELL_LINES: usize = 7;

/// One hourly forecast window, validated and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPeriod {
    pub number: u32,
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub is_daytime: bool,
    pub temperature: i64,
    pub temperature_unit: String,
    /// Carried through but never interpreted.
    pub temperature_trend: Option<String>,
    pub probability_of_precipitation: UnitValue,
    pub dewpoint: UnitValue,
    pub relative_humidity: UnitValue,
    pub wind_speed: String,
    pub wind_direction: String,
    pub icon: Url,
    pub short_forecast: String,
    pub detailed_forecast: String,
}

#[derive(Debug, Deserialize)]
struct RawUnitValue {
    unit_code: String,
    #[serde(default)]
    value: Value,
}

/// Upstream record after key translation to snake_case.
#[derive(Debug, Deserialize)]
struct RawPeriod {
    number: u32,
    name: String,
    start_time: DateTime<FixedOffset>,
    end_time: DateTime<FixedOffset>,
    is_daytime: bool,
    temperature: i64,
    temperature_unit: String,
    #[serde(default, deserialize_with = "opaque_trend")]
    temperature_trend: Option<String>,
    probability_of_precipitation: RawUnitValue,
    dewpoint: RawUnitValue,
    relative_humidity: RawUnitValue,
    wind_speed: String,
    wind_direction: String,
    icon: String,
    short_forecast: String,
    detailed_forecast: String,
}

/// Keeps the trend only when it is a plain string; anything else is dropped.
fn opaque_trend<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

impl ForecastPeriod {
    /// Parse one upstream (camelCase) period record.
    pub fn from_raw(raw: Value) -> Result<Self, ForecastError> {
        let raw: RawPeriod =
            serde_json::from_value(keys_to_snake(raw)).map_err(ForecastError::MalformedPeriod)?;

        if raw.start_time >= raw.end_time {
            return Err(ForecastError::InvalidTimeWindow { name: raw.name });
        }

        let unit = |field: &str, v: &RawUnitValue| UnitValue::from_raw(field, &v.unit_code, &v.value);

        Ok(Self {
            probability_of_precipitation: unit(
                "probability_of_precipitation",
                &raw.probability_of_precipitation,
            )?,
            dewpoint: unit("dewpoint", &raw.dewpoint)?,
            relative_humidity: unit("relative_humidity", &raw.relative_humidity)?,
            icon: normalize_icon(&raw.icon)?,
            number: raw.number,
            name: raw.name,
            start_time: raw.start_time,
            end_time: raw.end_time,
            is_daytime: raw.is_daytime,
            temperature: raw.temperature,
            temperature_unit: raw.temperature_unit,
            temperature_trend: raw.temperature_trend,
            wind_speed: raw.wind_speed,
            wind_direction: raw.wind_direction,
            short_forecast: raw.short_forecast,
            detailed_forecast: raw.detailed_forecast,
        })
    }

    /// Re-emit as an upstream-shaped (camelCase) record; `from_raw` accepts it back.
    pub fn to_raw(&self) -> Value {
        let snake = serde_json::json!({
            "number": self.number,
            "name": self.name,
            "start_time": self.start_time.to_rfc3339(),
            "end_time": self.end_time.to_rfc3339(),
            "is_daytime": self.is_daytime,
            "temperature": self.temperature,
            "temperature_unit": self.temperature_unit,
            "temperature_trend": self.temperature_trend,
            "probability_of_precipitation": self.probability_of_precipitation.to_raw(),
            "dewpoint": self.dewpoint.to_raw(),
            "relative_humidity": self.relative_humidity.to_raw(),
            "wind_speed": self.wind_speed,
            "wind_direction": self.wind_direction,
            "icon": self.icon.path(),
            "short_forecast": self.short_forecast,
            "detailed_forecast": self.detailed_forecast,
        });

        keys_to_camel(snake)
    }

    /// The fixed seven-line text block shown for this period.
    pub fn cell(&self) -> Cell {
        // `Mostly Sunny` -> `Sunny`
        let summary = self.short_forecast.split_whitespace().last().unwrap_or_default();
        // `10 to 15 mph` -> `10to15mph`
        let wind: String = self.wind_speed.split_whitespace().collect();
        // hour % 12 on purpose: noon and midnight show as 0
        let hours = format!(
            "{}-{}{}",
            self.start_time.hour() % 12,
            self.end_time.hour() % 12,
            self.start_time.format("%p"),
        );

        Cell {
            lines: [
                format!("{}{}", self.temperature, self.temperature_unit),
                summary.to_string(),
                String::new(),
                format!("{} hum", self.relative_humidity),
                format!("{} pre", self.probability_of_precipitation),
                wind,
                hours,
            ],
        }
    }
}

impl fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.cell(), f)
    }
}

/// Resolve a path-only icon reference against [`DEFAULT_ICON_HOST`] over https.
///
/// Anything not starting with `/` is rejected, already-absolute URLs included.
/// A query string or fragment after the path is dropped.
pub fn normalize_icon(raw: &str) -> Result<Url, ForecastError> {
    if !raw.starts_with('/') {
        return Err(ForecastError::InvalidIcon(raw.to_string()));
    }

    let mut url = Url::parse(&format!("https://{DEFAULT_ICON_HOST}/"))
        .map_err(|_| ForecastError::InvalidIcon(raw.to_string()))?;
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// The rendered text of one period: always exactly [`CELL_LINES`] lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    lines: [String; CELL_LINES],
}

impl Cell {
    pub fn lines(&self) -> &[String; CELL_LINES] {
        &self.lines
    }

    /// Length of the longest line, in characters.
    pub fn width(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}
