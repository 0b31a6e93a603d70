//! Core library for the `forecast` small-display server.
//!
//! This crate defines:
//! - Forecast models (unit values, hourly periods, rendered cells)
//! - Abstraction over the weather service, with a NOAA implementation
//! - Fetch & filter of upcoming periods
//! - Renderers: a monospace text grid and a 1-bit temperature chart
//! - Configuration handling
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod render;

pub use config::{Config, DisplayConfig, NoaaConfig, ServerConfig};
pub use error::ForecastError;
pub use forecast::{fetch_periods, upcoming_periods};
pub use model::{Cell, Coordinate, ForecastPeriod, UnitCode, UnitValue};
pub use provider::{TimeLimited, WeatherService, noaa::NoaaClient, service_from_config};
pub use render::{Bitmap, ChartConfig, ChartRenderer, TimeSeries, render_grid};
