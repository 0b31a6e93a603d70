//! Small-display renderers: a monospace text grid and a 1-bit chart.

pub mod bitmap;
pub mod chart;
pub mod grid;

pub use bitmap::Bitmap;
pub use chart::{ChartConfig, ChartRenderer, TimeSeries};
pub use grid::render_grid;
