use std::{fmt::Display, fs, ops::Range, path::PathBuf, sync::OnceLock};

use chrono::{Duration, FixedOffset, NaiveDateTime};
use image::RgbImage;
use plotters::{
    coord::{
        Shift,
        cartesian::Cartesian2d,
        types::{RangedCoordf64, RangedDateTime},
    },
    element::DashedPathElement,
    prelude::*,
    style::{
        FontDesc, FontFamily, FontStyle,
        text_anchor::{HPos, Pos, VPos},
    },
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::ForecastError,
    model::ForecastPeriod,
    render::bitmap::{self, Bitmap},
};

/// The chart never plots more than a day of hourly samples.
pub const MAX_CHART_SAMPLES: usize = 24;

/// Family the bundled DejaVu Sans is registered under.
pub const BUNDLED_FONT_FAMILY: &str = "sans-serif";

const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const TITLE_AREA: u32 = 20;

type TemperatureChart<'a, 'b> = ChartContext<
    'a,
    BitMapBackend<'b>,
    Cartesian2d<RangedDateTime<NaiveDateTime>, RangedCoordf64>,
>;

/// Everything the chart renderer needs; passed in rather than set globally
/// so concurrent renders stay independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub font_family: String,
    /// TTF/OTF file registered under `font_family` at start-up. Without one
    /// `font_family` must be [`BUNDLED_FONT_FAMILY`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    pub line_width: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 200,
            title: "Temperature".to_string(),
            font_family: BUNDLED_FONT_FAMILY.to_string(),
            font_path: None,
            line_width: 1,
        }
    }
}

/// Start time and temperature of the leading periods, in input order.
///
/// Times are wall-clock times in the first sample's offset.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<NaiveDateTime>,
    temperatures: Vec<i64>,
    timezone: FixedOffset,
}

impl TimeSeries {
    /// Uses at most [`MAX_CHART_SAMPLES`] periods. The first sample's offset
    /// only decides how the hour labels read.
    pub fn from_periods(periods: &[ForecastPeriod]) -> Result<Self, ForecastError> {
        let first = periods.first().ok_or(ForecastError::EmptySeries)?;
        let timezone = *first.start_time.offset();

        let (times, temperatures) = periods
            .iter()
            .take(MAX_CHART_SAMPLES)
            .map(|p| (p.start_time.with_timezone(&timezone).naive_local(), p.temperature))
            .unzip();

        Ok(Self { times, temperatures, timezone })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    pub fn temperatures(&self) -> &[i64] {
        &self.temperatures
    }

    /// Index of the lowest temperature; the first one wins a tie.
    pub fn min_index(&self) -> usize {
        first_extreme(&self.temperatures, |candidate, best| candidate < best)
    }

    /// Index of the highest temperature; the first one wins a tie.
    pub fn max_index(&self) -> usize {
        first_extreme(&self.temperatures, |candidate, best| candidate > best)
    }

    pub fn point(&self, idx: usize) -> (NaiveDateTime, f64) {
        (self.times[idx], self.temperatures[idx] as f64)
    }

    fn points(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        (0..self.len()).map(|i| self.point(i))
    }

    fn x_range(&self) -> Range<NaiveDateTime> {
        let start = self.times.iter().copied().fold(self.times[0], Ord::min);
        let end = self.times.iter().copied().fold(self.times[0], Ord::max);
        // a single sample still needs a non-empty axis
        let end = if end > start { end } else { start + Duration::hours(1) };
        start..end
    }

    /// One degree below the minimum (where the markers start) to one above
    /// the maximum.
    fn y_range(&self) -> Range<f64> {
        let min = self.temperatures[self.min_index()] as f64;
        let max = self.temperatures[self.max_index()] as f64;
        (min - 1.0)..(max + 1.0)
    }
}

fn first_extreme(values: &[i64], better: impl Fn(i64, i64) -> bool) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if better(v, values[best]) {
            best = i;
        }
    }
    best
}

/// Draws the temperature line chart and reduces it to a 1-bit bitmap.
#[derive(Debug, Clone, Default)]
pub struct ChartRenderer {
    config: ChartConfig,
}

impl ChartRenderer {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Render the leading periods. The plot surface lives only for the
    /// duration of this call.
    pub fn render(&self, periods: &[ForecastPeriod]) -> Result<Bitmap, ForecastError> {
        register_bundled_font()?;
        let series = TimeSeries::from_periods(periods)?;
        debug!(
            samples = series.len(),
            min = series.temperatures()[series.min_index()],
            max = series.temperatures()[series.max_index()],
            "rendering temperature chart"
        );

        let rgb = self.plot(&series)?;
        Ok(bitmap::encode_monochrome(&bitmap::to_monochrome(rgb)))
    }

    fn plot(&self, series: &TimeSeries) -> Result<RgbImage, ForecastError> {
        let (width, height) = (self.config.width, self.config.height);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;

            let y_range = series.y_range();
            let mut chart = ChartBuilder::on(&root)
                .margin(4)
                .margin_top(TITLE_AREA)
                .x_label_area_size(16)
                .y_label_area_size(24)
                .build_cartesian_2d(RangedDateTime::from(series.x_range()), y_range.clone())
                .map_err(render_error)?;

            chart
                .draw_series(LineSeries::new(
                    series.points(),
                    BLACK.stroke_width(self.config.line_width),
                ))
                .map_err(render_error)?;

            for idx in [series.min_index(), series.max_index()] {
                let (t, temperature) = series.point(idx);
                chart
                    .draw_series(std::iter::once(DashedPathElement::new(
                        vec![(t, y_range.start), (t, temperature)],
                        3,
                        2,
                        BLACK,
                    )))
                    .map_err(render_error)?;
            }

            self.draw_text(&root, &mut chart, series, &y_range)?;

            root.present().map_err(render_error)?;
        }

        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ForecastError::Render("plot buffer does not match the canvas".into()))
    }

    /// Title, axis labels and the min/max annotations.
    fn draw_text(
        &self,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        chart: &mut TemperatureChart<'_, '_>,
        series: &TimeSeries,
        y_range: &Range<f64>,
    ) -> Result<(), ForecastError> {
        let font = |size: f64| {
            FontDesc::new(FontFamily::Name(self.config.font_family.as_str()), size, FontStyle::Normal)
        };

        let title = TextStyle::from(font(14.0)).pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&Text::new(
            self.config.title.as_str(),
            ((self.config.width / 2) as i32, 2),
            title,
        ))
        .map_err(render_error)?;

        let hour_label = |t: &NaiveDateTime| t.format("%H").to_string();
        let temperature_label = |v: &f64| format!("{v:.0}");

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(6)
            .y_labels(5)
            .x_label_formatter(&hour_label)
            .y_label_formatter(&temperature_label)
            .label_style(font(10.0))
            .draw()
            .map_err(render_error)?;

        // just above the time axis
        let label_y = y_range.start + 0.03 * (y_range.end - y_range.start);
        let annotation = TextStyle::from(font(11.0)).pos(Pos::new(HPos::Left, VPos::Bottom));

        for idx in [series.min_index(), series.max_index()] {
            let (t, _) = series.point(idx);
            chart
                .draw_series(std::iter::once(Text::new(
                    format!(" {}", series.temperatures()[idx]),
                    (t, label_y),
                    annotation.clone(),
                )))
                .map_err(render_error)?;
        }

        Ok(())
    }
}

/// Register DejaVu Sans as [`BUNDLED_FONT_FAMILY`] the first time it is
/// needed. Later registrations under the same family replace it.
fn register_bundled_font() -> Result<(), ForecastError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();

    let registered = *REGISTERED.get_or_init(|| {
        plotters::style::register_font(BUNDLED_FONT_FAMILY, FontStyle::Normal, BUNDLED_FONT)
            .is_ok()
    });
    if registered {
        Ok(())
    } else {
        Err(ForecastError::Render("bundled font is not usable".into()))
    }
}

/// Make `config.font_path` available to the plotting backend under
/// `config.font_family`. Backend fonts are process-wide, so this runs once at
/// start-up. Returns whether a font file was registered.
pub fn register_configured_font(config: &ChartConfig) -> Result<bool, ForecastError> {
    register_bundled_font()?;

    let Some(path) = &config.font_path else {
        return Ok(false);
    };

    let bytes = fs::read(path).map_err(|e| {
        ForecastError::Render(format!("Failed to read font file {}: {e}", path.display()))
    })?;

    plotters::style::register_font(
        &config.font_family,
        FontStyle::Normal,
        Box::leak(bytes.into_boxed_slice()),
    )
    .map_err(|_| ForecastError::Render(format!("{} is not a usable font", path.display())))?;

    Ok(true)
}

fn render_error(err: impl Display) -> ForecastError {
    ForecastError::Render(err.to_string())
}
