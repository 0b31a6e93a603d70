use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{
    ChartRenderer, Config, Coordinate, ForecastPeriod, render::chart::register_configured_font,
    render_grid, service_from_config, upcoming_periods,
};
use inquire::{CustomType, Text};
use tracing::info;

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Hourly forecasts for small displays")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the NOAA user agent and endpoint.
    Configure,

    /// Print the text grid for a location.
    Text {
        /// Location as `lat,lon`, e.g. `40.7128,-74.006`.
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,
    },

    /// Write the 1-bit temperature chart for a location.
    Chart {
        /// Location as `lat,lon`.
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,

        /// Where to write the BMP file.
        #[arg(long, short, default_value = "forecast.bmp")]
        output: PathBuf,
    },

    /// Print the upcoming periods as upstream-shaped JSON.
    Periods {
        /// Location as `lat,lon`.
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,

        /// How many periods to print; all of them if absent.
        #[arg(long)]
        count: Option<usize>,
    },

    /// Serve the text and image endpoints over HTTP.
    Serve {
        /// Address to listen on; overrides `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Text { coordinate } => {
                let service = service_from_config(&config)?;
                let periods =
                    upcoming_periods(service.as_ref(), coordinate, config.display.text_periods)
                        .await?;

                println!("{}", render_grid(&periods));
            }
            Command::Chart { coordinate, output } => {
                register_configured_font(&config.chart)?;

                let service = service_from_config(&config)?;
                let periods =
                    upcoming_periods(service.as_ref(), coordinate, config.display.chart_periods)
                        .await?;

                let bitmap = ChartRenderer::new(config.chart.clone()).render(&periods)?;
                fs::write(&output, bitmap.into_bytes())
                    .with_context(|| format!("Failed to write chart: {}", output.display()))?;

                info!(path = %output.display(), "wrote chart");
            }
            Command::Periods { coordinate, count } => {
                let service = service_from_config(&config)?;
                let periods =
                    upcoming_periods(service.as_ref(), coordinate, count.unwrap_or(usize::MAX))
                        .await?;

                let raw: Vec<_> = periods.iter().map(ForecastPeriod::to_raw).collect();
                println!("{}", serde_json::to_string_pretty(&raw)?);
            }
            Command::Serve { bind } => server::serve(config, bind).await?,
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    config.noaa.user_agent = Text::new("User agent sent to NOAA (include a contact):")
        .with_default(&config.noaa.user_agent)
        .prompt()?;

    config.noaa.base_url = Text::new("NOAA API base URL:")
        .with_default(&config.noaa.base_url)
        .prompt()?;

    config.noaa.timeout_secs = CustomType::<u64>::new("Forecast fetch timeout in seconds:")
        .with_default(config.noaa.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}
