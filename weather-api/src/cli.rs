use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use weather_core::{Config, ErrorPayload, ProviderId, WeatherAggregator};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-api", version, about = "Current weather with provider fallback")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the weather endpoint over HTTP.
    Serve {
        /// Override the configured listen host.
        #[arg(long)]
        host: Option<String>,

        /// Override the configured listen port.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Fetch current weather once and print the JSON payload.
    Show,

    /// Store a provider API key in the config file.
    Configure {
        /// Provider short name, e.g. "openweather".
        #[arg(long, default_value = "openweather", value_parser = parse_provider)]
        provider: ProviderId,
    },
}

fn parse_provider(value: &str) -> Result<ProviderId, String> {
    let id = ProviderId::try_from(value).map_err(|e| e.to_string())?;
    if !id.requires_api_key() {
        return Err(format!("Provider '{id}' does not use an API key."));
    }
    Ok(id)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        match self.command {
            Command::Serve { host, port } => {
                config.apply_env_overrides(|name| std::env::var(name).ok());
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                server::run(&config).await
            }
            Command::Show => {
                config.apply_env_overrides(|name| std::env::var(name).ok());
                let aggregator = WeatherAggregator::from_config(&config)?;
                let json = match aggregator.current_weather().await {
                    Ok(payload) => serde_json::to_string_pretty(&payload)?,
                    Err(err) => serde_json::to_string_pretty(&ErrorPayload::from_error(&err))?,
                };
                println!("{json}");
                Ok(())
            }
            Command::Configure { provider } => {
                if config.is_provider_configured(provider) {
                    println!("Replacing the existing API key for '{provider}'.");
                }

                let api_key = inquire::Password::new(&format!("API key for {provider}:"))
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.upsert_provider_api_key(provider, api_key.trim().to_string());
                config.save_to(&config_path)?;
                println!("Saved {provider} API key to {}", config_path.display());
                Ok(())
            }
        }
    }
}
