use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use cep_weather_core::{Config, WeatherError, WeatherService};
use clap::{Parser, Subcommand};
use inquire::{Password, Text};
use tracing::info;

use crate::{http, telemetry::LogFormat};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cep-weather", version, about = "Current temperature for a Brazilian CEP")]
pub struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `GET /weather/{cep}` over HTTP.
    Serve {
        /// Listen address, e.g. 127.0.0.1:8080. Overrides config and env.
        #[arg(long)]
        listen: Option<SocketAddr>,
    },

    /// Resolve one CEP and print the temperatures as JSON.
    Lookup {
        /// Eight-digit CEP, e.g. 01001000.
        cep: String,
    },

    /// Interactively store the WeatherAPI key and listen address.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { listen } => {
                let config = Config::load(self.config.as_deref())?;
                serve(&config, listen).await
            }
            Command::Lookup { cep } => {
                let config = Config::load(self.config.as_deref())?;
                lookup(&config, &cep).await
            }
            Command::Configure => configure(self.config),
        }
    }
}

async fn serve(config: &Config, listen: Option<SocketAddr>) -> anyhow::Result<()> {
    let addr = match listen {
        Some(addr) => addr,
        None => config.listen_socket_addr()?,
    };

    let service = WeatherService::from_config(config)?;
    let app = http::router(service);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("server stopped");
    Ok(())
}

async fn lookup(config: &Config, cep: &str) -> anyhow::Result<()> {
    let service = WeatherService::from_config(config)?;

    let report = service.resolve(cep).await.map_err(|err| match err {
        WeatherError::Upstream(e) => anyhow::Error::new(e).context("Lookup failed"),
        other => anyhow::Error::new(other),
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn configure(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(p) => p,
        None => Config::config_file_path()?,
    };

    // Read the file alone so env overrides don't get written back to disk.
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("WeatherAPI key:")
        .without_confirmation()
        .with_help_message("Get one at https://www.weatherapi.com/my/")
        .prompt()
        .context("Failed to read API key")?;

    let listen_addr = Text::new("Listen address:")
        .with_default(&config.listen_addr)
        .prompt()
        .context("Failed to read listen address")?;

    config.set_weather_api_key(api_key.trim().to_string());
    config.listen_addr = listen_addr;
    config.listen_socket_addr()?;
    config.require_weather_api_key()?;

    config.save_to(&path)?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
