//! CLI argument definitions for the HydroSense application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use hydrosense_core::{Parameter, WaterSample};

/// HydroSense: water potability prediction and irrigation advice.
#[derive(Parser, Debug)]
#[command(name = "hydrosense", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Path to the JSON model artifact.
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Predict potability for one sample and exit.
    Predict(PredictArgs),
    /// Interactive advisory chat on stdin.
    Chat {
        /// Reply language (en, ja).
        #[arg(long = "lang")]
        lang: Option<String>,
    },
    /// Write the effective configuration (defaults plus flags) to the config path.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// One water sample; omitted parameters take the form defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct PredictArgs {
    #[arg(long)]
    pub ph: Option<f64>,
    #[arg(long)]
    pub hardness: Option<f64>,
    #[arg(long)]
    pub solids: Option<f64>,
    #[arg(long)]
    pub chloramines: Option<f64>,
    #[arg(long)]
    pub sulfate: Option<f64>,
    #[arg(long)]
    pub conductivity: Option<f64>,
    #[arg(long = "organic-carbon")]
    pub organic_carbon: Option<f64>,
    #[arg(long)]
    pub trihalomethanes: Option<f64>,
    #[arg(long)]
    pub turbidity: Option<f64>,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PredictArgs {
    /// Build the sample, filling omitted parameters with defaults.
    pub fn sample(&self) -> WaterSample {
        let overrides = [
            (Parameter::Ph, self.ph),
            (Parameter::Hardness, self.hardness),
            (Parameter::Solids, self.solids),
            (Parameter::Chloramines, self.chloramines),
            (Parameter::Sulfate, self.sulfate),
            (Parameter::Conductivity, self.conductivity),
            (Parameter::OrganicCarbon, self.organic_carbon),
            (Parameter::Trihalomethanes, self.trihalomethanes),
            (Parameter::Turbidity, self.turbidity),
        ];
        let mut sample = WaterSample::default();
        for (parameter, value) in overrides {
            if let Some(v) = value {
                sample.set(parameter, v);
            }
        }
        sample
    }
}

impl CliArgs {
    /// Subcommand to run; `serve` when none is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HYDROSENSE_CONFIG env var > ~/.hydrosense/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HYDROSENSE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > HYDROSENSE_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        std::env::var("HYDROSENSE_PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(config_port)
    }

    /// Resolve the model artifact path.
    pub fn resolve_model_path(&self, config_path: &str) -> String {
        self.model
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| config_path.to_string())
    }

    /// Resolve the log level: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path (~/.hydrosense/config.toml).
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".hydrosense").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".hydrosense").join("config.toml");
    }
    PathBuf::from("config.toml")
}
