//! HydroSense application binary - composition root.
//!
//! 1. Load `.env` and configuration from TOML (`init-config` writes it out)
//! 2. Load the classifier artifact once into shared, read-only state
//! 3. Build the completion client and advisory responder
//! 4. Run the chosen front end: HTTP API, one-shot predict, or chat REPL

mod cli;
mod repl;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use hydrosense_advisor::{AdvisoryResponder, ChatCompletionsClient};
use hydrosense_api::state::AppState;
use hydrosense_core::{HydroConfig, Language, PotabilityResult};
use hydrosense_predict::PotabilityPredictor;
use hydrosense_session::SessionOrchestrator;

use cli::{CliArgs, Command, PredictArgs};

/// How often the server drops idle sessions.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args = CliArgs::parse();

    // Config. The fallback warning from `load_or_default` goes to a bootstrap
    // subscriber, since the configured log level is not known yet.
    let config_file = args.resolve_config_path();
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .finish();
    let mut config = tracing::subscriber::with_default(bootstrap, || {
        HydroConfig::load_or_default(&config_file)
    });
    config.general.port = args.resolve_port(config.general.port);
    config.model.path = args.resolve_model_path(&config.model.path);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing. Logs go to stderr so predict/chat output stays clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting HydroSense v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if let Command::InitConfig { force } = args.command() {
        return init_config(&config, &config_file, force);
    }

    // Predictor: artifact loaded once, absence is not fatal.
    let predictor = PotabilityPredictor::from_config(&config.model);

    match args.command() {
        Command::Predict(predict) => run_predict(&predictor, &predict),
        Command::Chat { lang } => {
            let language = match lang {
                Some(code) => Language::from_str(&code)?,
                None => config.chat.default_language,
            };
            let orchestrator = build_orchestrator(&config, predictor)?;
            repl::run(&orchestrator, language).await?;
            Ok(())
        }
        Command::Serve => serve(config, predictor).await,
        Command::InitConfig { .. } => Ok(()),
    }
}

/// Write the effective configuration to `path`.
fn init_config(
    config: &HydroConfig,
    path: &Path,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    config.save(path)?;
    println!("{}", path.display());
    Ok(())
}

fn build_orchestrator(
    config: &HydroConfig,
    predictor: PotabilityPredictor,
) -> Result<SessionOrchestrator, Box<dyn std::error::Error>> {
    let client = ChatCompletionsClient::from_config(&config.llm)?;
    let responder = AdvisoryResponder::new(Arc::new(client));
    Ok(SessionOrchestrator::new(
        predictor,
        responder,
        config.chat.clone(),
    ))
}

/// Print the label (`0`/`1`) or the unavailable notice for one sample.
fn run_predict(
    predictor: &PotabilityPredictor,
    args: &PredictArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let sample = args.sample();
    sample.validate()?;
    let result = predictor.evaluate(&sample);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "sample": sample,
                "result": result,
            }))?
        );
        return Ok(());
    }
    match result {
        PotabilityResult::Predicted { potability } => println!("{}", potability.label()),
        PotabilityResult::Unavailable { reason } => println!("unavailable: {}", reason),
    }
    Ok(())
}

async fn serve(
    config: HydroConfig,
    predictor: PotabilityPredictor,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = build_orchestrator(&config, predictor)?;
    let state = AppState::new(config.clone(), orchestrator);

    // Idle session purge.
    let purge_orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = purge_orchestrator.purge_expired() {
                tracing::warn!(error = %e, "Session purge failed");
            }
        }
    });

    if let Err(e) = hydrosense_api::start_server(&config, state).await {
        tracing::error!(
            host = %config.general.host,
            port = config.general.port,
            error = %e,
            "API server stopped - is another instance running?"
        );
        return Err(e.into());
    }
    Ok(())
}
