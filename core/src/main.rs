// CHURN CORE - Prediction service
// Formulario, artefactos ajustados y clasificador preentrenado

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use churn_core::artifacts::{ArtifactPaths, InferenceContext};
use churn_core::config::CoreConfig;
use churn_core::engine;
use churn_core::http::{self, ApiState};
use churn_core::telemetry::TelemetryStore;
use churn_core::types::CustomerRecord;

// ============================================================================
// MODOS DE EJECUCION
// ============================================================================

#[derive(Debug, PartialEq)]
enum Mode {
    Serve,
    Check,
    Predict(PathBuf),
}

fn parse_mode(args: &[String]) -> Result<Mode> {
    let mut iter = args.iter().skip(1);
    match iter.next().map(String::as_str) {
        None => Ok(Mode::Serve),
        Some("--check") => Ok(Mode::Check),
        Some("--predict") => match iter.next() {
            Some(path) => Ok(Mode::Predict(PathBuf::from(path))),
            None => bail!("--predict requires a path to a JSON customer record"),
        },
        Some(other) => bail!("unknown argument '{}' (expected --check or --predict <path>)", other),
    }
}

fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(error) = run(&args) {
        log::error!("[CHURN] {:#}", error);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let mode = parse_mode(args)?;
    let config = CoreConfig::from_env();

    // Artifacts are loaded exactly once, before anything is served.
    let context = InferenceContext::load(&ArtifactPaths::from_config(&config))
        .context("cannot load prediction artifacts")?;

    match mode {
        Mode::Check => {
            println!("model: {}", context.model().model_id);
            println!("columns: {}", context.columns().join(", "));
            for entry in context.fingerprints() {
                println!("{}: {} sha256={}", entry.name, entry.path, entry.sha256);
            }
            Ok(())
        }
        Mode::Predict(path) => {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let record: CustomerRecord = serde_json::from_str(&data)
                .with_context(|| format!("cannot parse customer record {}", path.display()))?;
            let prediction = engine::predict(&context, &record)?;
            println!("Churn Probability: {}", prediction.display_probability());
            println!("{}", prediction.verdict.message());
            Ok(())
        }
        Mode::Serve => run_console(config, context),
    }
}

fn run_console(config: CoreConfig, context: InferenceContext) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let state = ApiState {
            context: Arc::new(context),
            telemetry: Arc::new(TelemetryStore::new(config.recent_limit)),
        };
        let telemetry = Arc::clone(&state.telemetry);

        tokio::select! {
            result = http::serve(config.api_addr.clone(), state, config.cors_origin.clone()) => {
                if let Err(error) = result {
                    bail!("server error: {}", error);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    log::error!("[CHURN] Failed to listen for shutdown: {}", error);
                }
                log::info!("[CHURN] Shutdown signal received");
            }
        }

        let stats = telemetry.snapshot_stats().await;
        log::info!(
            "[CHURN] Stats: predictions={}, churn={}, rejected={}, defects={}, uptime={}",
            stats.predictions,
            stats.likely_to_churn,
            stats.rejected,
            stats.defects,
            stats.uptime
        );
        Ok(())
    })
}
