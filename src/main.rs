//! Onboarding Engine report tool
//!
//! Loads the stored onboarding snapshot, migrates it and prints the
//! validation, completion and fee report.
//!
//! ```sh
//! # Default config (~/.config/onboarding-engine/config.toml)
//! onboarding-engine
//!
//! # Custom data directory, machine-readable output
//! onboarding-engine --data-dir ./state --json
//!
//! # Validate config without loading anything
//! onboarding-engine --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use onboarding_engine::application::{
    CalculatorInput, FeeCalculator, OnboardingSession, OverallProgress, StepValidation,
};
use onboarding_engine::config::{config_path_from_env, AppConfig};
use onboarding_engine::domain::onboarding::CalculatorResults;
use onboarding_engine::infrastructure::FileStore;
use onboarding_engine::telemetry::init_tracing;

/// Report on the locally stored onboarding progress.
#[derive(Parser, Debug)]
#[command(name = "onboarding-engine", version, about)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the directory holding the stored snapshot.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    session_id: Option<String>,
    current_step: usize,
    validation: Vec<StepValidation>,
    progress: OverallProgress,
    fees: CalculatorResults,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(config_path_from_env);
    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            AppConfig::default()
        }
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(dir) = cli.data_dir {
        config.persistence.data_dir = Some(dir);
    }
    init_tracing(&config.logging);
    info!("Configuration from {}", config_path.display());

    let data_dir = config.persistence.resolved_data_dir();
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Data dir    : {}", data_dir.display());
        println!("   Log level   : {}", config.logging.level);
        println!("   Margin      : {}", config.calculator.margin);
        return Ok(());
    }

    // ── Load session ───────────────────────────────────────────
    let session = OnboardingSession::builder(Arc::new(FileStore::new(&data_dir)))
        .settings(config.session_settings())
        .start()
        .await;

    let data = session.snapshot().await;
    let fees = FeeCalculator::new(config.calculator.clone())
        .calculate(&CalculatorInput::from_data(&data));
    let report = Report {
        session_id: data.session_id.clone(),
        current_step: data.current_step,
        validation: session.validate_all().await,
        progress: session.progress().await,
        fees,
    };

    if let Err(e) = session.flush().await {
        error!("Failed to write local snapshot: {}", e);
    }
    session.dispose().await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!(
        "Session {}  (step {})",
        report.session_id.as_deref().unwrap_or("-"),
        report.current_step + 1
    );
    println!(
        "Progress: {}% ({}/{} fields, {}/{} steps)",
        report.progress.percentage,
        report.progress.completed_fields,
        report.progress.total_fields,
        report.progress.completed_steps,
        report.progress.total_steps
    );

    println!();
    for result in &report.validation {
        let mark = if result.is_valid { "ok" } else { "--" };
        println!("[{}] {:<18} {:>3}%", mark, result.step, result.completion);
        for issue in &result.issues {
            println!("       {:?} {}: {}", issue.severity, issue.field, issue.message);
        }
    }

    let fees = &report.fees;
    println!();
    println!("Monthly turnover      {:>12.2}", fees.monthly_turnover);
    println!("Effective rate        {:>12.4} %", fees.effective_rate);
    println!("Transaction margin    {:>12.2}", fees.transaction_margin);
    println!("Customer payments     {:>12.2}", fees.total_customer_payments);
    println!("Company costs         {:>12.2}", fees.total_company_costs);
    println!("Service margin        {:>12.2}", fees.service_margin);
    println!("Total monthly profit  {:>12.2}", fees.total_monthly_profit);
}
