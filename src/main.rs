mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, InputArgs};
use orchardops::datasources::{load_activities, load_forecasts, load_overrides};
use orchardops::logic::{
    Clock, FixedClock, InsightEngine, ManifestAssembler, PlotResolver, ProfileTable,
    ReportRequest, RulesEngine, SystemClock,
};
use orchardops::models::SystemReport;
use orchardops::Config;
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    // Logs go to stderr; stdout carries JSON only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config)
        .context("Configuration error (see config/config.yaml.example)")?;

    match cli.command {
        Commands::Report(input) => {
            let engine = build_engine(&config, &input)?;
            let report = build_report(&engine, &input).await?;
            print_json(&report, input.pretty)
        }
        Commands::Manifest { input, focus } => {
            let engine = build_engine(&config, &input)?;

            let focus_id = match focus {
                Some(plot_ref) => {
                    let resolution = engine.resolve(&plot_ref).await;
                    if !resolution.resolved {
                        bail!("unknown plot '{}'", plot_ref);
                    }
                    Some(resolution.plot_id().to_string())
                }
                None => None,
            };

            let report = build_report(&engine, &input).await?;
            let manifest = ManifestAssembler::new(&report)
                .with_focus(focus_id.as_deref())
                .assemble()?;
            print_json(&manifest, input.pretty)
        }
        Commands::Resolve { query } => {
            let table = ProfileTable::from_config(&config)?;
            let resolution = table.resolve(&query).await;
            print_json(&resolution, true)
        }
        Commands::Check => check(&config),
    }
}

fn build_engine(config: &Config, input: &InputArgs) -> Result<InsightEngine> {
    let clock: Arc<dyn Clock> = match input.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };
    Ok(InsightEngine::from_config(config, clock)?)
}

async fn build_report(engine: &InsightEngine, input: &InputArgs) -> Result<SystemReport> {
    let forecasts = load_forecasts(&input.forecasts)
        .await
        .with_context(|| format!("Failed to load forecasts from {}", input.forecasts.display()))?;

    let activities = match &input.activities {
        Some(path) => load_activities(path)
            .await
            .with_context(|| format!("Failed to load activities from {}", path.display()))?,
        None => Vec::new(),
    };

    let overrides = match &input.overrides {
        Some(path) => load_overrides(path)
            .await
            .with_context(|| format!("Failed to load overrides from {}", path.display()))?,
        None => Vec::new(),
    };

    let request = ReportRequest::new(forecasts)
        .with_activities(activities)
        .with_overrides(overrides)
        .with_plots(input.plots.clone());

    let report = engine.run(request).await.context("Report generation failed")?;
    tracing::info!(
        "Report: {} plots, {} advisories, integrity {:?}",
        report.plots.len(),
        report.advisory_count(),
        report.gap_analysis.integrity
    );
    Ok(report)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn check(config: &Config) -> Result<()> {
    config.validate()?;
    let table = ProfileTable::from_config(config)?;

    println!("Configuration OK");
    println!(
        "Engine: horizon {} days, GDD base {:.1}°C, UTC{:+}",
        config.engine.horizon_days, config.engine.gdd_base_temp_c, config.engine.utc_offset_hours
    );
    println!();

    for profile in table.profiles() {
        let marker = if profile.id == table.default_profile().id {
            " (default)"
        } else {
            ""
        };
        println!(
            "  {:<18} {:<20} {:<12} {:<12} {}{}",
            profile.id,
            profile.name_local,
            profile.growth_stage.as_str(),
            profile.soil_type.as_str(),
            profile.personality.critical_asset,
            marker
        );
    }

    println!();
    println!("{} aliases", config.aliases.len());

    let families: Vec<&str> = RulesEngine::new()
        .list_rules()
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    println!("Rule families: {}", families.join(", "));
    Ok(())
}
