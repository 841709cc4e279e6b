//! Anthro CLI - pediatric anthropometric assessment and growth curves

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anthro_core::config::{self, ResolvedConfig};
use anthro_core::report::{
    render_chart_json, render_chart_text, render_curve_json, render_curve_text,
};
use anthro_core::{
    evaluate, global_store, growth_curve, install_global_store, render_json, render_jsonl,
    render_text, ActivityLevel, FeedingMode, Indicator, Measurement, NutritionReport,
    ReferenceStore, Sex,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "anthro")]
#[command(about = "Pediatric anthropometric assessment against LMS growth references")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one child and print the full nutritional report
    Assess {
        /// Age in days
        #[arg(long)]
        age_days: i64,

        /// Sex (male/female, m/f)
        #[arg(long)]
        sex: Sex,

        /// Weight in kg
        #[arg(long)]
        weight: Option<f64>,

        /// Length or height in cm
        #[arg(long)]
        height: Option<f64>,

        /// Head circumference in cm
        #[arg(long)]
        head_circumference: Option<f64>,

        /// Triceps skinfold in mm
        #[arg(long)]
        triceps: Option<f64>,

        /// Subscapular skinfold in mm
        #[arg(long)]
        subscapular: Option<f64>,

        /// Physical activity level (light, moderate, vigorous)
        #[arg(long, default_value = "moderate")]
        activity: ActivityLevel,

        /// Feeding mode for infants (breast, formula, mixed)
        #[arg(long, default_value = "mixed")]
        feeding: FeedingMode,

        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Assess every measurement in a JSON array
    Batch {
        /// JSON file holding an array of measurements
        input: PathBuf,

        /// Activity level for items that do not set one
        #[arg(long, default_value = "moderate")]
        activity: ActivityLevel,

        /// Feeding mode for items that do not set one
        #[arg(long, default_value = "mixed")]
        feeding: FeedingMode,

        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(long, default_value = "json")]
        format: BatchFormat,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,
    },
    /// Print percentile curves for one indicator and sex
    Curve {
        /// Indicator (weight_for_age, height_for_age, bmi_for_age, ...)
        #[arg(long)]
        indicator: Indicator,

        /// Sex (male/female, m/f)
        #[arg(long)]
        sex: Sex,

        /// Comma-separated percentiles (overrides config file)
        #[arg(long, value_delimiter = ',')]
        percentiles: Vec<f64>,

        /// Keep every n-th table row (overrides config file)
        #[arg(long)]
        stride: Option<usize>,

        /// Child's age in days, to place a measurement on the chart
        #[arg(long, requires = "value")]
        age_days: Option<i64>,

        /// Child's measurement in the indicator's unit
        #[arg(long, requires = "age_days")]
        value: Option<f64>,

        #[command(flatten)]
        common: CommonArgs,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Directory of reference tables (overrides config file)
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Path to config file (default: auto-discover)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running an assessment
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum BatchFormat {
    Json,
    Jsonl,
}

/// One entry of a batch file: a measurement plus optional per-child modes.
#[derive(Debug, Deserialize)]
struct BatchItem {
    #[serde(flatten)]
    measurement: Measurement,
    #[serde(default)]
    feeding_mode: Option<FeedingMode>,
    #[serde(default)]
    activity_level: Option<ActivityLevel>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Assess {
            age_days,
            sex,
            weight,
            height,
            head_circumference,
            triceps,
            subscapular,
            activity,
            feeding,
            common,
            format,
        } => {
            let resolved = load_config(&common)?;
            let store = open_store(&common, &resolved)?;

            let measurement = Measurement {
                age_days,
                sex,
                weight_kg: weight,
                height_cm: height,
                head_circumference_cm: head_circumference,
                triceps_skinfold_mm: triceps,
                subscapular_skinfold_mm: subscapular,
            };
            let report = evaluate(store, &measurement, feeding, activity, &resolved);

            match format {
                OutputFormat::Text => print!("{}", render_text(&report)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("failed to serialize report")?
                ),
            }
        }
        Commands::Batch {
            input,
            activity,
            feeding,
            common,
            format,
            quiet,
        } => {
            let resolved = load_config(&common)?;
            let store = open_store(&common, &resolved)?;
            let items = load_batch(&input)?;
            info!("assessing {} measurements from {}", items.len(), input.display());

            let progress = if quiet {
                ProgressBar::hidden()
            } else {
                let pb = ProgressBar::new(items.len() as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                        .context("invalid progress bar template")?
                        .progress_chars("#>-"),
                );
                pb
            };

            let reports: Vec<NutritionReport> = items
                .par_iter()
                .map(|item| {
                    let report = evaluate(
                        store,
                        &item.measurement,
                        item.feeding_mode.unwrap_or(feeding),
                        item.activity_level.unwrap_or(activity),
                        &resolved,
                    );
                    progress.inc(1);
                    report
                })
                .collect();
            progress.finish_and_clear();

            match format {
                BatchFormat::Json => println!("{}", render_json(&reports)),
                BatchFormat::Jsonl => print!("{}", render_jsonl(&reports)),
            }
        }
        Commands::Curve {
            indicator,
            sex,
            percentiles,
            stride,
            age_days,
            value,
            common,
            format,
        } => {
            let resolved = load_config(&common)?;
            let store = open_store(&common, &resolved)?;

            let percentiles = if percentiles.is_empty() {
                resolved.percentiles.clone()
            } else {
                percentiles
            };
            let stride = stride.unwrap_or(resolved.stride);
            let curve = growth_curve(store, indicator, sex, &percentiles, Some(stride))
                .with_context(|| format!("failed to build {} curve for {}", indicator, sex))?;

            if let (Some(age_days), Some(value)) = (age_days, value) {
                let chart = curve
                    .chart(age_days, value)
                    .context("failed to place the child on the chart")?;
                match format {
                    OutputFormat::Text => print!("{}", render_chart_text(&chart)),
                    OutputFormat::Json => println!("{}", render_chart_json(&chart)),
                }
            } else {
                match format {
                    OutputFormat::Text => print!("{}", render_curve_text(&curve)),
                    OutputFormat::Json => println!("{}", render_curve_json(&curve)),
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&root, path.as_deref())
                    .context("failed to load configuration")?;
                print!("{}", render_config(&resolved));
            }
        },
    }

    Ok(())
}

/// Load config from --config or auto-discovery, logging where it came from
fn load_config(common: &CommonArgs) -> Result<ResolvedConfig> {
    let root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&root, common.config.as_deref())?;
    if let Some(ref p) = resolved.config_path {
        eprintln!("Using config: {}", p.display());
    }
    Ok(resolved)
}

/// Install the process-wide reference store for the chosen tables directory
fn open_store(common: &CommonArgs, resolved: &ResolvedConfig) -> Result<&'static ReferenceStore> {
    let dir = common
        .tables
        .clone()
        .or_else(|| resolved.tables_dir.clone())
        .context("no reference tables directory: pass --tables or set tables_dir in the config file")?;
    if !dir.is_dir() {
        anyhow::bail!("reference tables directory not found: {}", dir.display());
    }
    debug!("reading reference tables from {}", dir.display());

    install_global_store(ReferenceStore::from_dir(dir))
        .map_err(|_| anyhow::anyhow!("reference store already installed"))?;
    global_store().context("reference store not installed")
}

/// Read a batch file: a JSON array of measurements
fn load_batch(path: &Path) -> Result<Vec<BatchItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse batch file: {}", path.display()))
}

fn render_config(resolved: &ResolvedConfig) -> String {
    let mut out = String::from("Configuration:\n");
    match resolved.config_path {
        Some(ref p) => out.push_str(&format!("  Source: {}\n", p.display())),
        None => out.push_str("  Source: defaults (no config file found)\n"),
    }
    out.push_str(&format!(
        "  Tables: {}\n",
        resolved
            .tables_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    ));

    let t = &resolved.thresholds;
    out.push_str("\nThresholds:\n");
    out.push_str(&format!("  risk: {}\n", t.risk));
    out.push_str(&format!("  moderate: {}\n", t.moderate));
    out.push_str(&format!("  severe: {}\n", t.severe));

    let e = &resolved.energy;
    out.push_str("\nEnergy:\n");
    out.push_str(&format!("  infant_threshold_days: {}\n", e.infant_threshold_days));
    out.push_str(&format!(
        "  activity: light={} moderate={} vigorous={}\n",
        e.activity.light, e.activity.moderate, e.activity.vigorous
    ));
    out.push_str(&format!(
        "  feeding: breast={} formula={} mixed={}\n",
        e.feeding.breast, e.feeding.formula, e.feeding.mixed
    ));

    out.push_str("\nCurves:\n");
    out.push_str(&format!(
        "  percentiles: {}\n",
        resolved
            .percentiles
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str(&format!("  stride: {}\n", resolved.stride));
    out
}
