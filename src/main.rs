//! Sentinel-NIDS - CLI Entry Point
//!
//! Commands:
//! - `fit-encoders` - Fit and persist categorical encoders from a training file
//! - `evaluate`     - Score a labelled NSL-KDD file and print metrics
//! - `scan`         - Score one live observation
//! - `simulate`     - Score generated normal / attack traffic
//! - `schema`       - Print the 41-column feature layout
//! - `history`      - Show persisted scan history and its summary

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use sentinel_nids::api::{self, Engine, TrafficPreset};
use sentinel_nids::constants::{APP_NAME, APP_VERSION};
use sentinel_nids::logic::history::{HistoryWriter, ScanHistory};
use sentinel_nids::{EngineConfig, ObservationInput};

/// Network intrusion scoring over the NSL-KDD feature schema.
#[derive(Parser, Debug)]
#[command(name = "sentinel-nids")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Artifact directory (encoders + model). Overrides NIDS_ARTIFACT_DIR.
    #[arg(short, long, global = true)]
    artifacts: Option<PathBuf>,

    /// Model file inside the artifact directory (.json or .onnx).
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Allow a missing encoder to degrade its column to 0.
    #[arg(long, global = true)]
    allow_degraded: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit and persist protocol_type / service / flag encoders.
    FitEncoders {
        /// Headerless NSL-KDD training file (43 fields per row).
        data: PathBuf,
    },

    /// Score every row of a labelled file and report accuracy.
    Evaluate {
        /// Headerless NSL-KDD test file.
        data: PathBuf,
    },

    /// Score one live observation.
    Scan {
        #[arg(long)]
        duration: f64,
        /// tcp, udp, icmp or http
        #[arg(long)]
        protocol: String,
        /// SF, S0, REJ or RSTR
        #[arg(long)]
        flag: String,
        #[arg(long)]
        src_bytes: f64,
        #[arg(long)]
        dst_bytes: f64,
        /// Connections to the same host in the last two seconds, 0..=511
        #[arg(long)]
        count: f64,
        /// SYN error rate, 0..=1
        #[arg(long)]
        serror_rate: f64,
        /// Append the report to the persisted scan history.
        #[arg(long)]
        record: bool,
    },

    /// Generate and score preset traffic.
    Simulate {
        /// normal or attack
        #[arg(default_value = "attack")]
        preset: String,
        /// Number of observations to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// RNG seed for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
        /// Append the reports to the persisted scan history.
        #[arg(long)]
        record: bool,
    },

    /// Print the feature layout.
    Schema,

    /// Show the persisted scan history.
    History {
        /// Number of most recent scans to list.
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(dir) = &cli.artifacts {
        config.artifact_dir = dir.clone();
    }
    if let Some(model) = &cli.model {
        config.model_file = model.clone();
    }
    if cli.allow_degraded {
        config.allow_degraded_encoders = true;
    }

    info!("{} v{}", APP_NAME, APP_VERSION);

    match cli.command {
        Commands::FitEncoders { data } => {
            let report = api::fit_encoders(&config, &data)
                .with_context(|| format!("fitting encoders from {}", data.display()))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Fitted encoders from {} ({} records, {} rejected)", report.source, report.records, report.rejected);
                for (attribute, size) in &report.vocabularies {
                    println!("  {:<14} {} classes", attribute, size);
                }
                println!("Artifacts written to {}", report.artifact_dir);
            }
        }

        Commands::Evaluate { data } => {
            let engine = open_engine(config, false)?;
            let report = api::evaluate(&engine, &data)
                .with_context(|| format!("evaluating {}", data.display()))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let m = &report.confusion;
                println!("Evaluated {} rows ({} rejected, {} with unseen categories)", report.scored, report.rejected, report.rows_with_unknowns);
                println!("  accuracy  {:.4}", report.accuracy);
                println!("  precision {:.4}", report.precision);
                println!("  recall    {:.4}", report.recall);
                println!("  f1        {:.4}", report.f1);
                println!("                 pred normal  pred attack");
                println!("  true normal    {:>11}  {:>11}", m.true_negative, m.false_positive);
                println!("  true attack    {:>11}  {:>11}", m.false_negative, m.true_positive);
            }
        }

        Commands::Scan { duration, protocol, flag, src_bytes, dst_bytes, count, serror_rate, record } => {
            let engine = open_engine(config, record)?;
            let input = ObservationInput {
                duration: Some(duration),
                protocol: Some(protocol),
                flag: Some(flag),
                src_bytes: Some(src_bytes),
                dst_bytes: Some(dst_bytes),
                count: Some(count),
                serror_rate: Some(serror_rate),
            };
            let report = api::scan(&engine, input)?;
            print_report(&report, cli.json)?;
        }

        Commands::Simulate { preset, count, seed, record } => {
            let preset: TrafficPreset = preset.parse()?;
            let engine = open_engine(config, record)?;
            for i in 0..count {
                let observation = api::generate_preset(preset, seed.map(|s| s.wrapping_add(i as u64)));
                let report = api::scan_observation(&engine, &observation)?;
                print_report(&report, cli.json)?;
            }
            if !cli.json && count > 1 {
                let summary = api::get_summary(&engine);
                println!("{} scans, {} malicious", summary.total_scans, summary.malicious);
            }
        }

        Commands::Schema => {
            let schema = api::get_schema();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&schema)?);
            } else {
                println!("Layout v{} (hash {:08x}), {} features", schema.version, schema.layout_hash, schema.feature_count);
                for column in &schema.columns {
                    let kind = if column.categorical { "categorical" } else { "numeric" };
                    println!("  {:>2}  {:<28} {}", column.position, column.name, kind);
                }
            }
        }

        Commands::History { limit } => {
            let writer = HistoryWriter::new(&config.history_dir)
                .with_context(|| format!("opening history in {}", config.history_dir.display()))?;
            let mut history = ScanHistory::new(config.history_limit);
            for report in writer.load_all()? {
                history.record(report);
            }
            let summary = history.summary();
            let recent = history.recent(limit);
            if cli.json {
                let out = serde_json::json!({ "summary": summary, "recent": recent });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "{} scans, {} malicious, last risk {:.1}% ({:?})",
                    summary.total_scans,
                    summary.malicious,
                    summary.last_risk * 100.0,
                    summary.risk_label
                );
                for report in &recent {
                    println!(
                        "  {}  {:<9} {:>6.1}%  {:<4} {:>10} bytes",
                        report.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        report.label.as_str(),
                        report.probability * 100.0,
                        report.protocol.as_str(),
                        report.total_bytes
                    );
                }
            }
        }
    }

    Ok(())
}

fn open_engine(config: EngineConfig, persistent: bool) -> Result<Engine> {
    let dir = config.artifact_dir.clone();
    let engine = if persistent {
        Engine::open_persistent(config)
    } else {
        Engine::open(config)
    };
    engine.with_context(|| {
        format!(
            "scoring unavailable: artifacts in {} could not be loaded (run fit-encoders and provide a model)",
            dir.display()
        )
    })
}

fn print_report(report: &sentinel_nids::ScanReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    println!(
        "{}  {:.1}% attack probability  ({}, {} bytes)",
        report.label,
        report.probability * 100.0,
        report.protocol,
        report.total_bytes
    );
    for unknown in &report.unknown_categories {
        println!("  warning: unseen {} '{}' (degraded confidence)", unknown.attribute, unknown.value);
    }
    for column in &report.degraded_columns {
        println!("  warning: no encoder for {} (column set to 0)", column);
    }
    Ok(())
}
