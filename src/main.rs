//! NeoRisk: neonatal EOS and bilirubin risk calculators
//!
//! Command-line entry point. Results are printed to stdout as JSON.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use neorisk::adapters::sanitize::RedactingMakeWriter;
use neorisk::adapters::HttpThresholdService;
use neorisk::domain::{
    AntibioticDuration, AntibioticType, ClinicalExam, GbsStatus, GestationalAge, Temperature,
};
use neorisk::{
    calculate_bili_local, BiliInputs, BiliService, EngineConfig, EosInputs, EosService,
    ModelVersion,
};

#[derive(Parser)]
#[command(name = "neorisk")]
#[command(about = "Neonatal EOS risk and bilirubin threshold calculator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Early-onset sepsis risk per 1000 live births
    Eos {
        /// Model version (2017 or 2024)
        #[arg(long, default_value = "2024")]
        model: ModelVersion,
        /// Gestational age, completed weeks
        #[arg(long)]
        ga_weeks: u32,
        /// Gestational age, additional days
        #[arg(long, default_value_t = 0)]
        ga_days: u32,
        /// Highest maternal intrapartum temperature in Fahrenheit
        #[arg(long, conflicts_with = "temp_c")]
        temp_f: Option<f64>,
        /// Highest maternal intrapartum temperature in Celsius
        #[arg(long)]
        temp_c: Option<f64>,
        /// Hours since rupture of membranes
        #[arg(long, default_value_t = 0.0)]
        rom_hours: f64,
        /// Maternal GBS status (positive, negative, unknown)
        #[arg(long)]
        gbs: GbsStatus,
        /// Intrapartum antibiotic type (none, gbs-specific, broad-spectrum)
        #[arg(long, default_value = "none")]
        abx: AntibioticType,
        /// Antibiotic duration before birth (none, <2h, 2-4h, >=4h)
        #[arg(long, default_value = "none")]
        abx_duration: AntibioticDuration,
        /// Clinical exam (well, equivocal, ill)
        #[arg(long)]
        exam: ClinicalExam,
        /// Baseline EOS incidence per 1000 (defaults to NEORISK_BASELINE_INCIDENCE)
        #[arg(long)]
        incidence: Option<f64>,
    },
    /// Bilirubin phototherapy and exchange thresholds
    Bili {
        /// Gestational age, completed weeks
        #[arg(long)]
        ga_weeks: u32,
        /// Gestational age, additional days
        #[arg(long, default_value_t = 0)]
        ga_days: u32,
        /// Birth time (RFC 3339)
        #[arg(long)]
        birth: DateTime<Utc>,
        /// Sample time (RFC 3339)
        #[arg(long)]
        sample: DateTime<Utc>,
        /// Total serum bilirubin in mg/dL
        #[arg(long)]
        tsb: f64,
        /// Any neurotoxicity risk factor present
        #[arg(long)]
        risk: bool,
        /// Query the remote threshold service (NEORISK_BILI_SERVICE_URL)
        #[arg(long)]
        remote: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LogSink {
    File,
    Stdout,
    Stderr,
}

/// Initialize logging.
///
/// stdout carries the JSON result, so by default logs go to stderr:
/// - `NEORISK_LOG_MODE=file`: append to `NEORISK_LOG_FILE`
/// - `NEORISK_LOG_MODE=stdout`: interleave with the result
/// - auto: file when `NEORISK_LOG_FILE` is set and stderr is not a TTY, else stderr
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_mode = std::env::var("NEORISK_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let interactive = std::io::stderr().is_terminal();
    let sink = match log_mode.as_str() {
        "file" => LogSink::File,
        "stdout" => LogSink::Stdout,
        // auto
        _ if !interactive && std::env::var("NEORISK_LOG_FILE").is_ok() => LogSink::File,
        _ => LogSink::Stderr,
    };

    let (writer, guard) = if sink == LogSink::File {
        let log_file =
            std::env::var("NEORISK_LOG_FILE").unwrap_or_else(|_| "neorisk.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: a missing directory surfaces on open below.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else if sink == LogSink::Stdout {
        tracing_appender::non_blocking(std::io::stdout())
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(RedactingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;
    let config = EngineConfig::from_env()?;

    match cli.command {
        Commands::Eos {
            model,
            ga_weeks,
            ga_days,
            temp_f,
            temp_c,
            rom_hours,
            gbs,
            abx,
            abx_duration,
            exam,
            incidence,
        } => {
            let maternal_temperature = match (temp_f, temp_c) {
                (Some(f), _) => Temperature::fahrenheit(f),
                (None, Some(c)) => Temperature::celsius(c),
                (None, None) => anyhow::bail!("one of --temp-f or --temp-c is required"),
            };

            let inputs = EosInputs {
                gestational_age: GestationalAge::new(ga_weeks, ga_days),
                maternal_temperature,
                rom_hours,
                gbs_status: gbs,
                antibiotic_type: abx,
                antibiotic_duration: abx_duration,
                clinical_exam: exam,
                baseline_incidence: incidence.unwrap_or(config.baseline_incidence),
                model_version: model,
            };

            let outputs = EosService::new(config.thresholds).calculate(&inputs);
            println!("{}", serde_json::to_string_pretty(&outputs)?);
        }
        Commands::Bili {
            ga_weeks,
            ga_days,
            birth,
            sample,
            tsb,
            risk,
            remote,
        } => {
            let inputs = BiliInputs {
                gestational_age: GestationalAge::new(ga_weeks, ga_days),
                birth_time: birth,
                sample_time: sample,
                tsb,
                neurotoxicity_risk: risk,
            };

            let client = if remote {
                HttpThresholdService::from_config(&config)?
            } else {
                None
            };

            let outputs = match client {
                Some(client) => {
                    BiliService::new(Arc::new(client), config.bili_timeout)
                        .calculate(&inputs, true)
                        .await
                }
                None => {
                    if remote {
                        tracing::warn!(
                            "--remote requested but NEORISK_BILI_SERVICE_URL is not set; using local tables"
                        );
                    }
                    calculate_bili_local(&inputs)
                }
            };

            if outputs.exceeds_exchange() {
                tracing::warn!("TSB is at or above the exchange transfusion threshold");
            }
            println!("{}", serde_json::to_string_pretty(&outputs)?);
        }
    }

    Ok(())
}
