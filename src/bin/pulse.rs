//! Pulse CLI - Command-line interface for Pulse Insights
//!
//! Commands:
//! - predict: Score a batch of employees (BatchPredictRequest JSON)
//! - insights: Produce team insight cards from a TeamSummary JSON
//! - summarize: Aggregate a BatchPredictResponse into a TeamSummary
//! - health: Print the liveness status
//! - doctor: Diagnose artifacts and generative-service configuration

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_insights::features::feature_names;
use pulse_insights::model::{artifact_path, load_artifact, ArtifactKind, LabelEncoder, OnnxClassifier, StandardScaler};
use pulse_insights::types::{BatchPredictRequest, BatchPredictResponse, Domain, TeamSummary};
use pulse_insights::{PulseError, PulseService, ServiceConfig, PRODUCER_NAME, PULSE_VERSION};

/// Pulse - workforce telemetry scoring and narrative insights
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author = "PulseAI")]
#[command(version = PULSE_VERSION)]
#[command(about = "Score weekly telemetry and generate insights", long_about = None)]
struct Cli {
    /// Directory holding the model artifacts (overrides MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Use the fallback rules even when GEMINI_API_KEY is set
    #[arg(long, global = true)]
    no_genai: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a batch of employees
    Predict {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Produce team insights from a team summary
    Insights {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Aggregate prediction results into a team summary
    Summarize {
        /// Input file path with a predict response (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Representative features per domain (overrides PULSE_TOP_FEATURES)
        #[arg(long)]
        top: Option<usize>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the liveness status
    Health,

    /// Diagnose artifacts and configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse_insights=info,pulse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(dir) = cli.model_dir {
        config = config.with_model_dir(dir);
    }
    if cli.no_genai {
        config = config.without_genai();
    }

    match cli.command {
        Commands::Predict { input, output, pretty } => cmd_predict(&config, &input, &output, pretty),

        Commands::Insights { input, output, pretty } => cmd_insights(&config, &input, &output, pretty),

        Commands::Summarize {
            input,
            output,
            top,
            pretty,
        } => {
            if let Some(top) = top {
                config.top_features = top;
            }
            cmd_summarize(&config, &input, &output, pretty)
        }

        Commands::Health => {
            println!("{}", serde_json::to_string(&pulse_insights::HealthStatus::ok())?);
            Ok(())
        }

        Commands::Doctor { json } => cmd_doctor(&config, json),
    }
}

fn cmd_predict(config: &ServiceConfig, input: &Path, output: &Path, pretty: bool) -> Result<(), PulseCliError> {
    let service = PulseService::from_config(config)?;
    let response = score_request(&service, &read_input(input)?)?;
    write_output(output, &response, pretty)
}

/// Decode and score a batch request. An empty batch yields an empty result list.
fn score_request(service: &PulseService, raw: &str) -> Result<BatchPredictResponse, PulseCliError> {
    let request: BatchPredictRequest = serde_json::from_str(raw)?;
    Ok(service.predict_batch(&request)?)
}

fn cmd_insights(config: &ServiceConfig, input: &Path, output: &Path, pretty: bool) -> Result<(), PulseCliError> {
    let service = PulseService::from_config(config)?;

    let summary: TeamSummary = serde_json::from_str(&read_input(input)?)?;
    let response = service.team_insights(&summary);
    write_output(output, &response, pretty)
}

fn cmd_summarize(config: &ServiceConfig, input: &Path, output: &Path, pretty: bool) -> Result<(), PulseCliError> {
    // Aggregation needs no artifacts.
    let response: BatchPredictResponse = serde_json::from_str(&read_input(input)?)?;
    let summary = pulse_insights::team::summarize_team(&response.results, config.top_features);
    write_output(output, &summary, pretty)
}

fn read_input(input: &Path) -> Result<String, PulseCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            tracing::warn!("reading JSON from interactive stdin, end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output<T: serde::Serialize>(output: &Path, value: &T, pretty: bool) -> Result<(), PulseCliError> {
    let data = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }

    Ok(())
}

fn cmd_doctor(config: &ServiceConfig, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "pulse_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Pulse version {}", PULSE_VERSION),
    });

    if config.model_dir.is_dir() {
        checks.push(DoctorCheck {
            name: "model_dir".to_string(),
            status: CheckStatus::Ok,
            message: format!("Model directory {}", config.model_dir.display()),
        });
    } else {
        checks.push(DoctorCheck {
            name: "model_dir".to_string(),
            status: CheckStatus::Error,
            message: format!("Model directory {} does not exist", config.model_dir.display()),
        });
    }

    for domain in Domain::ALL {
        for kind in ArtifactKind::ALL {
            checks.push(check_artifact(&config.model_dir, domain, kind));
        }
    }

    // Cross-artifact consistency only makes sense once every file decodes.
    if !checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        let check = match PulseService::from_config(&config.clone().without_genai()) {
            Ok(_) => DoctorCheck {
                name: "artifacts".to_string(),
                status: CheckStatus::Ok,
                message: "All artifacts are consistent with the feature layout".to_string(),
            },
            Err(e) => DoctorCheck {
                name: "artifacts".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        };
        checks.push(check);
    }

    checks.push(match &config.gemini {
        Some(gemini) => DoctorCheck {
            name: "genai".to_string(),
            status: CheckStatus::Ok,
            message: match gemini.timeout {
                Some(timeout) => format!("Gemini {} (timeout {}s)", gemini.model, timeout.as_secs()),
                None => format!("Gemini {} (no timeout)", gemini.model),
            },
        },
        None => DoctorCheck {
            name: "genai".to_string(),
            status: CheckStatus::Warning,
            message: "GEMINI_API_KEY not set or disabled, fallback rules only".to_string(),
        },
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch input ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_artifact(dir: &Path, domain: Domain, kind: ArtifactKind) -> DoctorCheck {
    let path = artifact_path(dir, domain, kind);
    let decoded = match kind {
        ArtifactKind::Scaler => load_artifact::<StandardScaler>(&path).map(|_| ()),
        ArtifactKind::Model => OnnxClassifier::load(&path, feature_names(domain).len()).map(|_| ()),
        ArtifactKind::LabelEncoder => load_artifact::<LabelEncoder>(&path).map(|_| ()),
    };

    let name = kind.file_name(domain).to_string();
    match decoded {
        Ok(()) => DoctorCheck {
            name,
            status: CheckStatus::Ok,
            message: "present and loadable".to_string(),
        },
        Err(e) => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Pulse(PulseError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<PulseError> for PulseCliError {
    fn from(e: PulseError) -> Self {
        PulseCliError::Pulse(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Pulse(e) => {
                let (code, hint) = match &e {
                    PulseError::ArtifactMissing(_) | PulseError::ArtifactInvalid { .. } => {
                        ("ARTIFACT_ERROR", "Run 'pulse doctor' to check the model directory")
                    }
                    PulseError::Config(_) => ("CONFIG_ERROR", "Check MODEL_DIR, GEMINI_* and PULSE_* variables"),
                    PulseError::InvalidRequest(_) | PulseError::JsonError(_) => {
                        ("PARSE_ERROR", "Ensure input matches the request schema")
                    }
                    PulseError::InsufficientHistory { .. } => {
                        ("INSUFFICIENT_HISTORY", "Provide at least 4 weeks per employee")
                    }
                    PulseError::Inference(_) => {
                        ("INFERENCE_ERROR", "Re-export the classifiers with the expected input width")
                    }
                    PulseError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax and field names".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
