//! Pulse Insights - workforce telemetry scoring and narrative insights
//!
//! Pulse turns weekly per-employee telemetry into burnout, performance and
//! growth classifications through a deterministic pipeline: window selection →
//! feature aggregation → scaling → classification → label decoding. Each result
//! carries short recommendations, produced by a generative-text service when one
//! is configured and by fixed rules otherwise.
//!
//! ## Modules
//!
//! - **Individual pipeline**: `features`, `model`, `predictor`, `narrative`
//! - **Team pipeline**: `team` aggregates records and produces insight cards
//! - **Generative integration**: `genai` (client) and `extract` (reply decoding)

pub mod config;
pub mod error;
pub mod extract;
pub mod features;
pub mod genai;
pub mod model;
pub mod narrative;
pub mod pipeline;
pub mod predictor;
pub mod team;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ServiceConfig;
pub use error::PulseError;
pub use features::{FeatureAggregator, FeatureSet, FeatureVector};
pub use genai::{GeminiClient, GeminiConfig, GenerationError, GenerationOptions, TextGenerator};
pub use model::ModelArtifacts;
pub use pipeline::PulseService;
pub use predictor::{DomainPrediction, EmployeePredictions, PredictionOrchestrator};
pub use types::{
    BatchPredictRequest, BatchPredictResponse, Domain, EmployeeWindow, HealthStatus, InsightType,
    PredictionRecord, TeamInsight, TeamInsightsResponse, TeamSummary, WeeklyMetric,
};

/// Library version
pub const PULSE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and FFI
pub const PRODUCER_NAME: &str = "pulse-insights";
