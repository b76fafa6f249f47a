//! Pipeline orchestration
//!
//! This module provides the public API for Pulse Insights. A [`PulseService`]
//! is built once at startup from loaded artifacts and an optional generative
//! backend, then serves any number of requests:
//!
//! 1. FeatureAggregator - window selection and feature vectors
//! 2. PredictionOrchestrator - scaling, classification and label decoding
//! 3. NarrativeGenerator - recommendations and explanation
//!
//! Team insights run through the TeamInsightSynthesizer.

use std::sync::Arc;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::PulseError;
use crate::features::FeatureAggregator;
use crate::genai::{GeminiClient, TextGenerator};
use crate::model::ModelArtifacts;
use crate::narrative::{NarrativeGenerator, NarrativeSource};
use crate::predictor::{PredictionOrchestrator, TOP_FEATURE_COUNT};
use crate::team::{summarize_team, TeamInsightSynthesizer};
use crate::types::{
    BatchPredictRequest, BatchPredictResponse, EmployeeWindow, HealthStatus, PredictionRecord,
    TeamInsightsResponse, TeamSummary,
};

/// Request-scoped scoring and insight service over shared artifacts
#[derive(Clone)]
pub struct PulseService {
    orchestrator: PredictionOrchestrator,
    narratives: NarrativeGenerator,
    team: TeamInsightSynthesizer,
    top_features: usize,
}

impl PulseService {
    /// Create a service from loaded artifacts and an optional generative backend
    pub fn new(artifacts: Arc<ModelArtifacts>, generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            orchestrator: PredictionOrchestrator::new(artifacts),
            narratives: NarrativeGenerator::new(generator.clone()),
            team: TeamInsightSynthesizer::new(generator),
            top_features: TOP_FEATURE_COUNT,
        }
    }

    /// Load artifacts and connect the generative backend described by `config`.
    ///
    /// Fails when any artifact is missing or inconsistent.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, PulseError> {
        let artifacts = ModelArtifacts::load(&config.model_dir)?;

        let generator: Option<Arc<dyn TextGenerator>> = match &config.gemini {
            Some(gemini) => Some(Arc::new(GeminiClient::new(gemini.clone()))),
            None => {
                tracing::info!("GEMINI_API_KEY not set, narratives use fallback rules only");
                None
            }
        };

        Ok(Self::new(Arc::new(artifacts), generator).with_top_features(config.top_features))
    }

    /// Set the number of representative features kept by `summarize_team`
    pub fn with_top_features(mut self, top_features: usize) -> Self {
        self.top_features = top_features;
        self
    }

    pub fn genai_enabled(&self) -> bool {
        self.narratives.is_generative()
    }

    /// Liveness status
    pub fn health(&self) -> HealthStatus {
        HealthStatus::ok()
    }

    /// Score a batch of employees.
    ///
    /// Employees with fewer than four weeks of history are skipped; the
    /// remaining results keep input order.
    pub fn predict_batch(&self, request: &BatchPredictRequest) -> Result<BatchPredictResponse, PulseError> {
        let span = tracing::info_span!(
            "predict_batch",
            request_id = %Uuid::new_v4(),
            employees = request.employees.len()
        );
        let _guard = span.enter();

        let mut results = Vec::with_capacity(request.employees.len());
        let mut skipped = 0usize;

        for employee in &request.employees {
            match self.predict_employee(employee) {
                Ok(record) => results.push(record),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(employee_id = employee.employee_id, error = %e, "skipping employee");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(scored = results.len(), skipped, "batch prediction complete");

        Ok(BatchPredictResponse { results })
    }

    /// Score one employee
    pub fn predict_employee(&self, employee: &EmployeeWindow) -> Result<PredictionRecord, PulseError> {
        let features = FeatureAggregator::aggregate(employee)?;
        let predictions = self.orchestrator.predict(&features)?;
        let narrative = self.narratives.generate(employee.employee_id, &predictions);

        if narrative.source == NarrativeSource::Fallback && self.narratives.is_generative() {
            tracing::debug!(employee_id = employee.employee_id, "narrative from fallback rules");
        }

        Ok(PredictionRecord {
            employee_id: employee.employee_id,
            window_start: features.window_start,
            window_end: features.window_end,
            burnout_risk: predictions.burnout.label,
            burnout_confidence: predictions.burnout.confidence,
            burnout_top_features: predictions.burnout.top_features,
            performance_trend: predictions.performance.label,
            performance_confidence: predictions.performance.confidence,
            performance_top_features: predictions.performance.top_features,
            growth_potential: predictions.growth.label,
            growth_confidence: predictions.growth.confidence,
            growth_top_features: predictions.growth.top_features,
            recommendations: narrative.recommendations,
            explanation: narrative.explanation,
        })
    }

    /// Team-level insight cards (0 to 4)
    pub fn team_insights(&self, summary: &TeamSummary) -> TeamInsightsResponse {
        let span = tracing::info_span!("team_insights", request_id = %Uuid::new_v4());
        let _guard = span.enter();

        let insights = self.team.synthesize(summary);
        tracing::info!(insights = insights.len(), "team insights complete");

        TeamInsightsResponse { insights }
    }

    /// Aggregate prediction records into a team summary
    pub fn summarize_team(&self, records: &[PredictionRecord]) -> TeamSummary {
        summarize_team(records, self.top_features)
    }

    /// `predict_batch` over JSON strings
    pub fn predict_batch_json(&self, request_json: &str) -> Result<String, PulseError> {
        let request: BatchPredictRequest = parse_request(request_json)?;
        let response = self.predict_batch(&request)?;
        Ok(serde_json::to_string(&response)?)
    }

    /// `team_insights` over JSON strings
    pub fn team_insights_json(&self, summary_json: &str) -> Result<String, PulseError> {
        let summary: TeamSummary = parse_request(summary_json)?;
        Ok(serde_json::to_string(&self.team_insights(&summary))?)
    }

    /// `summarize_team` over a serialized BatchPredictResponse
    pub fn summarize_team_json(&self, response_json: &str) -> Result<String, PulseError> {
        let response: BatchPredictResponse = parse_request(response_json)?;
        Ok(serde_json::to_string(&self.summarize_team(&response.results))?)
    }

    pub fn health_json(&self) -> Result<String, PulseError> {
        Ok(serde_json::to_string(&self.health())?)
    }
}

/// Decode a request body, reporting shape problems as invalid requests
fn parse_request<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, PulseError> {
    serde_json::from_str(json).map_err(|e| PulseError::InvalidRequest(e.to_string()))
}
