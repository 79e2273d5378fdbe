//! Discussion analysis retrieval with stale-response suppression.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::api::{AnalysisRecord, ApiClient, DetectedBias, DetectedBiases, PerspectiveVector};
use crate::error::{ApiError, ApiResult, AppError, AppResult};

/// Latest known analysis data for one component.
#[derive(Debug, Clone, Default)]
pub enum AnalysisState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Records from the most recent request. May be empty.
    Loaded {
        discussion_id: String,
        records: Arc<[AnalysisRecord]>,
    },
    /// The most recent request failed with a displayable message.
    Failed {
        discussion_id: String,
        message: String,
    },
}

impl AnalysisState {
    /// Records currently held; empty unless loaded.
    pub fn records(&self) -> &[AnalysisRecord] {
        match self {
            AnalysisState::Loaded { records, .. } => &records[..],
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Result of a [`AnalysisFetcher::refresh`].
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The response was the newest and now defines the state.
    Applied(AnalysisState),
    /// A newer refresh started while this one was in flight; its response
    /// was dropped.
    Superseded { generation: u64 },
}

/// Retrieves discussion analyses and keeps only the newest answer.
///
/// Every refresh takes a fresh generation number. When a response arrives
/// after a later refresh has started, it is discarded instead of
/// overwriting the newer state.
pub struct AnalysisFetcher {
    client: ApiClient,
    offline_fixtures: bool,
    generation: AtomicU64,
    state: Mutex<AnalysisState>,
}

impl AnalysisFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            offline_fixtures: false,
            generation: AtomicU64::new(0),
            state: Mutex::new(AnalysisState::Idle),
        }
    }

    /// Substitute [`fixture_records`] when the backend has no analysis.
    pub fn with_offline_fixtures(mut self, enabled: bool) -> Self {
        self.offline_fixtures = enabled;
        self
    }

    /// Fetch all records for a discussion without touching component state.
    ///
    /// A 404 means nothing has been analyzed yet and yields an empty list
    /// (or the fixture list in offline mode).
    pub async fn fetch(&self, discussion_id: &str) -> ApiResult<Vec<AnalysisRecord>> {
        match self.client.discussion_analysis(discussion_id).await {
            Ok(records) => {
                debug!(
                    discussion_id = %discussion_id,
                    records = records.len(),
                    "Fetched discussion analyses"
                );
                Ok(records)
            }
            Err(ApiError::NotFound { .. }) if self.offline_fixtures => {
                info!(discussion_id = %discussion_id, "No analysis yet, using fixture data");
                Ok(fixture_records())
            }
            Err(ApiError::NotFound { .. }) => {
                debug!(discussion_id = %discussion_id, "No analysis yet");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Re-fetch for `discussion_id` and apply the result unless superseded.
    ///
    /// A blank id is rejected before any request is made.
    pub async fn refresh(&self, discussion_id: &str) -> AppResult<FetchOutcome> {
        if discussion_id.trim().is_empty() {
            return Err(AppError::Validation {
                field: "discussion_id".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.fetch(discussion_id).await;

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(
                discussion_id = %discussion_id,
                generation,
                "Dropping stale analysis response"
            );
            return Ok(FetchOutcome::Superseded { generation });
        }

        *state = match result {
            Ok(records) => AnalysisState::Loaded {
                discussion_id: discussion_id.to_string(),
                records: records.into(),
            },
            Err(e) => {
                warn!(discussion_id = %discussion_id, error = %e, "Analysis fetch failed");
                AnalysisState::Failed {
                    discussion_id: discussion_id.to_string(),
                    message: e.user_message().to_string(),
                }
            }
        };

        Ok(FetchOutcome::Applied(state.clone()))
    }

    /// Current component state.
    pub fn state(&self) -> AnalysisState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Generation of the most recently started refresh.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Demo record shown in offline mode when a discussion has no analysis.
pub fn fixture_records() -> Vec<AnalysisRecord> {
    vec![AnalysisRecord {
        id: "1".to_string(),
        message_id: "123".to_string(),
        sentiment_score: 0.5,
        perspective_vector: PerspectiveVector::default(),
        detected_biases: DetectedBiases {
            biases: vec![
                DetectedBias::new("Confirmation Bias", 0.7).with_evidence("Sample evidence"),
                DetectedBias::new("Anchoring Bias", 0.4).with_evidence("Sample evidence"),
            ],
        },
        analyzed_at: Utc::now(),
    }]
}
