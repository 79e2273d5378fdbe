use tracing::{debug, info, warn};

use super::StageAction;
use crate::api::{ApiClient, DecisionProcess, DecisionStage, ProcessEnvelope};
use crate::error::{ApiError, AppError, AppResult};

/// A discussion's decision process and its stages.
///
/// Stage changes are applied locally only after the backend accepts them.
/// A rejected change leaves every stage as it was and records the message.
pub struct DecisionBoard {
    client: ApiClient,
    discussion_id: String,
    process: Option<DecisionProcess>,
    stages: Vec<DecisionStage>,
    last_error: Option<String>,
}

impl DecisionBoard {
    pub fn new(client: ApiClient, discussion_id: impl Into<String>) -> Self {
        Self {
            client,
            discussion_id: discussion_id.into(),
            process: None,
            stages: Vec::new(),
            last_error: None,
        }
    }

    pub fn discussion_id(&self) -> &str {
        &self.discussion_id
    }

    /// `None` when no process has been started for the discussion.
    pub fn process(&self) -> Option<&DecisionProcess> {
        self.process.as_ref()
    }

    /// Stages in `order_index` order.
    pub fn stages(&self) -> &[DecisionStage] {
        &self.stages
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch the process. A 404 leaves the board empty without an error.
    pub async fn load(&mut self) -> AppResult<()> {
        match self.client.decision_process(&self.discussion_id).await {
            Ok(envelope) => {
                self.apply(envelope);
                self.last_error = None;
                Ok(())
            }
            Err(ApiError::NotFound { .. }) => {
                debug!(discussion_id = %self.discussion_id, "No decision process yet");
                self.process = None;
                self.stages.clear();
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    /// Start a process for the discussion. The title must not be blank.
    pub async fn create(&mut self, title: &str, template: Option<&str>) -> AppResult<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation {
                field: "title".to_string(),
                reason: "Title is required".to_string(),
            });
        }

        match self
            .client
            .create_decision_process(&self.discussion_id, title, template)
            .await
        {
            Ok(envelope) => {
                info!(
                    discussion_id = %self.discussion_id,
                    process_id = %envelope.process.id,
                    stages = envelope.stages.len(),
                    "Decision process created"
                );
                self.apply(envelope);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    /// Find a stage by id, or by its displayed number (`order_index + 1`).
    pub fn find_stage(&self, reference: &str) -> Option<&DecisionStage> {
        let reference = reference.trim();
        self.stages
            .iter()
            .find(|stage| stage.id == reference)
            .or_else(|| {
                let number: u32 = reference.parse().ok()?;
                self.stages
                    .iter()
                    .find(|stage| number >= 1 && stage.order_index == number - 1)
            })
    }

    /// Apply `action` to the stage named by `reference`.
    ///
    /// The action must be the one offered for the stage's current status.
    /// On success the stage takes the requested status; on failure nothing
    /// changes and the backend message is kept in [`last_error`].
    ///
    /// [`last_error`]: DecisionBoard::last_error
    pub async fn transition(
        &mut self,
        reference: &str,
        action: StageAction,
    ) -> AppResult<&DecisionStage> {
        let index = self
            .find_stage(reference)
            .and_then(|found| self.stages.iter().position(|s| s.id == found.id))
            .ok_or_else(|| AppError::Validation {
                field: "stage".to_string(),
                reason: format!("No stage matches '{}'", reference),
            })?;

        let current = self.stages[index].status;
        if !action.is_available(current) {
            return Err(AppError::Validation {
                field: "action".to_string(),
                reason: format!(
                    "Cannot {} a stage that is {}",
                    action,
                    current.label().to_lowercase()
                ),
            });
        }

        let target = action.target_status();
        let stage_id = self.stages[index].id.clone();

        match self.client.update_stage(&stage_id, target).await {
            Ok(()) => {
                info!(stage_id = %stage_id, status = %target, "Stage updated");
                self.stages[index].status = target;
                self.last_error = None;
                Ok(&self.stages[index])
            }
            Err(e) => {
                warn!(stage_id = %stage_id, error = %e, "Stage update rejected");
                self.last_error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }

    fn apply(&mut self, envelope: ProcessEnvelope) {
        let mut stages = envelope.stages;
        stages.sort_by_key(|stage| stage.order_index);
        self.process = Some(envelope.process);
        self.stages = stages;
    }
}
