use tracing::{debug, info};

use crate::api::{ApiClient, DecisionDocument};
use crate::error::{ApiError, AppError, AppResult};

/// The single document attached to a decision process.
pub struct DocumentEditor {
    client: ApiClient,
    process_id: String,
    document: Option<DecisionDocument>,
    last_error: Option<String>,
}

impl DocumentEditor {
    pub fn new(client: ApiClient, process_id: impl Into<String>) -> Self {
        Self {
            client,
            process_id: process_id.into(),
            document: None,
            last_error: None,
        }
    }

    pub fn document(&self) -> Option<&DecisionDocument> {
        self.document.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch the document; `None` when the process has none yet.
    pub async fn load(&mut self) -> AppResult<Option<&DecisionDocument>> {
        match self.client.decision_document(&self.process_id).await {
            Ok(document) => {
                self.document = Some(document);
                self.last_error = None;
            }
            Err(ApiError::NotFound { .. }) => {
                debug!(process_id = %self.process_id, "No decision document yet");
                self.document = None;
                self.last_error = None;
            }
            Err(e) => {
                self.last_error = Some(e.user_message().to_string());
                return Err(e.into());
            }
        }
        Ok(self.document.as_ref())
    }

    /// Create the document, or update it when one is already loaded.
    ///
    /// The backend assigns the version; the returned document carries it.
    pub async fn save(&mut self, title: &str, content: &str) -> AppResult<&DecisionDocument> {
        if title.trim().is_empty() {
            return Err(AppError::Validation {
                field: "title".to_string(),
                reason: "Title is required".to_string(),
            });
        }

        let result = match &self.document {
            Some(existing) => {
                self.client
                    .update_document(&existing.id, title, content)
                    .await
            }
            None => {
                self.client
                    .create_document(&self.process_id, title, content)
                    .await
            }
        };

        match result {
            Ok(saved) => {
                info!(
                    process_id = %self.process_id,
                    document_id = %saved.id,
                    version = saved.version,
                    "Decision document saved"
                );
                self.last_error = None;
                Ok(self.document.insert(saved))
            }
            Err(e) => {
                self.last_error = Some(e.user_message().to_string());
                Err(e.into())
            }
        }
    }
}
