use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::types::{
    Acknowledgement, AddMemberRequest, AddMemberResponse, AnalysisRecord, BiasDefinition,
    BiasListResponse, CreateDiscussionRequest, CreateProcessRequest, CreateWorkspaceRequest,
    DecisionDocument, Discussion, DiscussionAnalysisResponse,
    DiscussionListResponse, DocumentEnvelope, DocumentRequest, LoginRequest, LoginResponse,
    MemberListResponse, Message, MessageListResponse, PostMessageRequest, ProcessEnvelope,
    RegisterRequest, SeedBiasesResponse, StageStatus, UpdateStageRequest, UserProfile, Workspace,
    WorkspaceListResponse, WorkspaceMember,
};
use crate::config::{ApiConfig, RequestConfig};
use crate::error::{ApiError, ApiResult};
use crate::session::Session;

/// Client for the collective-intelligence REST backend.
///
/// Every request carries `Authorization: Bearer <token>` when the session
/// holds a token. Failures are never retried.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
    request_config: RequestConfig,
}

impl ApiClient {
    /// Create a new API client bound to a session
    pub fn new(config: &ApiConfig, request_config: RequestConfig, session: Session) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(|e| ApiError::RequestFailed {
                status: None,
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session whose token authenticates requests
    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> ApiResult<T> {
        let builder = self.client.get(format!("{}{}", self.base_url, path));
        self.execute(builder, path, fallback).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ApiResult<T> {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .json(body);
        self.execute(builder, path, fallback).await
    }

    /// Send a JSON body and accept any successful response, including an empty one
    async fn send_json_ignore_body<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ApiResult<()> {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .json(body);
        self.send_checked(builder, path, fallback).await?;
        Ok(())
    }

    /// Execute a single request and decode the body (internal)
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
        fallback: &str,
    ) -> ApiResult<T> {
        let response = self.send_checked(builder, path, fallback).await?;
        let status = response.status();

        response.json::<T>().await.map_err(|e| {
            warn!(path = %path, error = %e, "Failed to parse backend response");
            ApiError::RequestFailed {
                status: Some(status.as_u16()),
                message: format!("{} (invalid response)", fallback),
            }
        })
    }

    /// Send a request, mapping transport failures and non-2xx statuses
    async fn send_checked(
        &self,
        builder: RequestBuilder,
        path: &str,
        fallback: &str,
    ) -> ApiResult<Response> {
        let builder = match self.session.token() {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        };

        debug!(path = %path, "Calling backend");
        let start = Instant::now();

        let response = builder.send().await.map_err(|e| {
            warn!(path = %path, error = %e, "Backend request failed");
            ApiError::RequestFailed {
                status: None,
                message: if e.is_timeout() {
                    format!(
                        "{} (timeout after {}ms)",
                        fallback, self.request_config.timeout_ms
                    )
                } else {
                    fallback.to_string()
                },
            }
        })?;

        let status = response.status();
        let latency = start.elapsed();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_message(&body).unwrap_or_else(|| fallback.to_string());

            if status == StatusCode::NOT_FOUND {
                debug!(path = %path, latency_ms = latency.as_millis(), "Backend reported not found");
                return Err(ApiError::NotFound { message });
            }

            warn!(
                path = %path,
                status = status.as_u16(),
                latency_ms = latency.as_millis(),
                message = %message,
                "Backend returned error"
            );
            return Err(ApiError::RequestFailed {
                status: Some(status.as_u16()),
                message,
            });
        }

        info!(path = %path, latency_ms = latency.as_millis(), "Backend call succeeded");
        Ok(response)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Exchange credentials for a bearer token
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/users/login", &request, "Login failed")
            .await
    }

    /// Create a new account
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Acknowledgement> {
        self.send_json(Method::POST, "/users/register", request, "Registration failed")
            .await
    }

    /// Profile of the authenticated user
    pub async fn profile(&self) -> ApiResult<UserProfile> {
        self.get("/users/me", "Failed to fetch profile").await
    }

    // ------------------------------------------------------------------
    // Workspaces
    // ------------------------------------------------------------------

    pub async fn list_workspaces(&self) -> ApiResult<Vec<Workspace>> {
        let response: WorkspaceListResponse =
            self.get("/workspaces", "Failed to fetch workspaces").await?;
        Ok(response.workspaces)
    }

    pub async fn create_workspace(&self, name: &str, description: &str) -> ApiResult<Workspace> {
        let request = CreateWorkspaceRequest {
            name: name.to_string(),
            description: description.to_string(),
        };
        self.send_json(
            Method::POST,
            "/workspaces",
            &request,
            "Failed to create workspace",
        )
        .await
    }

    pub async fn get_workspace(&self, workspace_id: &str) -> ApiResult<Workspace> {
        self.get(
            &format!("/workspaces/{}", workspace_id),
            "Failed to fetch workspace data",
        )
        .await
    }

    pub async fn list_members(&self, workspace_id: &str) -> ApiResult<Vec<WorkspaceMember>> {
        let response: MemberListResponse = self
            .get(
                &format!("/workspaces/{}/members", workspace_id),
                "Failed to fetch members",
            )
            .await?;
        Ok(response.members)
    }

    pub async fn add_member(
        &self,
        workspace_id: &str,
        username: &str,
        role: Option<&str>,
    ) -> ApiResult<AddMemberResponse> {
        let request = AddMemberRequest {
            username: username.to_string(),
            role: role.map(str::to_string),
        };
        self.send_json(
            Method::POST,
            &format!("/workspaces/{}/members", workspace_id),
            &request,
            "Failed to add member",
        )
        .await
    }

    // ------------------------------------------------------------------
    // Discussions and messages
    // ------------------------------------------------------------------

    pub async fn list_discussions(&self, workspace_id: &str) -> ApiResult<Vec<Discussion>> {
        let response: DiscussionListResponse = self
            .get(
                &format!("/workspaces/{}/discussions", workspace_id),
                "Failed to fetch discussions",
            )
            .await?;
        Ok(response.discussions)
    }

    pub async fn create_discussion(
        &self,
        workspace_id: &str,
        title: &str,
        description: &str,
    ) -> ApiResult<Discussion> {
        let request = CreateDiscussionRequest {
            title: title.to_string(),
            description: description.to_string(),
        };
        self.send_json(
            Method::POST,
            &format!("/workspaces/{}/discussions", workspace_id),
            &request,
            "Failed to create discussion",
        )
        .await
    }

    pub async fn get_discussion(&self, discussion_id: &str) -> ApiResult<Discussion> {
        self.get(
            &format!("/discussions/{}", discussion_id),
            "Failed to fetch discussion",
        )
        .await
    }

    pub async fn list_messages(&self, discussion_id: &str) -> ApiResult<Vec<Message>> {
        let response: MessageListResponse = self
            .get(
                &format!("/discussions/{}/messages", discussion_id),
                "Failed to fetch discussion data",
            )
            .await?;
        Ok(response.messages)
    }

    pub async fn post_message(
        &self,
        discussion_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> ApiResult<Message> {
        let request = PostMessageRequest {
            content: content.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        self.send_json(
            Method::POST,
            &format!("/discussions/{}/messages", discussion_id),
            &request,
            "Failed to send message",
        )
        .await
    }

    // ------------------------------------------------------------------
    // Analysis
    // ------------------------------------------------------------------

    /// All analysis records for a discussion, in backend order
    pub async fn discussion_analysis(&self, discussion_id: &str) -> ApiResult<Vec<AnalysisRecord>> {
        let response: DiscussionAnalysisResponse = self
            .get(
                &format!("/discussions/{}/analysis", discussion_id),
                "Failed to fetch analyses",
            )
            .await?;
        Ok(response.analyses)
    }

    pub async fn message_analysis(&self, message_id: &str) -> ApiResult<AnalysisRecord> {
        self.get(
            &format!("/messages/{}/analysis", message_id),
            "Failed to fetch analysis",
        )
        .await
    }

    /// Ask the backend to analyze a message now
    pub async fn analyze_message(&self, message_id: &str) -> ApiResult<AnalysisRecord> {
        self.send_json(
            Method::POST,
            &format!("/messages/{}/analyze", message_id),
            &serde_json::json!({}),
            "Failed to analyze message",
        )
        .await
    }

    /// Fetch a message's analysis, triggering one when none exists yet
    pub async fn message_analysis_or_analyze(&self, message_id: &str) -> ApiResult<AnalysisRecord> {
        match self.message_analysis(message_id).await {
            Err(ApiError::NotFound { .. }) => {
                info!(message_id = %message_id, "No analysis yet, requesting one");
                self.analyze_message(message_id).await
            }
            other => other,
        }
    }

    pub async fn cognitive_biases(&self) -> ApiResult<Vec<BiasDefinition>> {
        let response: BiasListResponse = self
            .get("/biases", "Failed to fetch cognitive biases")
            .await?;
        Ok(response.biases)
    }

    /// Populate the bias catalogue with the backend's built-in set.
    /// A catalogue that already has entries is left alone.
    pub async fn seed_biases(&self) -> ApiResult<SeedBiasesResponse> {
        self.send_json(
            Method::POST,
            "/seed/biases",
            &serde_json::json!({}),
            "Failed to seed cognitive biases",
        )
        .await
    }

    // ------------------------------------------------------------------
    // Decision processes
    // ------------------------------------------------------------------

    pub async fn decision_process(&self, discussion_id: &str) -> ApiResult<ProcessEnvelope> {
        self.get(
            &format!("/discussions/{}/decision-process", discussion_id),
            "Failed to fetch decision process",
        )
        .await
    }

    pub async fn create_decision_process(
        &self,
        discussion_id: &str,
        title: &str,
        template: Option<&str>,
    ) -> ApiResult<ProcessEnvelope> {
        let request = CreateProcessRequest {
            title: title.to_string(),
            template: template.map(str::to_string),
        };
        self.send_json(
            Method::POST,
            &format!("/discussions/{}/decision-process", discussion_id),
            &request,
            "Failed to create decision process",
        )
        .await
    }

    /// Request a stage status change; the backend validates and applies it.
    /// The response body is not used.
    pub async fn update_stage(&self, stage_id: &str, status: StageStatus) -> ApiResult<()> {
        self.send_json_ignore_body(
            Method::PATCH,
            &format!("/decision-stages/{}", stage_id),
            &UpdateStageRequest { status },
            "Failed to update stage status",
        )
        .await
    }

    pub async fn decision_document(&self, process_id: &str) -> ApiResult<DecisionDocument> {
        let envelope: DocumentEnvelope = self
            .get(
                &format!("/decision-processes/{}/document", process_id),
                "Failed to fetch document",
            )
            .await?;
        Ok(envelope.document)
    }

    pub async fn create_document(
        &self,
        process_id: &str,
        title: &str,
        content: &str,
    ) -> ApiResult<DecisionDocument> {
        let envelope: DocumentEnvelope = self
            .send_json(
                Method::POST,
                &format!("/decision-processes/{}/document", process_id),
                &DocumentRequest {
                    title: title.to_string(),
                    content: content.to_string(),
                },
                "Failed to create document",
            )
            .await?;
        Ok(envelope.document)
    }

    pub async fn update_document(
        &self,
        document_id: &str,
        title: &str,
        content: &str,
    ) -> ApiResult<DecisionDocument> {
        let envelope: DocumentEnvelope = self
            .send_json(
                Method::PUT,
                &format!("/decision-documents/{}", document_id),
                &DocumentRequest {
                    title: title.to_string(),
                    content: content.to_string(),
                },
                "Failed to update document",
            )
            .await?;
        Ok(envelope.document)
    }
}

/// Pull the `message` field out of an error body, if there is one.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}
