use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamp codec accepting both RFC 3339 and the backend's naive ISO format.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Parse a timestamp; offset-less values are taken as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_some(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp: {}", raw))
                }),
                None => Ok(None),
            }
        }
    }
}

/// Decode `null` as the type's default.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ============================================================================
// Analysis
// ============================================================================

/// Backend-computed analysis of one message. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub message_id: String,
    /// Nominally in [-1, 1]
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentiment_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub perspective_vector: PerspectiveVector,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detected_biases: DetectedBiases,
    #[serde(with = "timestamp")]
    pub analyzed_at: DateTime<Utc>,
}

/// Named dimensions with parallel coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveVector {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Wrapper object the backend stores biases in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedBiases {
    #[serde(default, deserialize_with = "null_as_default")]
    pub biases: Vec<DetectedBias>,
}

/// A single bias attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedBias {
    pub name: String,
    /// In [0, 1]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: String,
}

/// Response of `GET /discussions/{id}/analysis`
#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionAnalysisResponse {
    #[serde(default)]
    pub discussion_id: Option<String>,
    #[serde(default)]
    pub message_count: Option<usize>,
    #[serde(default)]
    pub analyzed_messages: Option<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub analyses: Vec<AnalysisRecord>,
}

/// Cognitive bias catalogue entry from `GET /biases`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detection_patterns: Vec<String>,
    #[serde(default)]
    pub mitigation_strategies: Option<String>,
}

/// `POST /seed/biases` reply. `count` is absent when the catalogue was
/// already populated.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedBiasesResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BiasListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub biases: Vec<BiasDefinition>,
}

// ============================================================================
// Users, workspaces, discussions
// ============================================================================

/// Credentials for `POST /users/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token issued on login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub username: String,
}

/// Body of `POST /users/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Plain `{message}` acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: String,
}

/// Authenticated user as returned by `GET /users/me`
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkspaceListResponse {
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub workspace_id: String,
    pub user_id: String,
    pub role: String,
    #[serde(default, with = "timestamp::option")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MemberListResponse {
    #[serde(default)]
    pub members: Vec<WorkspaceMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddMemberRequest {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Response of `POST /workspaces/{id}/members`
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberResponse {
    #[serde(default)]
    pub message: String,
    pub member: WorkspaceMember,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DiscussionListResponse {
    #[serde(default)]
    pub discussions: Vec<Discussion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDiscussionRequest {
    pub title: String,
    pub description: String,
}

/// A message in a threaded discussion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub discussion_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub content: String,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

// ============================================================================
// Decision processes
// ============================================================================

/// Overall process status. Values this client does not know decode as
/// `Other` and display like an unfinished process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    #[default]
    Active,
    InProgress,
    Completed,
    #[serde(other)]
    Other,
}

impl ProcessStatus {
    /// Display label; anything not completed reads as in progress.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessStatus::Completed => "Completed",
            ProcessStatus::Active | ProcessStatus::InProgress | ProcessStatus::Other => {
                "In Progress"
            }
        }
    }
}

/// Status of a single stage. Unknown wire values decode as `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    InProgress,
    Completed,
    #[default]
    #[serde(other)]
    Pending,
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Pending => "Pending",
            StageStatus::InProgress => "In Progress",
            StageStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Pending => write!(f, "pending"),
            StageStatus::InProgress => write!(f, "in_progress"),
            StageStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for StageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StageStatus::Pending),
            "in_progress" | "in-progress" => Ok(StageStatus::InProgress),
            "completed" => Ok(StageStatus::Completed),
            _ => Err(format!("Unknown stage status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionProcess {
    pub id: String,
    pub discussion_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ProcessStatus,
    #[serde(default)]
    pub process_template: Option<String>,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStage {
    pub id: String,
    pub process_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub order_index: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: StageStatus,
    #[serde(default, with = "timestamp::option")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// `{ process, stages[] }` as returned by the decision-process endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessEnvelope {
    pub process: DecisionProcess,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stages: Vec<DecisionStage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProcessRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateStageRequest {
    pub status: StageStatus,
}

/// Versioned decision document; the backend bumps `version` on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionDocument {
    pub id: String,
    pub process_id: String,
    pub title: String,
    pub content: String,
    pub version: u32,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DocumentEnvelope {
    pub document: DecisionDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRequest {
    pub title: String,
    pub content: String,
}

impl DetectedBias {
    /// Create a bias entry
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
            evidence: String::new(),
        }
    }

    /// Attach evidence text
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }
}

impl AnalysisRecord {
    /// Create a record with neutral sentiment and no vector or biases
    pub fn new(id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message_id: message_id.into(),
            sentiment_score: 0.0,
            perspective_vector: PerspectiveVector::default(),
            detected_biases: DetectedBiases::default(),
            analyzed_at: Utc::now(),
        }
    }

    /// Set the sentiment score
    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment_score = sentiment;
        self
    }

    /// Set perspective coordinates, naming dimensions generically
    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.perspective_vector = PerspectiveVector {
            dimensions: (0..values.len()).map(|i| format!("dim_{}", i)).collect(),
            values,
        };
        self
    }

    /// Append a detected bias
    pub fn with_bias(mut self, bias: DetectedBias) -> Self {
        self.detected_biases.biases.push(bias);
        self
    }
}
