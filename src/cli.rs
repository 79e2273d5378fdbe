//! Command-line interface.
//!
//! Each subcommand maps onto one backend view (workspaces, discussions,
//! insights, decision process) and renders it as text. Commands never panic
//! on backend failures; they return a [`CliResult`] carrying the message and
//! a non-zero exit code.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use tracing::info;

use crate::analysis::{AnalysisFetcher, AnalysisState, CoordinatePolicy, DiscussionInsights, FetchOutcome};
use crate::api::{AnalysisRecord, ApiClient, Message, RegisterRequest};
use crate::config::InsightsConfig;
use crate::decision::{DecisionBoard, DocumentEditor, StageAction};
use crate::error::AppError;
use crate::render;

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Create a new account
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Workspace management
    #[command(subcommand)]
    Workspaces(WorkspaceCommands),

    /// Discussions in a workspace
    #[command(subcommand)]
    Discussions(DiscussionCommands),

    /// Messages in a discussion
    #[command(subcommand)]
    Messages(MessageCommands),

    /// Bias ranking and perspective map for a discussion
    Insights {
        discussion_id: String,

        /// Also write the perspective map as SVG
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Out-of-range coordinates: pass-through or clamp
        #[arg(long)]
        coordinates: Option<CoordinatePolicy>,
    },

    /// Analysis of a single message, requesting one if none exists
    Analysis { message_id: String },

    /// The cognitive bias catalogue
    Biases {
        /// Populate the catalogue first if it is empty
        #[arg(long)]
        seed: bool,
    },

    /// Decision process of a discussion
    #[command(subcommand)]
    Decision(DecisionCommands),

    /// Decision document of a discussion's process
    #[command(subcommand)]
    Document(DocumentCommands),
}

#[derive(Subcommand, Debug, Clone)]
pub enum WorkspaceCommands {
    /// List workspaces you belong to
    List,

    /// Create a workspace
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show a workspace (defaults to the current one)
    Show { workspace_id: Option<String> },

    /// List members (defaults to the current workspace)
    Members { workspace_id: Option<String> },

    /// Add a member by username
    AddMember {
        username: String,
        /// Role to grant, e.g. member or admin
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        workspace: Option<String>,
    },

    /// Make a workspace the current one
    Use { workspace_id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DiscussionCommands {
    /// List discussions (defaults to the current workspace)
    List {
        #[arg(long)]
        workspace: Option<String>,
    },

    /// Start a discussion
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        workspace: Option<String>,
    },

    /// Show a discussion
    Show { discussion_id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum MessageCommands {
    /// Show the message thread
    List { discussion_id: String },

    /// Post a message, optionally as a reply
    Post {
        discussion_id: String,
        content: String,
        #[arg(long)]
        reply_to: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DecisionCommands {
    /// Show the process and its stages
    Show { discussion_id: String },

    /// Start a decision process
    Create {
        discussion_id: String,
        title: String,
        #[arg(long)]
        template: Option<String>,
    },

    /// Start a pending stage (by id or number)
    Start { discussion_id: String, stage: String },

    /// Complete an in-progress stage
    Complete { discussion_id: String, stage: String },

    /// Reopen a completed stage
    Reopen { discussion_id: String, stage: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DocumentCommands {
    /// Show the decision document
    Show { discussion_id: String },

    /// Create or update the decision document
    Save {
        discussion_id: String,
        #[arg(long)]
        title: String,
        /// Document body
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the body from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

impl From<AppError> for CliResult {
    fn from(error: AppError) -> Self {
        CliResult::error(format!("Error: {}", error_message(&error)))
    }
}

/// What a command needs to run.
pub struct CliContext {
    pub client: ApiClient,
    pub insights: InsightsConfig,
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, ctx: &CliContext) -> CliResult {
    let result = match command {
        Commands::Login { username, password } => execute_login(ctx, &username, &password).await,
        Commands::Register {
            username,
            email,
            password,
        } => execute_register(ctx, username, email, password).await,
        Commands::Logout => execute_logout(ctx).await,
        Commands::Whoami => execute_whoami(ctx).await,
        Commands::Workspaces(cmd) => execute_workspaces(ctx, cmd).await,
        Commands::Discussions(cmd) => execute_discussions(ctx, cmd).await,
        Commands::Messages(cmd) => execute_messages(ctx, cmd).await,
        Commands::Insights {
            discussion_id,
            svg,
            coordinates,
        } => {
            let policy = coordinates.unwrap_or(ctx.insights.coordinate_policy);
            return execute_insights(ctx, &discussion_id, svg, policy).await;
        }
        Commands::Analysis { message_id } => execute_analysis(ctx, &message_id).await,
        Commands::Biases { seed } => execute_biases(ctx, seed).await,
        Commands::Decision(cmd) => execute_decision(ctx, cmd).await,
        Commands::Document(cmd) => execute_document(ctx, cmd).await,
    };

    match result {
        Ok(output) => CliResult::success(output),
        Err(e) => e.into(),
    }
}

type CommandOutput = Result<String, AppError>;

// ============================================================================
// Account
// ============================================================================

async fn execute_login(ctx: &CliContext, username: &str, password: &str) -> CommandOutput {
    let response = ctx.client.login(username, password).await?;
    ctx.client
        .session()
        .login(&response.token, &response.user_id)
        .await?;
    info!(user_id = %response.user_id, "Logged in");
    Ok(format!("Logged in as {}\n", response.username))
}

async fn execute_register(
    ctx: &CliContext,
    username: String,
    email: String,
    password: String,
) -> CommandOutput {
    let ack = ctx
        .client
        .register(&RegisterRequest {
            username,
            email,
            password,
        })
        .await?;
    let message = if ack.message.is_empty() {
        "Registration successful".to_string()
    } else {
        ack.message
    };
    Ok(format!("{}\n", message))
}

async fn execute_logout(ctx: &CliContext) -> CommandOutput {
    ctx.client.session().logout().await?;
    Ok("Logged out\n".to_string())
}

async fn execute_whoami(ctx: &CliContext) -> CommandOutput {
    require_login(ctx)?;
    let profile = ctx.client.profile().await?;

    let mut output = render::heading("Current User");
    output.push_str(&format!("Username: {}\n", profile.username));
    output.push_str(&format!("User ID:  {}\n", profile.id));
    if let Some(email) = profile.email {
        output.push_str(&format!("Email:    {}\n", email));
    }
    if let Some(workspace) = ctx.client.session().current_workspace_id() {
        output.push_str(&format!("Workspace: {}\n", workspace));
    }
    Ok(output)
}

// ============================================================================
// Workspaces, discussions, messages
// ============================================================================

async fn execute_workspaces(ctx: &CliContext, command: WorkspaceCommands) -> CommandOutput {
    match command {
        WorkspaceCommands::List => {
            let workspaces = ctx.client.list_workspaces().await?;
            let current = ctx.client.session().current_workspace_id();

            let mut output = render::heading("Workspaces");
            if workspaces.is_empty() {
                output.push_str("No workspaces yet.\n");
            }
            for ws in workspaces {
                let marker = if current.as_deref() == Some(ws.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                output.push_str(&format!("{} {:<38} {}\n", marker, ws.id, ws.name));
            }
            Ok(output)
        }
        WorkspaceCommands::Create { name, description } => {
            if name.trim().is_empty() {
                return Err(required("name"));
            }
            let ws = ctx.client.create_workspace(name.trim(), &description).await?;
            Ok(format!("Created workspace {} ({})\n", ws.name, ws.id))
        }
        WorkspaceCommands::Show { workspace_id } => {
            let id = resolve_workspace(ctx, workspace_id)?;
            let ws = ctx.client.get_workspace(&id).await?;

            let mut output = render::heading(&ws.name);
            output.push_str(&format!("ID: {}\n", ws.id));
            if let Some(description) = ws.description.filter(|d| !d.is_empty()) {
                output.push_str(&format!("{}\n", description));
            }
            output.push_str(&format!("Created: {}\n", format_time(ws.created_at)));
            Ok(output)
        }
        WorkspaceCommands::Members { workspace_id } => {
            let id = resolve_workspace(ctx, workspace_id)?;
            let members = ctx.client.list_members(&id).await?;

            let mut output = render::heading("Members");
            for member in members {
                output.push_str(&format!(
                    "  {:<24} {:<8} joined {}\n",
                    member.username.as_deref().unwrap_or(&member.user_id),
                    member.role,
                    format_time(member.joined_at)
                ));
            }
            Ok(output)
        }
        WorkspaceCommands::AddMember {
            username,
            role,
            workspace,
        } => {
            if username.trim().is_empty() {
                return Err(required("username"));
            }
            let id = resolve_workspace(ctx, workspace)?;
            let response = ctx
                .client
                .add_member(&id, username.trim(), role.as_deref())
                .await?;
            Ok(format!(
                "Added {} as {}\n",
                response.member.username.as_deref().unwrap_or(username.trim()),
                response.member.role
            ))
        }
        WorkspaceCommands::Use { workspace_id } => {
            let ws = ctx.client.get_workspace(&workspace_id).await?;
            ctx.client.session().set_current_workspace(&ws.id).await?;
            Ok(format!("Now using workspace {} ({})\n", ws.name, ws.id))
        }
    }
}

async fn execute_discussions(ctx: &CliContext, command: DiscussionCommands) -> CommandOutput {
    match command {
        DiscussionCommands::List { workspace } => {
            let id = resolve_workspace(ctx, workspace)?;
            let discussions = ctx.client.list_discussions(&id).await?;

            let mut output = render::heading("Discussions");
            if discussions.is_empty() {
                output.push_str("No discussions yet.\n");
            }
            for d in discussions {
                output.push_str(&format!(
                    "  {:<38} {:<10} {}\n",
                    d.id,
                    d.status.as_deref().unwrap_or("active"),
                    d.title
                ));
            }
            Ok(output)
        }
        DiscussionCommands::Create {
            title,
            description,
            workspace,
        } => {
            if title.trim().is_empty() {
                return Err(required("title"));
            }
            let id = resolve_workspace(ctx, workspace)?;
            let d = ctx
                .client
                .create_discussion(&id, title.trim(), &description)
                .await?;
            Ok(format!("Created discussion {} ({})\n", d.title, d.id))
        }
        DiscussionCommands::Show { discussion_id } => {
            let d = ctx.client.get_discussion(&discussion_id).await?;

            let mut output = render::heading(&d.title);
            output.push_str(&format!("ID: {}\n", d.id));
            output.push_str(&format!("Workspace: {}\n", d.workspace_id));
            if let Some(description) = d.description.filter(|s| !s.is_empty()) {
                output.push_str(&format!("{}\n", description));
            }
            Ok(output)
        }
    }
}

async fn execute_messages(ctx: &CliContext, command: MessageCommands) -> CommandOutput {
    match command {
        MessageCommands::List { discussion_id } => {
            let messages = ctx.client.list_messages(&discussion_id).await?;
            let mut output = render::heading("Messages");
            if messages.is_empty() {
                output.push_str("No messages yet.\n");
            }
            output.push_str(&render_thread(&messages));
            Ok(output)
        }
        MessageCommands::Post {
            discussion_id,
            content,
            reply_to,
        } => {
            if content.trim().is_empty() {
                return Err(required("content"));
            }
            let message = ctx
                .client
                .post_message(&discussion_id, &content, reply_to.as_deref())
                .await?;
            Ok(format!("Posted message {}\n", message.id))
        }
    }
}

/// Render messages as a reply tree, roots first, each subtree in backend order.
fn render_thread(messages: &[Message]) -> String {
    let ids: HashSet<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    let mut children: HashMap<Option<&str>, Vec<&Message>> = HashMap::new();
    for message in messages {
        // Replies to unknown parents are shown at top level
        let parent = message
            .parent_id
            .as_deref()
            .filter(|p| ids.contains(p));
        children.entry(parent).or_default().push(message);
    }

    let mut output = String::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let roots = children.get(&None).cloned().unwrap_or_default();

    // Messages caught in a parent cycle never hang off a root; they start
    // their own top-level branch in list order.
    for start in roots.into_iter().chain(messages.iter()) {
        if visited.contains(start.id.as_str()) {
            continue;
        }

        let mut stack: Vec<(&Message, usize)> = vec![(start, 0)];
        while let Some((message, depth)) = stack.pop() {
            if !visited.insert(message.id.as_str()) {
                continue;
            }
            let indent = "  ".repeat(depth + 1);
            output.push_str(&format!(
                "{}{} ({}): {}\n",
                indent,
                message.username.as_deref().unwrap_or(&message.user_id),
                format_time(message.created_at),
                message.content
            ));
            if let Some(replies) = children.get(&Some(message.id.as_str())) {
                stack.extend(replies.iter().rev().map(|m| (*m, depth + 1)));
            }
        }
    }
    output
}

// ============================================================================
// Insights
// ============================================================================

async fn execute_insights(
    ctx: &CliContext,
    discussion_id: &str,
    svg_path: Option<PathBuf>,
    policy: CoordinatePolicy,
) -> CliResult {
    let fetcher = AnalysisFetcher::new(ctx.client.clone())
        .with_offline_fixtures(ctx.insights.offline_fixtures);

    let state = match fetcher.refresh(discussion_id).await {
        Ok(FetchOutcome::Applied(state)) => state,
        Ok(FetchOutcome::Superseded { .. }) => fetcher.state(),
        Err(e) => return e.into(),
    };

    if let AnalysisState::Failed { message, .. } = &state {
        let mut output = render::heading("Potential Biases");
        output.push_str(&format!("{}\n", message));
        output.push_str(&render::heading("Perspective Map"));
        output.push_str(&format!("{}\n", message));
        return CliResult::error(output);
    }

    let insights = DiscussionInsights::from_state(&state);
    let map = insights.perspective_map(policy);

    let mut output = render::bias_panel(&insights.biases());
    output.push_str(&render::perspective_panel(map.as_ref()));

    if let Some(path) = svg_path {
        match &map {
            Some(map) => {
                let document = render::perspective_svg(map);
                if let Err(e) = std::fs::write(&path, document) {
                    let error = AppError::Render {
                        message: format!("Failed to write {}: {}", path.display(), e),
                    };
                    output.push_str(&format!("\n{}\n", error));
                    return CliResult::error(output);
                }
                output.push_str(&format!("\nSVG written to {}\n", path.display()));
            }
            None => output.push_str("\nNo SVG written: nothing to plot.\n"),
        }
    }

    CliResult::success(output)
}

async fn execute_analysis(ctx: &CliContext, message_id: &str) -> CommandOutput {
    let record = ctx.client.message_analysis_or_analyze(message_id).await?;
    Ok(format_analysis(&record))
}

fn format_analysis(record: &AnalysisRecord) -> String {
    let mut output = render::heading("Message Analysis");
    output.push_str(&format!("Message:   {}\n", record.message_id));
    output.push_str(&format!("Sentiment: {:+.2}\n", record.sentiment_score));
    output.push_str(&format!(
        "Analyzed:  {}\n\n",
        record.analyzed_at.format("%Y-%m-%d %H:%M")
    ));

    let vector = &record.perspective_vector;
    if !vector.values.is_empty() {
        output.push_str("Perspective:\n");
        for (i, value) in vector.values.iter().enumerate() {
            let name = vector
                .dimensions
                .get(i)
                .map(String::as_str)
                .unwrap_or("?");
            output.push_str(&format!("  {:<20} {:.2}\n", name, value));
        }
        output.push('\n');
    }

    let biases = &record.detected_biases.biases;
    if biases.is_empty() {
        output.push_str("No biases detected.\n");
    } else {
        output.push_str("Biases:\n");
        for bias in biases {
            output.push_str(&format!("  {:<28} {:.0}%\n", bias.name, bias.confidence * 100.0));
            if !bias.evidence.is_empty() {
                output.push_str(&format!("    \"{}\"\n", bias.evidence));
            }
        }
    }
    output
}

async fn execute_biases(ctx: &CliContext, seed: bool) -> CommandOutput {
    let mut output = String::new();
    if seed {
        let seeded = ctx.client.seed_biases().await?;
        info!(count = ?seeded.count, "Seeded bias catalogue");
        output.push_str(&seeded.message);
        if let Some(count) = seeded.count {
            output.push_str(&format!(" ({} added)", count));
        }
        output.push_str("\n\n");
    }

    let biases = ctx.client.cognitive_biases().await?;

    output.push_str(&render::heading("Cognitive Biases"));
    for bias in biases {
        output.push_str(&format!("{}\n  {}\n", bias.name, bias.description));
        if let Some(mitigation) = bias.mitigation_strategies.filter(|m| !m.is_empty()) {
            output.push_str(&format!("  Mitigation: {}\n", mitigation));
        }
        output.push('\n');
    }
    Ok(output)
}

// ============================================================================
// Decision processes
// ============================================================================

async fn execute_decision(ctx: &CliContext, command: DecisionCommands) -> CommandOutput {
    let (discussion_id, stage_change) = match &command {
        DecisionCommands::Start { discussion_id, stage } => {
            (discussion_id, Some((stage, StageAction::Start)))
        }
        DecisionCommands::Complete { discussion_id, stage } => {
            (discussion_id, Some((stage, StageAction::Complete)))
        }
        DecisionCommands::Reopen { discussion_id, stage } => {
            (discussion_id, Some((stage, StageAction::Reopen)))
        }
        DecisionCommands::Show { discussion_id } | DecisionCommands::Create { discussion_id, .. } => {
            (discussion_id, None)
        }
    };

    let mut board = DecisionBoard::new(ctx.client.clone(), discussion_id.clone());

    if let DecisionCommands::Create {
        title, template, ..
    } = &command
    {
        board.create(title, template.as_deref()).await?;
        return Ok(render::decision_panel(board.process(), board.stages()));
    }

    board.load().await?;

    if let Some((stage, action)) = stage_change {
        if board.process().is_none() {
            return Err(no_process_error(discussion_id));
        }
        let updated = board.transition(stage, action).await?;
        let mut output = format!(
            "Stage {}. {} is now {}\n",
            updated.order_index + 1,
            updated.name,
            updated.status.label()
        );
        output.push_str(&render::decision_panel(board.process(), board.stages()));
        return Ok(output);
    }

    Ok(render::decision_panel(board.process(), board.stages()))
}

async fn execute_document(ctx: &CliContext, command: DocumentCommands) -> CommandOutput {
    let discussion_id = match &command {
        DocumentCommands::Show { discussion_id } | DocumentCommands::Save { discussion_id, .. } => {
            discussion_id
        }
    };

    let mut board = DecisionBoard::new(ctx.client.clone(), discussion_id.clone());
    board.load().await?;
    let Some(process) = board.process() else {
        return match &command {
            DocumentCommands::Show { .. } => Ok(render::decision_panel(None, &[])),
            DocumentCommands::Save { .. } => Err(no_process_error(discussion_id)),
        };
    };

    let mut editor = DocumentEditor::new(ctx.client.clone(), process.id.clone());
    editor.load().await?;

    match command {
        DocumentCommands::Show { .. } => Ok(render::document_panel(editor.document())),
        DocumentCommands::Save {
            title,
            content,
            file,
            ..
        } => {
            let body = match (content, file) {
                (Some(content), _) => content,
                (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
                    AppError::Validation {
                        field: "file".to_string(),
                        reason: format!("Cannot read {}: {}", path.display(), e),
                    }
                })?,
                (None, None) => editor
                    .document()
                    .map(|d| d.content.clone())
                    .unwrap_or_default(),
            };
            let saved = editor.save(&title, &body).await?;
            Ok(render::document_panel(Some(saved)))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn require_login(ctx: &CliContext) -> Result<(), AppError> {
    if ctx.client.session().is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Validation {
            field: "session".to_string(),
            reason: "Not logged in. Run `ci-client login <username> --password <password>`"
                .to_string(),
        })
    }
}

fn resolve_workspace(ctx: &CliContext, explicit: Option<String>) -> Result<String, AppError> {
    explicit
        .filter(|id| !id.trim().is_empty())
        .or_else(|| ctx.client.session().current_workspace_id())
        .ok_or_else(|| AppError::Validation {
            field: "workspace".to_string(),
            reason: "No workspace selected. Run `ci-client workspaces use <id>` first".to_string(),
        })
}

fn required(field: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        reason: "cannot be empty".to_string(),
    }
}

/// Backend errors show only their message; everything else its full text.
fn no_process_error(discussion_id: &str) -> AppError {
    AppError::Validation {
        field: "discussion_id".to_string(),
        reason: format!(
            "{} Create one with `decision create {} <title>`.",
            render::NO_DECISION_PROCESS,
            discussion_id
        ),
    }
}

fn error_message(error: &AppError) -> String {
    match error {
        AppError::Api(api) => api.user_message().to_string(),
        AppError::Validation { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
