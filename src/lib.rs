//! # Collective Intelligence Client
//!
//! A typed client for the collective-intelligence discussion backend, plus
//! the views built on top of it.
//!
//! ## Features
//!
//! - **Workspaces & Discussions**: Membership, threaded messages
//! - **Bias Ranking**: Top cognitive biases flagged across a discussion
//! - **Perspective Map**: Messages placed on a 2-D plane, coloured by sentiment
//! - **Decision Processes**: Staged workflows with a versioned document
//! - **Persistent Session**: Token and current workspace kept in SQLite
//!
//! ## Architecture
//!
//! ```text
//! CLI → ApiClient (HTTP) → backend /api
//!          ↓
//!   AnalysisFetcher → DiscussionInsights → { rank_biases, PerspectiveMap }
//!          ↓
//!   Session ← SessionStore (SQLite)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use collective_intelligence_client::analysis::{AnalysisFetcher, DiscussionInsights, FetchOutcome};
//! use collective_intelligence_client::api::ApiClient;
//! use collective_intelligence_client::session::{Session, SqliteSessionStore};
//! use collective_intelligence_client::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = SqliteSessionStore::new(&config.session).await?;
//!     let session = Session::load(Arc::new(store)).await?;
//!     let client = ApiClient::new(&config.api, config.request.clone(), session)?;
//!
//!     let fetcher = AnalysisFetcher::new(client);
//!     if let FetchOutcome::Applied(state) = fetcher.refresh("discussion-id").await? {
//!         let insights = DiscussionInsights::from_state(&state);
//!         println!("{:?}", insights.biases());
//!     }
//!     Ok(())
//! }
//! ```

/// Analysis fetching, bias ranking and perspective projection.
pub mod analysis;
/// Backend REST client and wire types.
pub mod api;
/// Command-line subcommands and their execution.
pub mod cli;
/// Configuration management.
pub mod config;
/// Decision processes, stage transitions and documents.
pub mod decision;
/// Error types and result aliases for the application.
pub mod error;
/// Text panels and SVG output.
pub mod render;
/// Session state and its persistent store.
pub mod session;

pub use config::Config;
pub use error::{AppError, AppResult};
