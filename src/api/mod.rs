//! Backend REST client and wire types.
//!
//! Covers the user, workspace, discussion, analysis and decision endpoints
//! served under the `/api` prefix.

mod client;
mod types;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use client::ApiClient;
pub use types::*;
