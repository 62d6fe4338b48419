//! backlog
//!
//! Abstraction over the issue tracker (Backlog).
//!
//! # Modules
//!
//! - `traits`: Core `IssueTracker` trait and request/response types
//! - `client`: Backlog REST API v2 implementation
//! - [`mock`]: Mock implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use nr2backlog::backlog::{BacklogClient, IssueTracker, UpdateIssueRequest};
//!
//! let tracker = BacklogClient::new(&config);
//! let body = tracker.update_issue(UpdateIssueRequest {
//!     issue_id: "12345678".to_string(),
//!     close_status_id: config.close_status_id.clone(),
//!     event,
//!     notified_user_ids: config.notified_user_ids.clone(),
//! }).await?;
//! ```

mod client;
pub mod mock;
mod traits;

pub use client::{BacklogClient, SEARCH_COUNT};
pub use traits::*;
