//! nr2backlog - File New Relic alert events as Backlog issues
//!
//! Each invocation receives one alert-lifecycle event and either opens a
//! new Backlog issue for it or comments on (and possibly closes) the issue
//! that already tracks the same alert.
//!
//! # Architecture
//!
//! - [`secrets`] - Secret store backends (AWS Secrets Manager, file, memory)
//! - [`config`] - The Backlog configuration bundle loaded from a secret
//! - [`event`] - Typed alert event and correlation keyword
//! - [`render`] - Issue summary, description and comment rendering
//! - [`backlog`] - Issue tracker trait, Backlog REST client and mock
//! - [`handler`] - Search-then-create-or-update orchestration
//! - [`cli`] - Local one-shot invocation (`nr2backlog-invoke`)
//! - [`logging`] - Tracing subscriber setup for the binaries
//!
//! # Correlation
//!
//! No mapping table is persisted anywhere. An issue belongs to an alert when
//! its description starts with `<issueId:{id}>`, and Backlog's own keyword
//! search is the index used to find it again.

pub mod backlog;
pub mod cli;
pub mod config;
pub mod event;
pub mod handler;
pub mod logging;
pub mod render;
pub mod secrets;
