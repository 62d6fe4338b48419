//! cli
//!
//! Local one-shot invocation.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments
//! - Read the event payload from a file or stdin
//! - Run it through the same [`EventProcessor`] the Lambda uses
//!
//! The raw Backlog response is printed to stdout; logs go to stderr.

pub mod args;

pub use args::{Cli, StoreKind};

use std::io::Read;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::handler::EventProcessor;
use crate::secrets::create_store;

/// Run the CLI application.
///
/// This is the main entry point called from `bin/invoke.rs`.
pub async fn run(cli: Cli) -> Result<()> {
    let payload = read_event(&cli.event)?;

    let store = create_store(cli.store.provider(), cli.secrets_file.clone()).await?;
    let mut processor = EventProcessor::new(store, cli.secret_name.clone());
    if let Some(api_base) = &cli.api_base {
        processor = processor.with_api_base(api_base.as_str());
    }

    let response = processor.process(payload).await?;
    println!("{}", response);
    Ok(())
}

/// Read and parse the event JSON. `-` means stdin.
fn read_event(source: &str) -> Result<Value> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read event from stdin")?;
        text
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read event file '{}'", source))?
    };

    serde_json::from_str(&text).with_context(|| format!("event '{}' is not valid JSON", source))
}
