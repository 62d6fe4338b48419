//! cli::args
//!
//! Command-line argument definitions using clap derive.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::secrets::DEFAULT_PROVIDER;

/// Run one nr2backlog invocation locally against a real Backlog space.
#[derive(Parser, Debug)]
#[command(name = "nr2backlog-invoke")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the secret holding the Backlog configuration
    #[arg(long, env = "SECRET_NAME")]
    pub secret_name: String,

    /// Where to read the secret from
    #[arg(long, value_enum, default_value = DEFAULT_PROVIDER)]
    pub store: StoreKind,

    /// Secrets file for `--store file` (default: ./secrets.toml)
    #[arg(long)]
    pub secrets_file: Option<PathBuf>,

    /// EventBridge payload to process, or `-` for stdin
    #[arg(long, default_value = "-")]
    pub event: String,

    /// Override the Backlog API base URL (default: https://{BACKLOG_DOMAIN})
    #[arg(long)]
    pub api_base: Option<String>,
}

/// Secret store backends selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Aws,
    File,
}

impl StoreKind {
    /// Provider name understood by [`crate::secrets::create_store`].
    pub fn provider(self) -> &'static str {
        match self {
            StoreKind::Aws => "aws",
            StoreKind::File => "file",
        }
    }
}
