use clap::Parser;
use nr2backlog::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nr2backlog::logging::init();
    cli::run(Cli::parse()).await
}
