mod cli;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "batchctl=info,client=info,reqwest=warn";

#[tokio::main]
async fn main() -> Result<()> {
    // logs a stderr: stdout queda para tablas y JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run().await
}
