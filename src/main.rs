use clap::Parser;
use collector_core::Credentials;
use reddit_client::RedditEndpoints;
use reddit_collector::{collect, exit_status, load_credentials, Args, CollectRequest};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "reddit_collector=info,reddit_client=info,collector_core=info";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine; the variables may already be set.
    // Loaded first so RUST_LOG may come from it.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let request = CollectRequest::from(Args::parse());

    let result = match load_credentials(Credentials::from_env) {
        Ok(credentials) => collect(&request, &credentials, RedditEndpoints::default()).await,
        Err(e) => Err(e),
    };

    ExitCode::from(exit_status(&result))
}
