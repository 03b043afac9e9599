//! AWS Lambda entry point for ptgen.
//!
//! Deploy with `cargo lambda build --release --features lambda` behind a
//! function URL or an API Gateway proxy route.
//!
//! ## Environment Variables
//!
//! - `PTGEN_CONFIG`: optional path to a bundled `config.toml`
//! - `PTGEN_*`: overrides, see [`Config::with_env_overrides`]
//! - `RUST_LOG`: log filter (e.g. `info`, `ptgen=debug`)

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ptgen::dispatch::Dispatcher;
use ptgen::models::Config;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match std::env::var("PTGEN_CONFIG") {
        Ok(path) => Config::load_or_default(path),
        Err(_) => Config::default(),
    }
    .with_env_overrides();
    config.validate()?;

    let dispatcher = Arc::new(Dispatcher::from_config(&config).await?);
    info!("ptgen lambda ready");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { ptgen::lambda::handler(&dispatcher, event).await }
    }))
    .await
}
