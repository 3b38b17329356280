//! MRC Serve entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration** — load the optional TOML config, apply flag and
//!    environment overrides, and validate it.
//! 2. **Wire observability** — configure `tracing-subscriber` with a text or
//!    JSON layer and an optional OpenTelemetry OTLP exporter. All `tracing`
//!    spans and structured events emitted by every crate in the workspace flow
//!    through this layer.
//! 3. **Construct infrastructure** — create the configured model loader and
//!    inject it into a fresh [`pipeline::PipelineRegistry`].
//! 4. **Select mode** — `serve` runs the HTTP service; `register`, `list` and
//!    `ask` act as a client of a running service.

mod args;
mod client;
mod config;
mod server;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;

use args::{Cli, Command};
use client::ApiClient;
use config::{LogFormat, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            let mut config = match &args.config {
                Some(path) => ServiceConfig::load(path)?,
                None => ServiceConfig::default(),
            };
            args.apply(&mut config);
            config.validate()?;

            let _telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;
            server::run(config).await
        }
        Command::Register(args) => {
            let _telemetry = telemetry::init(LogFormat::Text, None)?;
            let client = ApiClient::new(&args.client.url);
            let model = client
                .register(&args.model)
                .await
                .with_context(|| format!("failed to register '{}'", args.model))?;
            println!("{model} is starting");
            let active = client.list().await.context("failed to list pipelines")?;
            println!("Currently active: {active:?}");
            Ok(())
        }
        Command::List(args) => {
            let _telemetry = telemetry::init(LogFormat::Text, None)?;
            let active = ApiClient::new(&args.url)
                .list()
                .await
                .context("failed to list pipelines")?;
            for name in active {
                println!("{name}");
            }
            Ok(())
        }
        Command::Ask(args) => {
            let _telemetry = telemetry::init(LogFormat::Text, None)?;
            let out = ApiClient::new(&args.client.url)
                .analyze(&args.model, &args.question, &args.context)
                .await
                .context("failed to analyze")?;
            println!("Model : {}", out.model_name);
            println!("Answer : {}", out.answer);
            Ok(())
        }
    }
}
