//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{BackendKind, LogFormat, ServiceConfig, DEFAULT_BIND};

#[derive(Debug, Parser)]
#[command(
    name = "mrc-serve",
    version,
    about = "Serve HuggingFace question-answering pipelines over HTTP, or talk to a running server."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Ask a running service to load a model.
    Register(RegisterArgs),
    /// Show the models a running service has loaded.
    List(ClientArgs),
    /// Ask a question against a loaded model.
    Ask(AskArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// TOML config file.
    #[arg(long, short, env = "MRC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8001.
    #[arg(long, env = "MRC_BIND")]
    pub bind: Option<String>,

    /// Model backend.
    #[arg(long, value_enum, env = "MRC_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Log output format.
    #[arg(long, value_enum, env = "MRC_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// OTLP/gRPC collector endpoint; enables span export.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Model to register at startup (repeatable).
    #[arg(long = "preload", value_name = "MODEL")]
    pub preload: Vec<String>,
}

impl ServeArgs {
    /// Applies flags on top of a file-loaded config. Preload models are
    /// appended to those from the file.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(kind) = self.backend {
            config.backend.kind = kind;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(endpoint) = &self.otlp_endpoint {
            config.otlp_endpoint = Some(endpoint.clone());
        }
        for model in &self.preload {
            if !config.preload.contains(model) {
                config.preload.push(model.clone());
            }
        }
    }
}

#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Base URL of the running service.
    #[arg(long, env = "MRC_URL", default_value_t = default_url())]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Model identifier, e.g. ainize/klue-bert-base-mrc.
    pub model: String,

    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// One of the loaded models.
    #[arg(long, short)]
    pub model: String,

    #[arg(long, short)]
    pub question: String,

    /// Passage to extract the answer from.
    #[arg(long, short)]
    pub context: String,

    #[command(flatten)]
    pub client: ClientArgs,
}

fn default_url() -> String {
    format!("http://{DEFAULT_BIND}")
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_override_config() {
        let cli = Cli::try_parse_from([
            "mrc-serve",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--backend",
            "lexical",
            "--log-format",
            "json",
            "--preload",
            "a",
            "--preload",
            "b",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        let mut config = ServiceConfig {
            preload: vec!["a".into()],
            ..ServiceConfig::default()
        };
        args.apply(&mut config);

        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.backend.kind, BackendKind::Lexical);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.preload, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn ask_parses_short_flags() {
        let cli = Cli::try_parse_from([
            "mrc-serve", "ask", "-m", "demo", "-q", "Who?", "-c", "Nobody.", "--url",
            "http://localhost:1234",
        ])
        .unwrap();
        let Command::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.model, "demo");
        assert_eq!(args.question, "Who?");
        assert_eq!(args.context, "Nobody.");
        assert_eq!(args.client.url, "http://localhost:1234");
    }
}
