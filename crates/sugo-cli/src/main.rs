//! sugo: transpiler and language server proxy for sugared Go.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::{Args, Command};
use gopls_proxy::{find_gopls, GoplsConnector, LogLevel, Proxy};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let root = orchestrator::working_dir().into_diagnostic()?;

    match args.command {
        Command::Build(build) => {
            let config = config::load(build.config.as_deref(), &root).into_diagnostic()?;
            init_logging(config.log_level);

            let summary = orchestrator::run(&build, &root).into_diagnostic()?;
            if summary.error_count > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Lsp(lsp) => {
            let config = config::load(lsp.config.as_deref(), &root).into_diagnostic()?;
            init_logging(config.log_level);

            let gopls = find_gopls(config.underlying_server_path_override.as_deref())
                .into_diagnostic()
                .wrap_err("cannot start the language server")?;
            tracing::info!(path = %gopls, "using gopls");

            Proxy::new(GoplsConnector::new(gopls), config)
                .serve(tokio::io::stdin(), tokio::io::stdout())
                .await
                .into_diagnostic()
        }
    }
}

/// Installs the stderr subscriber; `RUST_LOG` overrides the configured level.
fn init_logging(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
