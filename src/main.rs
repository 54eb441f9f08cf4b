use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

use corner_ev::config::{Command, Config};
use corner_ev::service::{self, AppState};
use corner_ev::{engine, report, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let settings = Settings::load(config.settings.as_deref())?;
    match &config.settings {
        Some(path) => info!("Settings loaded from {}", path.display()),
        None => info!("Using built-in settings"),
    }

    match config.command {
        Command::Evaluate(args) => {
            let request = args.to_request(&settings);
            let evaluation = engine::evaluate(&request, &settings)
                .context("Evaluation rejected")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else {
                print!("{}", report::render(&request, &evaluation));
            }
        }
        Command::Serve(args) => {
            let app = service::router(AppState { settings });
            let addr: SocketAddr = args
                .addr
                .parse()
                .with_context(|| format!("Invalid listen address {}", args.addr))?;
            info!("Evaluation service listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
