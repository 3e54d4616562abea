use anyhow::Context;
use cid_compare::app::server;
use cid_compare::core::ConfigProvider;
use cid_compare::utils::{logger, validation::Validate};
use cid_compare::{CompareEngine, HttpOfferSource, TomlConfig};
use clap::Parser;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "cid-compare-server")]
#[command(about = "HTTP front end for the CID price comparison")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: String,

    #[arg(long, help = "TOML config file")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_server_logger();

    let file = match &args.config {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("failed to load config file {}", path))?,
        None => TomlConfig::default(),
    };
    file.validate().context("invalid configuration")?;
    let settings = file.compare_settings()?;

    let source = HttpOfferSource::from_settings(&settings)?;
    let engine = Arc::new(CompareEngine::new(source, settings));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("🚀 Listening on {}", args.bind);

    axum::serve(listener, server::router(engine))
        .await
        .context("server error")?;

    Ok(())
}
