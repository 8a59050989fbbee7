use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use api::{init_tracing, router, AppConfig, AppContext};

#[derive(Parser)]
#[command(name = "api")]
#[command(about = "Fund risk extraction and onboarding HTTP service")]
struct Args {
    /// JSON config file (defaults to ./fundrisk.json when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Address to listen on, overriding the config
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    init_tracing(config.log_format);

    let bind = config.server.bind.clone();
    let ctx = Arc::new(AppContext::build(config).await?);
    let app = router(ctx);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    tracing::info!("Server listening on http://{}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}
