//! vigil: headless session telemetry recorder binary.

use std::sync::Arc;

use clap::Parser;

use vigil_core::config::Config;
use vigil_store::StorageAdapter;
use vigil_tracker::{HeadlessHost, SessionController};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("VIGIL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = Config::load_or_default(&args.config)?;

    match args.command {
        cli::Command::Probe => {
            let detection = vigil_probe::detect_environment().await;
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }
        cli::Command::Sessions(opts) => {
            let storage = vigil_store::create_storage(&config.storage).await?;
            let sessions = storage.get_sessions_by_call_url(&opts.call_url).await?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        cli::Command::Show(opts) => {
            let storage = vigil_store::create_storage(&config.storage).await?;
            let (session, events) = storage.get_session_with_events(&opts.session_id).await?;
            let doc = serde_json::json!({ "session": session, "events": events });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        cli::Command::Track(opts) => {
            track(config, opts).await?;
        }
    }

    Ok(())
}

async fn track(config: Config, opts: cli::TrackOpts) -> anyhow::Result<()> {
    let storage: Arc<dyn StorageAdapter> =
        Arc::from(vigil_store::create_storage(&config.storage).await?);

    tracing::info!("probing host environment");
    let environment = vigil_probe::detect_environment().await;
    if environment.is_virtual {
        tracing::warn!(
            host = environment.virtual_host.as_deref().unwrap_or("unknown"),
            "virtual machine detected"
        );
    }

    let controller = SessionController::new(
        Arc::new(HeadlessHost),
        Arc::clone(&storage),
        config.capture.clone(),
        config.process.clone(),
    );

    controller
        .start(Some(opts.call_url), None, Some(environment))
        .await?;

    match opts.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, stopping session");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            tracing::info!("interrupted, stopping session");
        }
    }

    controller.stop().await;
    storage.destroy().await?;
    Ok(())
}
