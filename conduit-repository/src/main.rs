use anyhow::Context;
use conduit_repository::service::registration_service;
use conduit_repository::{Config, db, schema};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conduit_repository=info,conduit_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Conduit repository bootstrap...");

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Opening repository at {}", config.repository_url);

    let pool = db::create_pool(&config)
        .await
        .context("Failed to open repository")?;

    let status = schema::ensure_schema(&pool, config.create_schema)
        .await
        .context("Failed to prepare repository schema")?;

    match status {
        schema::SchemaStatus::Created => {
            tracing::info!("Repository initialized at version {}", schema::SCHEMA_VERSION)
        }
        schema::SchemaStatus::Current => tracing::info!("Repository is up to date"),
    }

    let connectors = registration_service::list_connectors(&pool)
        .await
        .context("Failed to list connectors")?;

    tracing::info!("{} connectors registered", connectors.len());
    for connector in &connectors {
        tracing::info!(
            "  {} -> {}",
            connector.name(),
            connector.implementation_class()
        );
    }

    pool.close().await;
    Ok(())
}
