use std::sync::Arc;
use std::time::Duration;

use salvo::Listener;
use salvo::conn::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use cadence_app::app::router;
use cadence_app::scheduler::spawn_regeneration_loop;
use cadence_core::config::load_config;
use cadence_db::db::connection::create_pool;
use cadence_db::db::migrate::run_migrations;
use cadence_db::{PgStore, ScheduleStore};
use cadence_service::{EventRegenerationJob, ServiceContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Cadence scheduling server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    run_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let store: Arc<dyn ScheduleStore> = Arc::new(PgStore::new(pool));
    let ctx = ServiceContext::new(store).with_max_retries(config.rsvp.max_retries);

    let _regeneration = config.jobs.interval_secs.and_then(|secs| {
        tracing::info!(interval_secs = secs, "Scheduling in-process regeneration");
        let job = EventRegenerationJob::new(ctx.clone()).with_concurrency(config.jobs.concurrency);
        spawn_regeneration_loop(job, Duration::from_secs(secs))
    });

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = router(ctx, config);

    tracing::info!("Server listening on {bind_addr}");

    let server = salvo::Server::new(acceptor);
    let handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown requested");
        handle.stop_graceful(Some(Duration::from_secs(10)));
    });

    server.serve(router).await;

    Ok(())
}
