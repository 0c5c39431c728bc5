//! TradeGate - Trade Instruction Capture & Forwarding Service
//!
//! Ingestion paths: multipart file upload, single-record API, inbound bus
//! subject. Every path funnels into the same processing pipeline:
//! normalize -> store -> convert -> publish.

use anyhow::{Context, Result};
use axum::middleware as axum_middleware;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradegate_backend::{
    api::create_router,
    bus::{self, consumer, NatsPublisher, NullPublisher, TradePublisher},
    middleware::request_logging,
    models::Config,
    service::TradeService,
    store::TradeStore,
    transform::TradeTransformer,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    info!("🚀 TradeGate starting");
    info!(platform_id = %config.platform_id, port = config.port, "Configuration loaded");

    let store = Arc::new(TradeStore::new());
    let transformer = TradeTransformer::new(config.platform_id.clone());

    let mut inbound_jetstream = None;
    let publisher: Arc<dyn TradePublisher> = if config.disable_bus {
        info!("Bus disabled, running HTTP-only");
        Arc::new(NullPublisher)
    } else {
        let client = async_nats::connect(&config.nats_url)
            .await
            .with_context(|| format!("failed to connect to NATS at {}", config.nats_url))?;
        let jetstream = async_nats::jetstream::new(client);

        bus::ensure_stream(&jetstream, &config.outbound_stream, &config.outbound_subject).await?;
        info!(subject = %config.outbound_subject, "Outbound publisher ready");

        let publisher = NatsPublisher::new(jetstream.clone(), config.outbound_subject.clone());
        inbound_jetstream = Some(jetstream);
        Arc::new(publisher)
    };

    let service = Arc::new(TradeService::new(transformer, store, publisher));

    if let Some(jetstream) = inbound_jetstream {
        let consumer_config = config.clone();
        let consumer_service = service.clone();
        tokio::spawn(async move {
            if let Err(err) = consumer::run(jetstream, consumer_config, consumer_service).await {
                error!(error = %err, "inbound trade consumer stopped");
            }
        });
    }

    let app = create_router(service)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "HTTP API listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tradegate_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
