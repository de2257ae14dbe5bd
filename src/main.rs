use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use listing_core::config::AppConfig;
use listing_core::error::AppError;
use listing_core::listings::documents::DocumentLocator;
use listing_core::listings::memory::{
    InMemoryDocumentStore, InMemoryMediaStore, InMemoryObjectStorage, InMemoryPropertyRepository,
    StaticIdentityProvider,
};
use listing_core::listings::{
    listing_router, Address, DocumentStore, DocumentType, DocumentVerificationManager,
    FileMetadata, IdentityProvider, ListingBrowser, ListingState, MediaAssetManager, MediaStore,
    ObjectStorageGateway, OperationType, Price, Property, PropertyDraft,
    PropertyLifecycleManager, PropertyPatch, PropertyRepository, PropertyType,
    SimilarityRecommender, UploadRequest, UserId, VerificationStatus,
};
use listing_core::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct OpsState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Listing Publication Service",
    about = "Run the listing publication workflow service or demo it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a draft listing through media, documents, and publish against
    /// in-memory ports
    Demo,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo => run_demo().await,
    }
}

fn build_state(config: &AppConfig, identity: Arc<dyn IdentityProvider>) -> ListingState {
    let repository: Arc<dyn PropertyRepository> = Arc::new(InMemoryPropertyRepository::default());
    let media_store: Arc<dyn MediaStore> = Arc::new(InMemoryMediaStore::default());
    let document_store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::default());
    let storage: Arc<dyn ObjectStorageGateway> = Arc::new(InMemoryObjectStorage::default());

    ListingState {
        lifecycle: Arc::new(PropertyLifecycleManager::new(
            repository.clone(),
            media_store.clone(),
            document_store.clone(),
            identity.clone(),
            config.listings.clone(),
        )),
        media: Arc::new(MediaAssetManager::new(
            repository.clone(),
            media_store,
            storage,
            identity.clone(),
        )),
        documents: Arc::new(DocumentVerificationManager::new(
            repository.clone(),
            document_store,
            identity.clone(),
            config.listings.clone(),
        )),
        browser: Arc::new(ListingBrowser::new(repository.clone(), identity.clone())),
        recommender: Arc::new(SimilarityRecommender::new(
            repository,
            identity,
            config.listings.clone(),
        )),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let ops_state = OpsState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let identity = Arc::new(StaticIdentityProvider::verified("org-demo"));
    let listing_state = build_state(&config, identity);

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(ops_state)
        .merge(listing_router(listing_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "listing publication service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn run_demo() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let identity = Arc::new(StaticIdentityProvider::verified("org-demo"));
    let state = build_state(&config, identity);

    println!("Listing publication demo");

    let property = state
        .lifecycle
        .create(
            UserId("user-demo".to_string()),
            PropertyDraft {
                title: "Sunlit three-bedroom house".to_string(),
                price: Price {
                    amount: 2_000_000,
                    currency: "MXN".to_string(),
                },
                property_type: PropertyType::House,
                operation_type: OperationType::Sale,
            },
        )
        .await?;
    println!(
        "- created draft {} (completeness {})",
        property.id.0, property.completeness_score
    );

    let property = state
        .lifecycle
        .update(
            &property.id,
            PropertyPatch {
                description: Some("Family home close to parks and schools.".to_string()),
                address: Some(Address {
                    city: Some("Guadalajara".to_string()),
                    state: Some("Jalisco".to_string()),
                    ..Address::default()
                }),
                amenities_extra: Some("garden, terrace".to_string()),
                ..PropertyPatch::default()
            },
        )
        .await?;
    println!("- filled in details (completeness {})", property.completeness_score);

    let provisional = state
        .media
        .begin_upload(
            &property.id,
            UploadRequest {
                file_name: "facade.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                size_bytes: Some(1_024),
            },
        )
        .await?;
    let asset = state.media.complete_upload(provisional).await?;
    println!("- uploaded {} (cover: {})", asset.metadata.file_name, asset.is_cover);

    let document = state
        .documents
        .attach(
            &property.id,
            DocumentType::RppCertificate,
            DocumentLocator {
                object_key: Some("docs/rpp.pdf".to_string()),
                url: None,
            },
            FileMetadata {
                file_name: "rpp.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                size_bytes: Some(4_096),
                extra: Default::default(),
            },
        )
        .await?;
    state
        .documents
        .verify(&property.id, &document.id, VerificationStatus::Verified)
        .await?;
    println!("- attached and verified {}", document.metadata.file_name);

    // The update recomputes the score now that media and documents exist.
    let property = state
        .lifecycle
        .update(&property.id, PropertyPatch::default())
        .await?;
    let published: Property = state.lifecycle.publish(&property.id).await?;
    println!(
        "- published at {} with completeness {}",
        published
            .published_at
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d %H:%M:%S"),
        published.completeness_score
    );

    let similar = state.recommender.recommend(&published.id, 3).await?;
    if similar.is_empty() {
        println!("- no similar published listings yet");
    } else {
        println!("- similar listings:");
        for entry in similar {
            println!("  - {} (score {})", entry.summary.title, entry.score);
        }
    }

    Ok(())
}
