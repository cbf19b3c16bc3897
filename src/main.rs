mod api;
mod config;
mod crawler;
mod extractor;
mod fallback;
mod models;
mod product_info;
mod report;
mod selectors;

use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower_http::services::ServeDir;

use crate::config::AppConfig;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::list_views,
        api::rank_keyword,
        api::export_rank_report,
        api::get_product_details,
        api::export_product_details,
        api::bsr_tracker
    ),
    components(
        schemas(
            api::ViewInfo,
            api::ViewsResponse,
            api::RankRequest,
            api::RankResponse,
            api::RankExportRequest,
            api::ProductRequest,
            api::ProductResponse,
            api::ProductExportRequest,
            api::BsrNotice,
            crawler::RankOutcome,
            crawler::Notice,
            crawler::NoticeLevel,
            report::Summary,
            report::TableRow,
            models::ListingRecord,
            models::ListingType,
            models::Platform,
            models::ProductDetail
        )
    ),
    tags(
        (name = "dashboard", description = "Keyword rank, product info and BSR views")
    )
)]
struct ApiDoc;

fn app(state: Arc<api::AppState>, static_dir: &str) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/ecom-intel-swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/views", get(api::list_views))
        .route("/api/rankings", post(api::rank_keyword))
        .route("/api/rankings/export", post(api::export_rank_report))
        .route("/api/products", post(api::get_product_details))
        .route("/api/products/export", post(api::export_product_details))
        .route("/api/bsr", get(api::bsr_tracker))
        .fallback_service(ServeDir::new(static_dir)) // Serve Dashboard
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "⚙️ Fetch timeout {:?}, rank limit 1-{}, Amazon {}, Flipkart {}",
        config.fetch_timeout, config.max_rank_limit, config.amazon_base_url, config.flipkart_base_url
    );

    let client = crawler::build_client(&config)?;
    let addr = config.listen_addr();
    let static_dir = config.static_dir.clone();
    let state = Arc::new(api::AppState { config, client });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🛒 E-Com Intel listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state, &static_dir)).await?;

    Ok(())
}
