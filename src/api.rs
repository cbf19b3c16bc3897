use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::crawler::{self, Notice, NoticeLevel, RankOutcome, RankQuery};
use crate::models::{ListingRecord, Platform, ProductDetail};
use crate::product_info;
use crate::report::{self, TableRow, TABLE_COLUMNS};

pub const DEFAULT_RANK_LIMIT: u32 = 10;

pub struct AppState {
    pub config: AppConfig,
    pub client: reqwest::Client,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(e) => {
                error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

/// Malformed or mistyped request bodies answer 400 with the same JSON error
/// shape as validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// ============================================================================
// Views
// ============================================================================

#[derive(Serialize, ToSchema)]
pub struct ViewInfo {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Serialize, ToSchema)]
pub struct ViewsResponse {
    pub views: Vec<ViewInfo>,
    pub platforms: Vec<Platform>,
    pub max_rank_limit: u32,
    pub default_rank_limit: u32,
}

fn view(id: &str, title: &str, description: &str) -> ViewInfo {
    ViewInfo {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/api/views",
    responses((status = 200, description = "Dashboard views and platforms", body = ViewsResponse)),
    tag = "dashboard"
)]
pub async fn list_views(State(state): State<Arc<AppState>>) -> Json<ViewsResponse> {
    Json(ViewsResponse {
        views: vec![
            view(
                "keyword-rank",
                "Keyword Rank Fetcher",
                "Track how products rank for specific keywords across Indian e-commerce platforms",
            ),
            view(
                "product-info",
                "Product Info Fetcher",
                "Get detailed product information using ASINs or product links",
            ),
            view("bsr-tracker", "Best Seller Rank Tracker", "Coming soon"),
        ],
        platforms: Platform::ALL.to_vec(),
        max_rank_limit: state.config.max_rank_limit,
        default_rank_limit: DEFAULT_RANK_LIMIT.min(state.config.max_rank_limit),
    })
}

// ============================================================================
// Keyword rank
// ============================================================================

#[derive(Deserialize, ToSchema)]
pub struct RankRequest {
    pub keyword: String,
    pub platform: Platform,
    pub limit: Option<u32>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RankResponse {
    pub outcome: RankOutcome,
    pub columns: Vec<String>,
    pub table: Vec<TableRow>,
}

fn validate_rank_request(req: RankRequest, max_limit: u32) -> Result<RankQuery, ApiError> {
    let keyword = req.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::BadRequest("Please enter a keyword".to_string()));
    }
    let limit = req.limit.unwrap_or(DEFAULT_RANK_LIMIT);
    if limit == 0 || limit > max_limit {
        return Err(ApiError::BadRequest(format!(
            "Rank limit must be between 1 and {}",
            max_limit
        )));
    }
    Ok(RankQuery {
        keyword: keyword.to_string(),
        platform: req.platform,
        limit: limit as usize,
    })
}

#[utoipa::path(
    post,
    path = "/api/rankings",
    request_body = RankRequest,
    responses(
        (status = 200, description = "Ranked listings with summary", body = RankResponse),
        (status = 400, description = "Malformed body, missing keyword or limit out of range")
    ),
    tag = "dashboard"
)]
pub async fn rank_keyword(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RankRequest>, JsonRejection>,
) -> Result<Json<RankResponse>, ApiError> {
    let Json(payload) = payload?;
    let query = validate_rank_request(payload, state.config.max_rank_limit)?;
    let mut rng = StdRng::from_entropy();

    let outcome = crawler::fetch_rankings(&state.client, &state.config, &query, &mut rng).await;
    let table = report::table_rows(&outcome.records);

    Ok(Json(RankResponse {
        outcome,
        columns: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        table,
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct RankExportRequest {
    pub keyword: String,
    pub records: Vec<ListingRecord>,
}

fn csv_attachment(filename: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/rankings/export",
    request_body = RankExportRequest,
    responses((status = 200, description = "Rank report CSV", body = String, content_type = "text/csv")),
    tag = "dashboard"
)]
pub async fn export_rank_report(
    payload: Result<Json<RankExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let body = report::rank_report_csv(&payload.records)?;
    let filename = report::rank_report_filename(&payload.keyword, Local::now().date_naive());
    info!("📥 Exporting {} ranked listings as {}", payload.records.len(), filename);
    Ok(csv_attachment(filename, body))
}

// ============================================================================
// Product info
// ============================================================================

#[derive(Deserialize, ToSchema)]
pub struct ProductRequest {
    pub platform: Platform,
    /// ASINs or product links, one per line
    pub inputs: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub platform: Platform,
    pub records: Vec<ProductDetail>,
    pub notices: Vec<Notice>,
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product detail rows", body = ProductResponse),
        (status = 400, description = "Malformed body or no ASIN or link given")
    ),
    tag = "dashboard"
)]
pub async fn get_product_details(
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let Json(payload) = payload?;
    let inputs = product_info::parse_inputs(&payload.inputs);
    if inputs.is_empty() {
        return Err(ApiError::BadRequest("Please enter at least one ASIN or link".to_string()));
    }

    let mut rng = StdRng::from_entropy();
    let records = product_info::lookup(payload.platform, &inputs, &mut rng);
    info!("📦 Product details for {} inputs on {}", inputs.len(), payload.platform);

    Ok(Json(ProductResponse {
        platform: payload.platform,
        notices: vec![
            Notice {
                level: NoticeLevel::Info,
                message: format!("Fetching details for {} products...", inputs.len()),
            },
            Notice {
                level: NoticeLevel::Success,
                message: format!("Retrieved {} product details!", records.len()),
            },
        ],
        records,
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct ProductExportRequest {
    pub records: Vec<ProductDetail>,
}

#[utoipa::path(
    post,
    path = "/api/products/export",
    request_body = ProductExportRequest,
    responses((status = 200, description = "Product details CSV", body = String, content_type = "text/csv")),
    tag = "dashboard"
)]
pub async fn export_product_details(
    payload: Result<Json<ProductExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let body = report::product_details_csv(&payload.records)?;
    let filename = report::product_details_filename(Local::now().date_naive());
    Ok(csv_attachment(filename, body))
}

// ============================================================================
// BSR tracker
// ============================================================================

#[derive(Serialize, ToSchema)]
pub struct BsrNotice {
    pub title: String,
    pub status: String,
    pub planned: Vec<String>,
    pub expected_release: String,
}

#[utoipa::path(
    get,
    path = "/api/bsr",
    responses((status = 200, description = "Static BSR tracker notice", body = BsrNotice)),
    tag = "dashboard"
)]
pub async fn bsr_tracker() -> Json<BsrNotice> {
    Json(BsrNotice {
        title: "Best Seller Rank Tracker".to_string(),
        status: "Coming Soon!".to_string(),
        planned: [
            "Track BSR history over time",
            "Visualize rank trends with charts",
            "Set alerts for rank changes",
            "Monitor multiple categories",
            "Compare performance across products",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        expected_release: "Q4 2025".to_string(),
    })
}
