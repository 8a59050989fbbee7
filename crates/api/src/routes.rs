use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use extract::{RiskCategory, RiskFields};
use semantic::CacheStats;
use stamp::{StampError, StampOutcome};

use crate::app::{AppContext, FundBatch};
use crate::metrics::{MetricsSnapshot, TimedOperation};

/// Upload limit for `/risks/pdf`
const MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    semantic: bool,
}

#[derive(Deserialize)]
struct RisksRequest {
    text: String,
}

#[derive(Serialize)]
struct PdfRisksResponse {
    backend: Option<String>,
    risk_mentions: usize,
    fields: RiskFields,
}

#[derive(Deserialize)]
struct FundsRequest {
    isins: Vec<String>,
    /// Also write the CSV into the output folder
    #[serde(default)]
    export: bool,
}

#[derive(Deserialize)]
struct StampRequest {
    template: String,
    new_date: String,
}

#[derive(Serialize)]
struct TemplatesResponse {
    templates: Vec<PathBuf>,
}

#[derive(Serialize)]
struct MetricsResponse {
    #[serde(flatten)]
    metrics: MetricsSnapshot,
    embedding_cache: Option<CacheStats>,
}

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/risks", post(analyze_text))
        .route(
            "/risks/pdf",
            post(analyze_pdf).layer(DefaultBodyLimit::max(MAX_PDF_BYTES)),
        )
        .route("/taxonomy", get(get_taxonomy))
        .route("/funds", post(fetch_funds))
        .route("/documents/templates", get(list_templates))
        .route("/documents/stamp", post(stamp_document))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn health_check(State(ctx): State<Arc<AppContext>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        semantic: ctx.pipeline.classifier().has_semantic_stage(),
    })
}

async fn analyze_text(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<RisksRequest>,
) -> Json<RiskFields> {
    let fields = ctx.analyze_text(&req.text).await;
    ctx.metrics.record_request(true);
    Json(fields)
}

async fn analyze_pdf(
    State(ctx): State<Arc<AppContext>>,
    body: Bytes,
) -> Result<Json<PdfRisksResponse>, StatusCode> {
    if body.is_empty() {
        ctx.metrics.record_request(false);
        return Err(StatusCode::BAD_REQUEST);
    }

    let analysis = ctx.analyze_pdf(body.to_vec()).await;
    ctx.metrics.record_request(true);

    let (backend, risk_mentions) = analysis
        .selected
        .map_or((None, 0), |s| (Some(s.backend), s.risk_mentions));
    Ok(Json(PdfRisksResponse {
        backend,
        risk_mentions,
        fields: analysis.fields,
    }))
}

async fn get_taxonomy(State(ctx): State<Arc<AppContext>>) -> Json<Vec<RiskCategory>> {
    Json(ctx.pipeline.classifier().taxonomy().categories().to_vec())
}

async fn fetch_funds(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<FundsRequest>,
) -> Result<Json<FundBatch>, StatusCode> {
    if req.isins.iter().all(|isin| isin.trim().is_empty()) {
        ctx.metrics.record_request(false);
        return Err(StatusCode::BAD_REQUEST);
    }

    info!(funds = req.isins.len(), "Fund batch requested");
    let batch = ctx.fetch_funds(&req.isins, req.export).await.map_err(|e| {
        error!(error = %e, "Fund batch failed");
        ctx.metrics.record_request(false);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    ctx.metrics.record_request(true);
    Ok(Json(batch))
}

async fn list_templates(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<TemplatesResponse>, StatusCode> {
    let templates = stamp::list_templates(&ctx.config.output_dir).map_err(|e| {
        error!(error = %e, "Failed to list templates");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(TemplatesResponse { templates }))
}

async fn stamp_document(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<StampRequest>,
) -> Result<Json<StampOutcome>, StatusCode> {
    let template = ctx.resolve_template(&req.template);
    let stamper = ctx.stamper();
    let timer = TimedOperation::start();

    let outcome = tokio::task::spawn_blocking(move || stamper.stamp(&template, &req.new_date))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match outcome {
        Ok(outcome) => {
            ctx.metrics.record_stamp(timer.elapsed());
            ctx.metrics.record_request(true);
            Ok(Json(outcome))
        }
        Err(e) => {
            ctx.metrics.record_request(false);
            error!(error = %e, "Stamping failed");
            Err(stamp_status(&e))
        }
    }
}

fn stamp_status(error: &StampError) -> StatusCode {
    match error {
        StampError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
        StampError::EmptyText(_) => StatusCode::BAD_REQUEST,
        StampError::Zip(_) | StampError::Xml(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StampError::Io(_) | StampError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn get_metrics(State(ctx): State<Arc<AppContext>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        metrics: ctx.metrics.snapshot(),
        embedding_cache: ctx.semantic.as_ref().map(|m| m.cache().stats()),
    })
}
