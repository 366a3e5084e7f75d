//! API handlers for the report server

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use report_template::FieldUpdateRequest;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::job::run_job;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "report-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Generate response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub pdf_path: String,
}

/// Handler: POST /api/generate-pdf
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    payload: Result<Json<FieldUpdateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    debug!("Field update request: {:?}", request);

    let outcome = run_job(&state, request).await?;

    info!(
        "PDF generated successfully at: {} ({} sections, {}/{} pages kept, {} applied, {} missing, template {})",
        outcome.pdf_path.display(),
        outcome.sections,
        outcome.kept_pages,
        outcome.rendered_pages,
        outcome.applied.len(),
        outcome.missing.len(),
        if outcome.template_committed {
            "updated"
        } else {
            "unchanged"
        }
    );

    Ok(Json(GenerateResponse {
        success: true,
        pdf_path: outcome.pdf_path.display().to_string(),
    }))
}
