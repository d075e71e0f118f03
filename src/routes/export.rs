use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::{Error, Result},
    middleware::{json::ApiJson, session::SessionContext},
    models::summary::SummaryDocument,
    routes::evaluation::{load_summary, SummaryQuery},
    services::export_service::{ExportFile, ExportFormat, ExportService},
    AppState,
};

fn parse_format(raw: &str) -> Result<ExportFormat> {
    ExportFormat::parse(raw)
        .ok_or_else(|| Error::BadRequest(format!("Unsupported export format: {}", raw)))
}

fn download(file: ExportFile) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
}

/// Export the live results of one evaluation as PDF, JSON or XLSX
#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/export/{format}",
    params(
        ("id" = i64, Path, description = "Evaluation ID"),
        ("format" = String, Path, description = "pdf, json or xlsx")
    ),
    responses(
        (status = 200, description = "Report file"),
        (status = 400, description = "Unsupported format"),
        (status = 404, description = "Evaluation or results not found")
    )
)]
#[axum::debug_handler]
pub async fn export_evaluation(
    State(state): State<AppState>,
    Path((id, format)): Path<(i64, String)>,
    Query(query): Query<SummaryQuery>,
    ctx: SessionContext,
) -> Result<impl IntoResponse> {
    let format = parse_format(&format)?;
    let summary = load_summary(&state, &ctx, id, query.source.as_deref()).await?;
    let file = ExportService::export(&summary, format, &state.report_title)?;
    Ok(download(file))
}

/// Export a summary document the caller already holds
#[utoipa::path(
    post,
    path = "/api/reports/{format}",
    params(("format" = String, Path, description = "pdf, json or xlsx")),
    request_body = SummaryDocument,
    responses(
        (status = 200, description = "Report file"),
        (status = 400, description = "Unsupported format or malformed summary"),
        (status = 404, description = "Summary has no questions")
    )
)]
#[axum::debug_handler]
pub async fn export_report(
    State(state): State<AppState>,
    Path(format): Path<String>,
    ApiJson(document): ApiJson<SummaryDocument>,
) -> Result<impl IntoResponse> {
    let format = parse_format(&format)?;
    let summary = state.evaluation_service.summary_from_document(document)?;
    let file = ExportService::export(&summary, format, &state.report_title)?;
    Ok(download(file))
}
