use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    dto::evaluation_dto::{CreateEvaluationPayload, SessionResponse, SubmitAnswersPayload},
    error::Result,
    middleware::{json::ApiJson, session::SessionContext},
    models::summary::EvaluationSummary,
    services::presenter_service::PresenterService,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// `remote` reads the summary precomputed by the HRMS API.
    pub source: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/evaluations",
    request_body = CreateEvaluationPayload,
    responses(
        (status = 201, description = "Evaluation session created", body = SessionResponse),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_evaluation(
    State(state): State<AppState>,
    ctx: SessionContext,
    ApiJson(payload): ApiJson<CreateEvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.evaluation_service.create_session(&ctx, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::from_session(session, crate::utils::time::now())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/evaluations/{id}",
    params(("id" = i64, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "Evaluation session", body = SessionResponse),
        (status = 404, description = "Evaluation not found")
    )
)]
#[axum::debug_handler]
pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: SessionContext,
) -> Result<impl IntoResponse> {
    let session = state.evaluation_service.session(&ctx, id).await?;
    Ok(Json(SessionResponse::from_session(
        session,
        crate::utils::time::now(),
    )))
}

pub(crate) async fn load_summary(
    state: &AppState,
    ctx: &SessionContext,
    id: i64,
    source: Option<&str>,
) -> Result<EvaluationSummary> {
    match source {
        Some("remote") => state.evaluation_service.remote_summary(ctx, id).await,
        _ => state.evaluation_service.summary(ctx, id).await,
    }
}

#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/summary",
    params(
        ("id" = i64, Path, description = "Evaluation ID"),
        ("source" = Option<String>, Query, description = "`remote` to use the API's own summary")
    ),
    responses(
        (status = 200, description = "Aggregated results", body = EvaluationSummary),
        (status = 404, description = "Evaluation or results not found")
    )
)]
#[axum::debug_handler]
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SummaryQuery>,
    ctx: SessionContext,
) -> Result<impl IntoResponse> {
    let summary = load_summary(&state, &ctx, id, query.source.as_deref()).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/evaluations/{id}/view",
    params(("id" = i64, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "Stars and percentage bars per question", body = crate::services::presenter_service::SummaryView),
        (status = 404, description = "Evaluation or results not found")
    )
)]
#[axum::debug_handler]
pub async fn get_summary_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SummaryQuery>,
    ctx: SessionContext,
) -> Result<impl IntoResponse> {
    let summary = load_summary(&state, &ctx, id, query.source.as_deref()).await?;
    Ok(Json(PresenterService::view(&summary)))
}

#[utoipa::path(
    post,
    path = "/api/evaluations/{id}/answers",
    params(("id" = i64, Path, description = "Evaluation ID")),
    request_body = SubmitAnswersPayload,
    responses(
        (status = 201, description = "Answers saved", body = crate::dto::evaluation_dto::SubmitAnswersResponse),
        (status = 400, description = "Expired session or invalid answers"),
        (status = 404, description = "Evaluation not found")
    )
)]
#[axum::debug_handler]
pub async fn submit_answers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: SessionContext,
    ApiJson(payload): ApiJson<SubmitAnswersPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let saved = state
        .evaluation_service
        .submit_answers(&ctx, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}
