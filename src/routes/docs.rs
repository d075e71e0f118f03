use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::dto::evaluation_dto::{
    AnswerInput, CreateEvaluationPayload, SessionResponse, SubmitAnswersPayload,
    SubmitAnswersResponse,
};
use crate::models::evaluation::SessionStatus;
use crate::models::question::QuestionKind;
use crate::models::summary::{EvaluationSummary, QuestionSummary, SummaryDocument};
use crate::services::export_service::{JsonReport, JsonReportQuestion};
use crate::services::presenter_service::{QuestionView, RatingBar, StarFill, SummaryView};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::evaluation::create_evaluation,
        crate::routes::evaluation::get_evaluation,
        crate::routes::evaluation::get_summary,
        crate::routes::evaluation::get_summary_view,
        crate::routes::evaluation::submit_answers,
        crate::routes::export::export_evaluation,
        crate::routes::export::export_report,
    ),
    components(schemas(
        AnswerInput,
        CreateEvaluationPayload,
        SessionResponse,
        SessionStatus,
        SubmitAnswersPayload,
        SubmitAnswersResponse,
        QuestionKind,
        QuestionSummary,
        EvaluationSummary,
        SummaryDocument,
        JsonReport,
        JsonReportQuestion,
        StarFill,
        RatingBar,
        QuestionView,
        SummaryView,
    )),
    tags((name = "evaluations", description = "Faculty evaluation results and reports"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
