use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::evaluation::{EvaluationSession, SessionStatus};

pub const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEvaluationPayload {
    #[validate(range(min = 1))]
    pub subject_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub subject_name: Option<String>,
    #[validate(range(min = 1, max = 10080))]
    pub duration_minutes: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 100))]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AnswerInput {
    pub question_id: i64,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i64>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitAnswersPayload {
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(length(min = 1), nested)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitAnswersResponse {
    pub evaluation_id: i64,
    pub student_id: String,
    pub saved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub remaining_minutes: Option<i64>,
}

impl SessionResponse {
    pub fn from_session(session: EvaluationSession, now: DateTime<Utc>) -> Self {
        Self {
            status: session.effective_status(now),
            remaining_minutes: session.remaining(now).map(|d| d.num_minutes()),
            id: session.id,
            subject_id: session.subject_id,
            subject_name: session.subject_name,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}
