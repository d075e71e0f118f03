use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::dto::evaluation_dto::{
    CreateEvaluationPayload, SubmitAnswersPayload, SubmitAnswersResponse,
    DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES,
};
use crate::error::{Error, Result};
use crate::middleware::session::SessionContext;
use crate::models::answer::Answer;
use crate::models::evaluation::{EvaluationSession, NewEvaluationSession, SessionStatus};
use crate::models::question::{apply_remarks_overrides, Question, QuestionKind};
use crate::models::summary::{EvaluationSummary, SummaryDocument};
use crate::services::aggregation_service::AggregationService;
use crate::services::api_client::ApiClient;

#[derive(Clone)]
pub struct EvaluationService {
    api: ApiClient,
    remarks_question_ids: Vec<i64>,
}

impl EvaluationService {
    pub fn new(api: ApiClient, remarks_question_ids: Vec<i64>) -> Self {
        Self {
            api,
            remarks_question_ids,
        }
    }

    pub async fn session(&self, ctx: &SessionContext, id: i64) -> Result<EvaluationSession> {
        self.api.fetch_session(ctx, id).await
    }

    pub async fn questions(&self, ctx: &SessionContext) -> Result<Vec<Question>> {
        let mut questions = self.api.fetch_questions(ctx).await?;
        apply_remarks_overrides(&mut questions, &self.remarks_question_ids);
        Ok(questions)
    }

    /// Recomputes the summary from the remote answer rows on every call.
    pub async fn summary(&self, ctx: &SessionContext, id: i64) -> Result<EvaluationSummary> {
        let (session, questions, answers) = tokio::try_join!(
            self.session(ctx, id),
            self.questions(ctx),
            self.api.fetch_answers(ctx, id),
        )?;
        tracing::info!(
            request_id = %ctx.request_id,
            evaluation_id = id,
            answers = answers.len(),
            "computing evaluation summary"
        );
        Ok(AggregationService::summarize(&session, &questions, &answers))
    }

    /// Summary precomputed by the remote API, rejected when it has no
    /// question list.
    pub async fn remote_summary(&self, ctx: &SessionContext, id: i64) -> Result<EvaluationSummary> {
        let doc: SummaryDocument = self.api.fetch_summary_document(ctx, id).await?;
        self.summary_from_document(doc)
    }

    /// Checks a summary received from outside and applies the configured
    /// remarks question ids to it.
    pub fn summary_from_document(&self, doc: SummaryDocument) -> Result<EvaluationSummary> {
        let mut summary = EvaluationSummary::try_from(doc)?;
        summary.apply_remarks_overrides(&self.remarks_question_ids);
        Ok(summary)
    }

    pub async fn create_session(
        &self,
        ctx: &SessionContext,
        payload: CreateEvaluationPayload,
    ) -> Result<EvaluationSession> {
        let new_session = build_new_session(payload, Utc::now())?;
        let session = self.api.create_session(ctx, &new_session).await?;
        tracing::info!(
            request_id = %ctx.request_id,
            evaluation_id = session.id,
            subject_id = session.subject_id,
            expires_at = %session.expires_at,
            "evaluation session created"
        );
        Ok(session)
    }

    pub async fn submit_answers(
        &self,
        ctx: &SessionContext,
        evaluation_id: i64,
        payload: SubmitAnswersPayload,
    ) -> Result<SubmitAnswersResponse> {
        let (session, questions, existing) = tokio::try_join!(
            self.session(ctx, evaluation_id),
            self.questions(ctx),
            self.api.fetch_answers(ctx, evaluation_id),
        )?;
        let rows = validate_submission(&session, &questions, &existing, &payload, Utc::now())?;
        self.api.create_answers(ctx, &rows).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            evaluation_id,
            student_id = %payload.student_id,
            saved = rows.len(),
            "evaluation answers submitted"
        );
        Ok(SubmitAnswersResponse {
            evaluation_id,
            student_id: payload.student_id,
            saved: rows.len(),
        })
    }
}

pub fn build_new_session(
    payload: CreateEvaluationPayload,
    now: DateTime<Utc>,
) -> Result<NewEvaluationSession> {
    let expires_at = match (payload.expires_at, payload.duration_minutes) {
        (Some(_), Some(_)) => {
            return Err(Error::BadRequest(
                "Give either expires_at or duration_minutes, not both".to_string(),
            ))
        }
        (Some(at), None) => {
            if at <= now {
                return Err(Error::BadRequest("expires_at must be in the future".to_string()));
            }
            if at - now > Duration::minutes(MAX_DURATION_MINUTES) {
                return Err(Error::BadRequest(
                    "An evaluation cannot stay open longer than 7 days".to_string(),
                ));
            }
            at
        }
        (None, minutes) => now + Duration::minutes(minutes.unwrap_or(DEFAULT_DURATION_MINUTES)),
    };

    Ok(NewEvaluationSession {
        subject_id: payload.subject_id,
        subject_name: payload.subject_name,
        created_by: payload.created_by,
        created_at: now,
        expires_at,
        status: SessionStatus::Active,
    })
}

/// Checks one student's submission and turns it into answer rows.
pub fn validate_submission(
    session: &EvaluationSession,
    questions: &[Question],
    existing: &[Answer],
    payload: &SubmitAnswersPayload,
    now: DateTime<Utc>,
) -> Result<Vec<Answer>> {
    if !session.is_open(now) {
        return Err(Error::BadRequest(
            "This evaluation has expired and no longer accepts answers".to_string(),
        ));
    }

    let student_id = payload.student_id.trim();
    if existing
        .iter()
        .any(|a| a.evaluation_id == session.id && a.student_id == student_id)
    {
        return Err(Error::BadRequest(
            "You have already submitted this evaluation".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(payload.answers.len());
    for input in &payload.answers {
        let question = questions
            .iter()
            .find(|q| q.id == input.question_id)
            .ok_or_else(|| {
                Error::BadRequest(format!("Unknown question {}", input.question_id))
            })?;
        if !seen.insert(input.question_id) {
            return Err(Error::BadRequest(format!(
                "Question {} answered more than once",
                input.question_id
            )));
        }

        let remarks = input
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let rating = match question.kind {
            QuestionKind::Rated => match input.rating {
                Some(r) if (1..=5).contains(&r) => Some(r),
                Some(r) => {
                    return Err(Error::BadRequest(format!(
                        "Rating {} for question {} is outside 1-5",
                        r, question.id
                    )))
                }
                None => {
                    return Err(Error::BadRequest(format!(
                        "Question {} needs a rating",
                        question.id
                    )))
                }
            },
            QuestionKind::Remarks if remarks.is_none() => continue,
            QuestionKind::Remarks => None,
        };

        rows.push(Answer {
            evaluation_id: session.id,
            question_id: question.id,
            student_id: student_id.to_string(),
            rating,
            remarks,
        });
    }

    if let Some(missing) = questions
        .iter()
        .filter(|q| q.is_rated())
        .find(|q| !seen.contains(&q.id))
    {
        return Err(Error::BadRequest(format!(
            "Question {} is required",
            missing.id
        )));
    }
    if rows.is_empty() {
        return Err(Error::BadRequest("No answers to submit".to_string()));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::evaluation_dto::AnswerInput;

    fn session(now: DateTime<Utc>) -> EvaluationSession {
        EvaluationSession {
            id: 2,
            subject_id: 5,
            subject_name: None,
            created_by: None,
            created_at: now - Duration::minutes(10),
            expires_at: now + Duration::minutes(50),
            status: SessionStatus::Active,
        }
    }

    fn questions() -> Vec<Question> {
        vec![
            Question {
                id: 1,
                text: "Knows the subject".into(),
                category: None,
                kind: QuestionKind::Rated,
            },
            Question {
                id: 2,
                text: "Comments".into(),
                category: None,
                kind: QuestionKind::Remarks,
            },
        ]
    }

    fn payload(answers: Vec<AnswerInput>) -> SubmitAnswersPayload {
        SubmitAnswersPayload {
            student_id: " 2021-0042 ".into(),
            answers,
        }
    }

    fn input(question_id: i64, rating: Option<i64>, remarks: Option<&str>) -> AnswerInput {
        AnswerInput {
            question_id,
            rating,
            remarks: remarks.map(str::to_string),
        }
    }

    #[test]
    fn accepts_complete_submission() {
        let now = Utc::now();
        let rows = validate_submission(
            &session(now),
            &questions(),
            &[],
            &payload(vec![input(1, Some(4), None), input(2, Some(3), Some(" Good "))]),
            now,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_id, "2021-0042");
        assert_eq!(rows[0].rating, Some(4));
        // Remarks questions never carry a rating.
        assert_eq!(rows[1].rating, None);
        assert_eq!(rows[1].remarks.as_deref(), Some("Good"));
    }

    #[test]
    fn blank_remarks_are_not_sent() {
        let now = Utc::now();
        let rows = validate_submission(
            &session(now),
            &questions(),
            &[],
            &payload(vec![input(1, Some(5), None), input(2, None, Some("   "))]),
            now,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question_id, 1);
    }

    #[test]
    fn rejects_expired_session() {
        let now = Utc::now();
        let mut s = session(now);
        s.status = SessionStatus::Expired;
        let err = validate_submission(&s, &questions(), &[], &payload(vec![input(1, Some(4), None)]), now)
            .unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn rejects_second_submission_by_same_student() {
        let now = Utc::now();
        let existing = vec![Answer {
            evaluation_id: 2,
            question_id: 1,
            student_id: "2021-0042".into(),
            rating: Some(5),
            remarks: None,
        }];
        let err = validate_submission(
            &session(now),
            &questions(),
            &existing,
            &payload(vec![input(1, Some(4), None)]),
            now,
        )
        .unwrap_err();
        assert!(err.to_string().contains("already submitted"));
    }

    #[test]
    fn rejects_bad_answers() {
        let now = Utc::now();
        let s = session(now);
        let qs = questions();
        let cases = vec![
            (vec![input(1, Some(6), None)], "outside 1-5"),
            (vec![input(1, None, None)], "needs a rating"),
            (vec![input(1, Some(2), None), input(1, Some(3), None)], "more than once"),
            (vec![input(1, Some(2), None), input(9, Some(3), None)], "Unknown question 9"),
            (vec![input(2, None, Some("ok"))], "Question 1 is required"),
        ];
        for (answers, expected) in cases {
            let err = validate_submission(&s, &qs, &[], &payload(answers), now).unwrap_err();
            assert!(matches!(err, Error::BadRequest(_)));
            assert!(err.to_string().contains(expected), "{} vs {}", err, expected);
        }
    }

    #[test]
    fn new_session_uses_duration_or_expiry() {
        let now = Utc::now();
        let base = CreateEvaluationPayload {
            subject_id: 5,
            subject_name: Some("Ms. Lim".into()),
            duration_minutes: None,
            expires_at: None,
            created_by: None,
        };

        let s = build_new_session(base.clone(), now).unwrap();
        assert_eq!(s.expires_at, now + Duration::minutes(DEFAULT_DURATION_MINUTES));

        let s = build_new_session(
            CreateEvaluationPayload {
                duration_minutes: Some(15),
                ..base.clone()
            },
            now,
        )
        .unwrap();
        assert_eq!(s.expires_at, now + Duration::minutes(15));

        let past = CreateEvaluationPayload {
            expires_at: Some(now - Duration::minutes(1)),
            ..base.clone()
        };
        assert!(build_new_session(past, now).is_err());

        let both = CreateEvaluationPayload {
            expires_at: Some(now + Duration::minutes(5)),
            duration_minutes: Some(5),
            ..base
        };
        assert!(build_new_session(both, now).is_err());
    }
}
