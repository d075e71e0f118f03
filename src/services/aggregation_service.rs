use std::collections::{HashMap, HashSet};

use crate::models::answer::Answer;
use crate::models::evaluation::EvaluationSession;
use crate::models::question::{Question, QuestionKind};
use crate::models::summary::{EvaluationSummary, QuestionSummary, RatingsBreakdown};
use crate::utils::math::{mean, round1};

pub struct AggregationService;

impl AggregationService {
    /// Builds the summary of one session from its raw answer rows.
    ///
    /// Every question in `questions` appears in the output, in input order,
    /// even when nobody answered it. Remarks questions collect their text but
    /// stay out of all rating arithmetic.
    pub fn summarize(
        session: &EvaluationSession,
        questions: &[Question],
        answers: &[Answer],
    ) -> EvaluationSummary {
        let mut by_question: HashMap<i64, Vec<&Answer>> = HashMap::new();
        let mut students: HashSet<&str> = HashSet::new();

        for answer in answers {
            if answer.evaluation_id != session.id {
                tracing::warn!(
                    evaluation_id = session.id,
                    answer_evaluation_id = answer.evaluation_id,
                    "ignoring answer from another evaluation"
                );
                continue;
            }
            if !questions.iter().any(|q| q.id == answer.question_id) {
                tracing::warn!(
                    evaluation_id = session.id,
                    question_id = answer.question_id,
                    "ignoring answer to unknown question"
                );
                continue;
            }
            students.insert(answer.student_id.as_str());
            by_question.entry(answer.question_id).or_default().push(answer);
        }

        let summaries: Vec<QuestionSummary> = questions
            .iter()
            .map(|q| {
                let rows = by_question.get(&q.id).map(Vec::as_slice).unwrap_or(&[]);
                Self::summarize_question(q, rows)
            })
            .collect();

        let overall_average = Self::overall_average(&summaries);

        tracing::debug!(
            evaluation_id = session.id,
            questions = summaries.len(),
            students = students.len(),
            overall_average,
            "evaluation summarized"
        );

        EvaluationSummary {
            evaluation_id: session.id,
            subject_id: session.subject_id,
            subject_name: session.subject_name.clone(),
            total_students: students.len() as u32,
            overall_average,
            questions: summaries,
            generated_at: Some(crate::utils::time::now()),
        }
    }

    fn summarize_question(question: &Question, rows: &[&Answer]) -> QuestionSummary {
        let mut breakdown = RatingsBreakdown::zeroed();
        let mut remarks = Vec::new();
        let mut total_responses = 0u32;
        let mut rating_sum = 0u64;

        match question.kind {
            QuestionKind::Rated => {
                for answer in rows {
                    match answer.valid_rating() {
                        Some(rating) => {
                            breakdown.record(rating);
                            rating_sum += rating as u64;
                            total_responses += 1;
                        }
                        None => tracing::warn!(
                            question_id = question.id,
                            student_id = %answer.student_id,
                            rating = ?answer.rating,
                            "skipping answer without a 1-5 rating"
                        ),
                    }
                }
            }
            QuestionKind::Remarks => {
                for answer in rows {
                    if let Some(text) = answer.remarks_text() {
                        remarks.push(text.to_string());
                        total_responses += 1;
                    }
                }
            }
        }

        let average_rating = if total_responses == 0 || question.kind == QuestionKind::Remarks {
            0.0
        } else {
            round1(rating_sum as f64 / total_responses as f64)
        };

        QuestionSummary {
            question_id: question.id,
            text: question.text.clone(),
            category: question.category.clone(),
            kind: question.kind,
            average_rating,
            total_responses,
            ratings_breakdown: breakdown,
            remarks,
        }
    }

    /// Unweighted mean of the per-question averages of rated questions.
    /// Rated questions with no responses count as 0.
    pub fn overall_average(questions: &[QuestionSummary]) -> f64 {
        round1(mean(
            questions
                .iter()
                .filter(|q| q.kind == QuestionKind::Rated)
                .map(|q| q.average_rating),
        ))
    }
}
