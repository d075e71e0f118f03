use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Answered on the 1..=5 scale.
    #[default]
    Rated,
    /// Free-text remarks, never part of rating arithmetic.
    Remarks,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: i64,
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_rated(&self) -> bool {
        self.kind == QuestionKind::Rated
    }
}

/// Forces `Remarks` on every question whose id is listed in `remarks_ids`.
pub fn apply_remarks_overrides(questions: &mut [Question], remarks_ids: &[i64]) {
    for q in questions.iter_mut() {
        if remarks_ids.contains(&q.id) {
            q.kind = QuestionKind::Remarks;
        }
    }
}
