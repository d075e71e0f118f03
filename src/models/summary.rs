use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::error::{Error, Result};
use crate::models::question::QuestionKind;
use crate::utils::serde_ext::deserialize_null_default;

pub const RATING_SCALE: [u8; 5] = [1, 2, 3, 4, 5];

/// Count of answers per rating value. Always serializes keys 1..=5; absent
/// or null counts read back as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingsBreakdown(BTreeMap<u8, u32>);

impl RatingsBreakdown {
    pub fn zeroed() -> Self {
        Self(RATING_SCALE.iter().map(|r| (*r, 0)).collect())
    }

    pub fn record(&mut self, rating: u8) {
        *self.0.entry(rating).or_insert(0) += 1;
    }

    pub fn count(&self, rating: u8) -> u32 {
        self.0.get(&rating).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        RATING_SCALE.iter().map(|r| self.count(*r)).sum()
    }

    /// `(rating, count)` pairs from 5 down to 1.
    pub fn descending(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        RATING_SCALE.iter().rev().map(move |r| (*r, self.count(*r)))
    }
}

impl Serialize for RatingsBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(RATING_SCALE.iter().map(|r| (*r, self.count(*r))))
    }
}

impl<'de> Deserialize<'de> for RatingsBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<BTreeMap<u8, Option<u32>>>::deserialize(deserializer)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(|(rating, count)| (rating, count.unwrap_or(0)))
            .collect())
    }
}

impl FromIterator<(u8, u32)> for RatingsBreakdown {
    fn from_iter<I: IntoIterator<Item = (u8, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuestionSummary {
    pub question_id: i64,
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub kind: QuestionKind,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub average_rating: f64,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub total_responses: u32,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub ratings_breakdown: RatingsBreakdown,
    #[serde(
        default,
        deserialize_with = "deserialize_null_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub remarks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EvaluationSummary {
    pub evaluation_id: i64,
    pub subject_id: i64,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub total_students: u32,
    #[serde(default)]
    pub overall_average: f64,
    pub questions: Vec<QuestionSummary>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl EvaluationSummary {
    pub fn rated_questions(&self) -> impl Iterator<Item = &QuestionSummary> {
        self.questions.iter().filter(|q| q.kind == QuestionKind::Rated)
    }

    pub fn remarks_questions(&self) -> impl Iterator<Item = &QuestionSummary> {
        self.questions.iter().filter(|q| q.kind == QuestionKind::Remarks)
    }

    /// Marks the listed question ids as free-text remarks.
    pub fn apply_remarks_overrides(&mut self, remarks_ids: &[i64]) {
        for q in self.questions.iter_mut() {
            if remarks_ids.contains(&q.question_id) {
                q.kind = QuestionKind::Remarks;
            }
        }
    }
}

/// A summary as it arrives from outside (remote API or request body), before
/// the `questions` array has been checked for presence.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SummaryDocument {
    #[serde(default)]
    pub evaluation_id: i64,
    #[serde(default)]
    pub subject_id: i64,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub total_students: u32,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub overall_average: f64,
    #[serde(default)]
    pub questions: Option<Vec<QuestionSummary>>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl TryFrom<SummaryDocument> for EvaluationSummary {
    type Error = Error;

    fn try_from(doc: SummaryDocument) -> Result<Self> {
        let questions = doc.questions.ok_or_else(|| {
            Error::NotFound("No evaluation results found for this session".to_string())
        })?;
        Ok(Self {
            evaluation_id: doc.evaluation_id,
            subject_id: doc.subject_id,
            subject_name: doc.subject_name,
            total_students: doc.total_students,
            overall_average: doc.overall_average,
            questions,
            generated_at: doc.generated_at,
        })
    }
}
