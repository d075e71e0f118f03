use serde::Serialize;
use utoipa::ToSchema;

use crate::models::question::QuestionKind;
use crate::models::summary::{EvaluationSummary, QuestionSummary};
use crate::utils::math::{percentage, round1};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StarFill {
    Full,
    Half,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RatingBar {
    pub rating: u8,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QuestionView {
    pub question_id: i64,
    pub text: String,
    pub category: Option<String>,
    pub kind: QuestionKind,
    pub average_rating: f64,
    pub total_responses: u32,
    pub stars: Vec<StarFill>,
    pub label: String,
    pub bars: Vec<RatingBar>,
    pub remarks: Vec<String>,
}

/// What the dashboard draws for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SummaryView {
    pub evaluation_id: i64,
    pub subject_id: i64,
    pub subject_name: Option<String>,
    pub total_students: u32,
    pub overall_average: f64,
    pub overall_stars: Vec<StarFill>,
    pub overall_label: String,
    pub questions: Vec<QuestionView>,
}

pub struct PresenterService;

impl PresenterService {
    pub fn view(summary: &EvaluationSummary) -> SummaryView {
        SummaryView {
            evaluation_id: summary.evaluation_id,
            subject_id: summary.subject_id,
            subject_name: summary.subject_name.clone(),
            total_students: summary.total_students,
            overall_average: summary.overall_average,
            overall_stars: Self::stars(summary.overall_average),
            overall_label: Self::rating_label(summary.overall_average).to_string(),
            questions: summary.questions.iter().map(Self::question_view).collect(),
        }
    }

    fn question_view(q: &QuestionSummary) -> QuestionView {
        let (stars, label, bars) = match q.kind {
            QuestionKind::Rated => (
                Self::stars(q.average_rating),
                Self::rating_label(q.average_rating).to_string(),
                Self::bars(q),
            ),
            QuestionKind::Remarks => (Vec::new(), "Remarks".to_string(), Vec::new()),
        };

        QuestionView {
            question_id: q.question_id,
            text: q.text.clone(),
            category: q.category.clone(),
            kind: q.kind,
            average_rating: q.average_rating,
            total_responses: q.total_responses,
            stars,
            label,
            bars,
            remarks: q.remarks.clone(),
        }
    }

    /// Five slots; a fractional part of at least .5 shows as a half star.
    pub fn stars(average: f64) -> Vec<StarFill> {
        let clamped = average.clamp(0.0, 5.0);
        let full = clamped.floor() as usize;
        let half = clamped - clamped.floor() >= 0.5;
        (0..5)
            .map(|i| {
                if i < full {
                    StarFill::Full
                } else if i == full && half {
                    StarFill::Half
                } else {
                    StarFill::Empty
                }
            })
            .collect()
    }

    pub fn stars_text(average: f64) -> String {
        Self::stars(average)
            .into_iter()
            .map(|s| match s {
                StarFill::Full => '★',
                StarFill::Half => '½',
                StarFill::Empty => '☆',
            })
            .collect()
    }

    pub fn rating_label(average: f64) -> &'static str {
        match average {
            a if a >= 4.5 => "Excellent",
            a if a >= 3.5 => "Very Good",
            a if a >= 2.5 => "Good",
            a if a >= 1.5 => "Fair",
            a if a > 0.0 => "Poor",
            _ => "No ratings",
        }
    }

    /// Percentage bars from 5 down to 1.
    pub fn bars(q: &QuestionSummary) -> Vec<RatingBar> {
        let denominator = if q.total_responses > 0 {
            q.total_responses
        } else {
            q.ratings_breakdown.total()
        };
        q.ratings_breakdown
            .descending()
            .map(|(rating, count)| RatingBar {
                rating,
                count,
                percentage: round1(percentage(count, denominator)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::summary::RatingsBreakdown;

    fn question(breakdown: RatingsBreakdown, total: u32, avg: f64) -> QuestionSummary {
        QuestionSummary {
            question_id: 1,
            text: "Comes to class prepared".into(),
            category: None,
            kind: QuestionKind::Rated,
            average_rating: avg,
            total_responses: total,
            ratings_breakdown: breakdown,
            remarks: Vec::new(),
        }
    }

    #[test]
    fn stars_round_half_up_per_slot() {
        use StarFill::*;
        assert_eq!(PresenterService::stars(4.7), vec![Full, Full, Full, Full, Half]);
        assert_eq!(PresenterService::stars(3.2), vec![Full, Full, Full, Empty, Empty]);
        assert_eq!(PresenterService::stars(0.0), vec![Empty; 5]);
        assert_eq!(PresenterService::stars(5.0), vec![Full; 5]);
        assert_eq!(PresenterService::stars_text(2.5), "★★½☆☆");
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(PresenterService::rating_label(4.7), "Excellent");
        assert_eq!(PresenterService::rating_label(3.5), "Very Good");
        assert_eq!(PresenterService::rating_label(2.9), "Good");
        assert_eq!(PresenterService::rating_label(1.5), "Fair");
        assert_eq!(PresenterService::rating_label(1.0), "Poor");
        assert_eq!(PresenterService::rating_label(0.0), "No ratings");
    }

    #[test]
    fn bars_are_percentages_of_responses() {
        let breakdown: RatingsBreakdown = [(5, 2), (4, 1)].into_iter().collect();
        let bars = PresenterService::bars(&question(breakdown, 3, 4.7));
        assert_eq!(bars.len(), 5);
        assert_eq!(bars[0], RatingBar { rating: 5, count: 2, percentage: 66.7 });
        assert_eq!(bars[1], RatingBar { rating: 4, count: 1, percentage: 33.3 });
        assert!(bars[2..].iter().all(|b| b.count == 0 && b.percentage == 0.0));
    }

    #[test]
    fn missing_breakdown_gives_empty_bars() {
        let bars = PresenterService::bars(&question(RatingsBreakdown::default(), 12, 3.9));
        assert!(bars.iter().all(|b| b.count == 0 && b.percentage == 0.0));
    }

    #[test]
    fn view_does_not_touch_summary() {
        let summary = EvaluationSummary {
            evaluation_id: 1,
            subject_id: 2,
            subject_name: None,
            total_students: 3,
            overall_average: 4.7,
            questions: vec![question(RatingsBreakdown::zeroed(), 0, 0.0)],
            generated_at: None,
        };
        let before = summary.clone();
        let view = PresenterService::view(&summary);
        assert_eq!(summary, before);
        assert_eq!(view.overall_label, "Excellent");
        assert_eq!(view.questions[0].label, "No ratings");
    }
}
