use serde::{Deserialize, Serialize};

use crate::utils::serde_ext::deserialize_id_flexible;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// One student's answer to one question; unique per
/// `(evaluation_id, question_id, student_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub evaluation_id: i64,
    pub question_id: i64,
    #[serde(deserialize_with = "deserialize_id_flexible")]
    pub student_id: String,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl Answer {
    /// The rating when it lies on the 1..=5 scale.
    pub fn valid_rating(&self) -> Option<u8> {
        self.rating
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .map(|r| r as u8)
    }

    pub fn remarks_text(&self) -> Option<&str> {
        self.remarks
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_id_accepts_numbers_and_strings() {
        let a: Answer = serde_json::from_value(serde_json::json!({
            "evaluation_id": 1, "question_id": 2, "student_id": 20210042, "rating": 4
        }))
        .unwrap();
        assert_eq!(a.student_id, "20210042");

        let b: Answer = serde_json::from_value(serde_json::json!({
            "evaluation_id": 1, "question_id": 2, "student_id": "S-7", "remarks": "  "
        }))
        .unwrap();
        assert_eq!(b.student_id, "S-7");
        assert_eq!(b.valid_rating(), None);
        assert_eq!(b.remarks_text(), None);
    }

    #[test]
    fn out_of_scale_rating_is_not_valid() {
        let mut a = Answer {
            evaluation_id: 1,
            question_id: 1,
            student_id: "s".into(),
            rating: Some(6),
            remarks: None,
        };
        assert_eq!(a.valid_rating(), None);
        a.rating = Some(0);
        assert_eq!(a.valid_rating(), None);
        a.rating = Some(5);
        assert_eq!(a.valid_rating(), Some(5));
    }
}
