use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Expired,
}

/// A time-boxed faculty evaluation of one subject (teacher).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationSession {
    pub id: i64,
    pub subject_id: i64,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub status: SessionStatus,
}

impl EvaluationSession {
    /// Stored status, overridden to `Expired` once `expires_at` has passed.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SessionStatus {
        if self.status == SessionStatus::Expired || self.expires_at <= now {
            SessionStatus::Expired
        } else {
            SessionStatus::Active
        }
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == SessionStatus::Active
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_open(now) {
            Some(self.expires_at - now)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEvaluationSession {
    pub subject_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: SessionStatus,
}
