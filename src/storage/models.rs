use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::interview::Evaluation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub status: String,
    pub overall_score: Option<f64>,
    pub tab_switches: i32,
    pub device_warnings: i32,
    pub penalty_percent: f64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub question_number: i32,
    pub question_text: String,
    pub answer_text: String,
    pub relevance: f64,
    pub clarity: f64,
    pub grammar: f64,
    pub confidence: f64,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

/// Answer record as produced by the session state machine at submission,
/// before it gets a row id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAnswer {
    pub question_number: i32,
    pub question_text: String,
    pub answer_text: String,
    pub evaluation: Evaluation,
}
