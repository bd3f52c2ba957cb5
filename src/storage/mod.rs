pub mod postgres;
pub mod models;
pub mod files;

pub use postgres::DatabaseManager;
pub use models::{AnswerRow, NewAnswer, Profile, SessionRow};
pub use files::ResumeStore;

use thiserror::Error;
use uuid::Uuid;

use crate::interview::PenaltyLedger;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("session {0} is already completed")]
    AlreadyCompleted(Uuid),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Persistence seam consumed by the session state machine. Implemented by
/// [`DatabaseManager`] in production and by in-memory stand-ins in tests.
#[allow(async_fn_in_trait)]
pub trait SessionStore {
    /// Insert the session row in `in_progress` state and return its id.
    async fn create_session(&self, user_id: Uuid, role: &str) -> crate::error::Result<Uuid>;

    /// Bulk-insert one answer record per question, in question order.
    async fn save_answers(
        &self,
        session_id: Uuid,
        answers: &[NewAnswer],
    ) -> crate::error::Result<()>;

    /// Write the final score, penalty counters, and completion time; flips
    /// status to `completed`. Write-once: a second call fails.
    async fn finalize_session(
        &self,
        session_id: Uuid,
        overall_score: f64,
        ledger: &PenaltyLedger,
    ) -> crate::error::Result<()>;

    /// Question texts this user has already been asked, newest first. Used
    /// as the oracle's exclude list; best-effort.
    async fn recent_question_texts(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> crate::error::Result<Vec<String>>;
}
