pub mod config;
pub mod error;
pub mod interview;
pub mod oracle;
pub mod proctor;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use interview::{
    AnswerOutcome, Evaluation, InterviewFlow, PenaltyLedger, Phase, Question, QuestionAnswer,
    SessionSummary, QUESTIONS_PER_SESSION,
};
pub use oracle::{OracleClient, QuestionOracle};
pub use proctor::{DeviceWarning, ProctorSampler};
pub use storage::{DatabaseManager, ResumeStore, SessionStore};
