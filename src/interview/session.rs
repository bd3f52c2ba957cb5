use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::oracle::QuestionOracle;
use crate::proctor::ProctorSampler;
use crate::storage::{NewAnswer, SessionStore};
use super::answers::Evaluation;
use super::questions::{Question, QuestionAnswer};
use super::scoring::overall_score;

/// Flat deduction applied for every visibility-hidden event.
pub const TAB_SWITCH_PENALTY: f64 = 5.0;

/// Flat deduction applied for every debounced device warning.
pub const DEVICE_WARNING_PENALTY: f64 = 10.0;

/// Running total of proctoring deductions for one session. Monotonically
/// non-decreasing; reset only when a new session starts. The total is always
/// `5 * tab_switches + 10 * device_warnings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PenaltyLedger {
    tab_switches: u32,
    device_warnings: u32,
    total_penalty_percent: f64,
}

impl PenaltyLedger {
    pub fn record_tab_switch(&mut self) {
        self.tab_switches += 1;
        self.total_penalty_percent += TAB_SWITCH_PENALTY;
    }

    pub fn record_device_warning(&mut self) {
        self.device_warnings += 1;
        self.total_penalty_percent += DEVICE_WARNING_PENALTY;
    }

    pub fn tab_switches(&self) -> u32 {
        self.tab_switches
    }

    pub fn device_warnings(&self) -> u32 {
        self.device_warnings
    }

    pub fn total_penalty_percent(&self) -> f64 {
        self.total_penalty_percent
    }
}

/// Interview phases. `Submitting` can fall back to the last question when
/// evaluation or persistence fails, so no answers are ever lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    RoleSelection,
    QuestionLoop { index: usize },
    Submitting,
    Completed,
}

/// What `submit_answer` did with the recorded answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Moved on; the value is the new question index.
    NextQuestion(usize),
    /// That was the last question; call `submit()`.
    ReadyToSubmit,
}

/// Result of a completed session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub role: String,
    pub overall_score: f64,
    pub evaluations: Vec<Evaluation>,
    pub ledger: PenaltyLedger,
}

/// Drives one interview from role selection through submission. Generic
/// over the oracle and store seams; the proctoring sampler is attached as a
/// shared handle so the flow can start it with the session and stop it at
/// submission.
pub struct InterviewFlow<O, S> {
    oracle: O,
    store: S,
    user_id: Uuid,
    phase: Phase,
    role: String,
    session_id: Option<Uuid>,
    questions: Vec<Question>,
    ledger: PenaltyLedger,
    overall: Option<f64>,
    proctor: Option<Arc<Mutex<ProctorSampler>>>,
}

impl<O: QuestionOracle, S: SessionStore> InterviewFlow<O, S> {
    pub fn new(oracle: O, store: S, user_id: Uuid) -> Self {
        Self {
            oracle,
            store,
            user_id,
            phase: Phase::RoleSelection,
            role: String::new(),
            session_id: None,
            questions: Vec::new(),
            ledger: PenaltyLedger::default(),
            overall: None,
            proctor: None,
        }
    }

    pub fn with_proctor(mut self, proctor: Arc<Mutex<ProctorSampler>>) -> Self {
        self.proctor = Some(proctor);
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn ledger(&self) -> &PenaltyLedger {
        &self.ledger
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    /// Final score, present only once the session is completed.
    pub fn overall_score(&self) -> Option<f64> {
        self.overall
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::QuestionLoop { index } => self.questions.get(index),
            _ => None,
        }
    }

    /// Select a role and fetch the question batch. On success the session
    /// row is persisted as `in_progress`, proctoring starts, and the flow
    /// enters the question loop. On any failure the flow stays in
    /// `RoleSelection` and nothing is persisted.
    pub async fn begin(&mut self, role: &str, resume_hint: Option<&str>) -> Result<()> {
        if self.phase != Phase::RoleSelection {
            return Err(AppError::Validation("interview already started".to_string()));
        }
        let role = role.trim();
        if role.is_empty() {
            return Err(AppError::Validation("a role must be selected".to_string()));
        }

        // Best-effort exclude list; a history lookup failure is not worth
        // blocking the interview over.
        let exclude = match self.store.recent_question_texts(self.user_id, 25).await {
            Ok(texts) => texts,
            Err(e) => {
                warn!("Could not load question history, generating without exclusions: {}", e);
                Vec::new()
            }
        };

        let texts = self.oracle.generate_questions(role, resume_hint, &exclude).await?;
        let session_id = self.store.create_session(self.user_id, role).await?;

        self.role = role.to_string();
        self.session_id = Some(session_id);
        self.questions = texts.into_iter().map(Question::new).collect();
        self.ledger = PenaltyLedger::default();
        self.overall = None;

        if let Some(proctor) = &self.proctor {
            match proctor.lock().start() {
                Ok(()) => info!("Proctoring started for session {}", session_id),
                Err(AppError::CameraAccessDenied(reason)) => {
                    // The interview proceeds without proctoring.
                    warn!("Camera access denied ({}), proctoring disabled", reason);
                }
                Err(e) => warn!("Proctoring failed to start: {}", e),
            }
        }

        info!(
            "Session {} started for role '{}' with {} questions",
            session_id,
            role,
            self.questions.len()
        );
        self.phase = Phase::QuestionLoop { index: 0 };
        Ok(())
    }

    /// Record the answer to the current question and advance. Empty answers
    /// are rejected and the index does not move.
    pub fn submit_answer(&mut self, text: &str) -> Result<AnswerOutcome> {
        let Phase::QuestionLoop { index } = self.phase else {
            return Err(AppError::Validation("no question is awaiting an answer".to_string()));
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("answer cannot be empty".to_string()));
        }

        self.questions[index].answer = Some(trimmed.to_string());

        if index + 1 < self.questions.len() {
            self.phase = Phase::QuestionLoop { index: index + 1 };
            Ok(AnswerOutcome::NextQuestion(index + 1))
        } else {
            self.phase = Phase::Submitting;
            Ok(AnswerOutcome::ReadyToSubmit)
        }
    }

    /// Visibility-hidden notification from the page. Counted
    /// unconditionally, once per event, but only while the question loop is
    /// active.
    pub fn on_visibility_hidden(&mut self) {
        if matches!(self.phase, Phase::QuestionLoop { .. }) {
            self.ledger.record_tab_switch();
            info!(
                "Tab switch recorded ({} total, penalty {}%)",
                self.ledger.tab_switches(),
                self.ledger.total_penalty_percent()
            );
        }
    }

    /// Device-warning notification from the proctoring sampler. Once per
    /// raised (already debounced) event.
    pub fn on_device_warning(&mut self, labels: &[String]) {
        if matches!(self.phase, Phase::QuestionLoop { .. } | Phase::Submitting) {
            self.ledger.record_device_warning();
            info!(
                "Device warning recorded for {:?} ({} total, penalty {}%)",
                labels,
                self.ledger.device_warnings(),
                self.ledger.total_penalty_percent()
            );
        }
    }

    /// Evaluate the transcript, aggregate the score, and persist the
    /// completed session. Any failure drops the flow back onto the last
    /// question with every answer intact so the user can retry. The phase
    /// gate doubles as the double-submit guard: one submission is permitted
    /// per `Submitting` entry.
    pub async fn submit(&mut self) -> Result<SessionSummary> {
        if self.phase != Phase::Submitting {
            return Err(AppError::Validation("session is not ready for submission".to_string()));
        }
        let session_id = self
            .session_id
            .ok_or_else(|| AppError::Validation("no active session".to_string()))?;

        if let Some(proctor) = &self.proctor {
            proctor.lock().stop();
        }

        let transcript: Vec<QuestionAnswer> = self
            .questions
            .iter()
            .map(|q| QuestionAnswer {
                question: q.text.clone(),
                answer: q.answer.clone().unwrap_or_default(),
            })
            .collect();

        let evaluations = match self.oracle.evaluate_answers(&self.role, &transcript).await {
            Ok(evaluations) => evaluations,
            Err(e) => {
                warn!("Evaluation failed, returning to question loop: {}", e);
                self.revert_to_last_question();
                return Err(e);
            }
        };

        let score = overall_score(&evaluations, self.ledger.total_penalty_percent())?;

        let records: Vec<NewAnswer> = transcript
            .iter()
            .zip(evaluations.iter())
            .enumerate()
            .map(|(i, (qa, evaluation))| NewAnswer {
                question_number: i as i32 + 1,
                question_text: qa.question.clone(),
                answer_text: qa.answer.clone(),
                evaluation: evaluation.clone(),
            })
            .collect();

        if let Err(e) = self.store.save_answers(session_id, &records).await {
            warn!("Answer persistence failed, returning to question loop: {}", e);
            self.revert_to_last_question();
            return Err(e);
        }
        if let Err(e) = self.store.finalize_session(session_id, score, &self.ledger).await {
            warn!("Session finalize failed, returning to question loop: {}", e);
            self.revert_to_last_question();
            return Err(e);
        }

        self.phase = Phase::Completed;
        self.overall = Some(score);
        info!("Session {} submitted, overall score {:.1}", session_id, score);

        Ok(SessionSummary {
            session_id,
            role: self.role.clone(),
            overall_score: score,
            evaluations,
            ledger: self.ledger.clone(),
        })
    }

    fn revert_to_last_question(&mut self) {
        let last = self.questions.len().saturating_sub(1);
        self.phase = Phase::QuestionLoop { index: last };
    }
}
