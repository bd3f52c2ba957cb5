use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;
use chrono::Utc;
use log::{info, error};

use crate::config::DatabaseConfig;
use crate::interview::PenaltyLedger;
use super::{DatabaseError, Result, SessionStore};
use super::models::*;

#[derive(Debug)]
pub struct DatabaseManager {
    pool: Pool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!(
            "Connecting to database: {}@{}:{}/{}",
            config.user, config.host, config.port, config.name
        );

        let mut cfg = Config::new();
        cfg.url = Some(config.url());
        cfg.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::ConnectionFailed(format!("pool creation failed: {}", e)))?;

        // Test connection
        let _client = pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(format!("connection test failed: {}", e)))?;

        info!("Database connection established successfully");

        Ok(DatabaseManager { pool })
    }

    pub async fn upsert_profile(&self, email: &str, display_name: &str) -> Result<Profile> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        let row = client
            .query_one(
                r#"
                INSERT INTO profiles (id, email, display_name, created_at, last_active)
                VALUES ($1, $2, $3, $4, $4)
                ON CONFLICT (email)
                DO UPDATE SET display_name = $3, last_active = $4
                RETURNING id, email, display_name, created_at, last_active
                "#,
                &[&id, &email, &display_name, &now],
            )
            .await
            .map_err(|e| {
                error!("Failed to upsert profile for {}: {}", email, e);
                DatabaseError::QueryFailed(format!("profile upsert failed: {}", e))
            })?;

        Ok(Profile {
            id: row.get(0),
            email: row.get(1),
            display_name: row.get(2),
            created_at: row.get(3),
            last_active: row.get(4),
        })
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<SessionRow> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let row = client
            .query_opt(
                r#"
                SELECT id, user_id, role, status, overall_score, tab_switches,
                       device_warnings, penalty_percent, created_at, completed_at
                FROM interview_sessions
                WHERE id = $1
                "#,
                &[&session_id],
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("session lookup failed: {}", e)))?
            .ok_or(DatabaseError::SessionNotFound(session_id))?;

        Ok(Self::session_from_row(&row))
    }

    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<SessionRow>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let rows = client
            .query(
                r#"
                SELECT id, user_id, role, status, overall_score, tab_switches,
                       device_warnings, penalty_percent, created_at, completed_at
                FROM interview_sessions
                WHERE user_id = $1
                ORDER BY created_at DESC
                "#,
                &[&user_id],
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("session list failed: {}", e)))?;

        Ok(rows.iter().map(Self::session_from_row).collect())
    }

    pub async fn list_answers(&self, session_id: Uuid) -> Result<Vec<AnswerRow>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let rows = client
            .query(
                r#"
                SELECT id, session_id, question_number, question_text, answer_text,
                       relevance, clarity, grammar, confidence, feedback, created_at
                FROM interview_answers
                WHERE session_id = $1
                ORDER BY question_number ASC
                "#,
                &[&session_id],
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("answer list failed: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| AnswerRow {
                id: row.get(0),
                session_id: row.get(1),
                question_number: row.get(2),
                question_text: row.get(3),
                answer_text: row.get(4),
                relevance: row.get(5),
                clarity: row.get(6),
                grammar: row.get(7),
                confidence: row.get(8),
                feedback: row.get(9),
                created_at: row.get(10),
            })
            .collect())
    }

    fn session_from_row(row: &tokio_postgres::Row) -> SessionRow {
        SessionRow {
            id: row.get(0),
            user_id: row.get(1),
            role: row.get(2),
            status: row.get(3),
            overall_score: row.get(4),
            tab_switches: row.get(5),
            device_warnings: row.get(6),
            penalty_percent: row.get(7),
            created_at: row.get(8),
            completed_at: row.get(9),
        }
    }
}

impl SessionStore for DatabaseManager {
    async fn create_session(&self, user_id: Uuid, role: &str) -> crate::error::Result<Uuid> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        client
            .execute(
                r#"
                INSERT INTO interview_sessions
                    (id, user_id, role, status, tab_switches, device_warnings,
                     penalty_percent, created_at)
                VALUES ($1, $2, $3, 'in_progress', 0, 0, 0, $4)
                "#,
                &[&id, &user_id, &role, &now],
            )
            .await
            .map_err(|e| {
                error!("Failed to create session for user {}: {}", user_id, e);
                DatabaseError::QueryFailed(format!("session insert failed: {}", e))
            })?;

        info!("Created interview session {} for role '{}'", id, role);
        Ok(id)
    }

    async fn save_answers(
        &self,
        session_id: Uuid,
        answers: &[NewAnswer],
    ) -> crate::error::Result<()> {
        let mut client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        // All-or-nothing: a half-written transcript would corrupt the
        // retry path.
        let tx = client
            .transaction()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("transaction begin failed: {}", e)))?;

        let statement = tx
            .prepare(
                r#"
                INSERT INTO interview_answers
                    (id, session_id, question_number, question_text, answer_text,
                     relevance, clarity, grammar, confidence, feedback, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("prepare failed: {}", e)))?;

        let now = Utc::now();
        for answer in answers {
            tx.execute(
                &statement,
                &[
                    &Uuid::new_v4(),
                    &session_id,
                    &answer.question_number,
                    &answer.question_text,
                    &answer.answer_text,
                    &answer.evaluation.relevance,
                    &answer.evaluation.clarity,
                    &answer.evaluation.grammar,
                    &answer.evaluation.confidence,
                    &answer.evaluation.feedback,
                    &now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("answer insert failed: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("transaction commit failed: {}", e)))?;

        info!("Stored {} answers for session {}", answers.len(), session_id);
        Ok(())
    }

    async fn finalize_session(
        &self,
        session_id: Uuid,
        overall_score: f64,
        ledger: &PenaltyLedger,
    ) -> crate::error::Result<()> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let now = Utc::now();
        let tab_switches = ledger.tab_switches() as i32;
        let device_warnings = ledger.device_warnings() as i32;
        let penalty = ledger.total_penalty_percent();

        // The status guard makes completion write-once.
        let rows_affected = client
            .execute(
                r#"
                UPDATE interview_sessions
                SET status = 'completed',
                    overall_score = $2,
                    tab_switches = $3,
                    device_warnings = $4,
                    penalty_percent = $5,
                    completed_at = $6
                WHERE id = $1 AND status = 'in_progress'
                "#,
                &[&session_id, &overall_score, &tab_switches, &device_warnings, &penalty, &now],
            )
            .await
            .map_err(|e| {
                error!("Failed to finalize session {}: {}", session_id, e);
                DatabaseError::QueryFailed(format!("session finalize failed: {}", e))
            })?;

        if rows_affected == 0 {
            return Err(DatabaseError::AlreadyCompleted(session_id).into());
        }

        info!("Session {} completed with score {:.1}", session_id, overall_score);
        Ok(())
    }

    async fn recent_question_texts(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> crate::error::Result<Vec<String>> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let rows = client
            .query(
                r#"
                SELECT a.question_text
                FROM interview_answers a
                JOIN interview_sessions s ON s.id = a.session_id
                WHERE s.user_id = $1
                ORDER BY a.created_at DESC
                LIMIT $2
                "#,
                &[&user_id, &limit],
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("question history failed: {}", e)))?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}
