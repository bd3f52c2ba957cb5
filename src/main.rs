use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use log::warn;
use uuid::Uuid;

use mockview::oracle::QuestionOracle;
use mockview::{AppConfig, AppError, AnswerOutcome, DatabaseManager, InterviewFlow, OracleClient};

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Terminal front end for the interview core. The hosted product drives the
/// same flow from a browser, with the proctoring sampler attached to the
/// user's webcam; here answers come from stdin and proctoring is left off.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let oracle = OracleClient::new(&config.oracle);
    let store = DatabaseManager::new(&config.database)
        .await
        .context("failed to connect to the database")?;

    let user_id = match std::env::var("MOCKVIEW_USER_ID") {
        Ok(raw) => Uuid::parse_str(&raw).context("MOCKVIEW_USER_ID is not a valid UUID")?,
        Err(_) => {
            let id = Uuid::new_v4();
            warn!("MOCKVIEW_USER_ID not set, using throwaway user {}", id);
            id
        }
    };

    println!("=== MockView Interview Session ===");
    let role = prompt("Role to interview for: ")?;
    let hint = prompt("Resume summary (optional, enter to skip): ")?;
    let hint = if hint.is_empty() { None } else { Some(hint.as_str()) };

    let mut flow = InterviewFlow::new(oracle.clone(), store, user_id);
    flow.begin(&role, hint).await?;

    let total = flow.questions().len();
    let mut index = 0;
    loop {
        let question = flow
            .current_question()
            .map(|q| q.text.clone())
            .unwrap_or_default();
        println!("\nQuestion {}/{}: {}", index + 1, total, question);

        let answer = prompt("> ")?;
        match flow.submit_answer(&answer) {
            Ok(AnswerOutcome::NextQuestion(next)) => index = next,
            Ok(AnswerOutcome::ReadyToSubmit) => break,
            Err(AppError::Validation(reason)) => {
                println!("{}", reason);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("\nSubmitting your interview for evaluation...");
    let summary = loop {
        match flow.submit().await {
            Ok(summary) => break summary,
            Err(e @ (AppError::Persistence(_) | AppError::Oracle(_))) => {
                println!("Submission failed ({}). Your answers are safe.", e);
                let again = prompt("Retry submission? [y/N] ")?;
                if !again.eq_ignore_ascii_case("y") {
                    return Ok(());
                }
                // the failure path re-opens the last question
                let last = prompt("Confirm your final answer again:\n> ")?;
                flow.submit_answer(&last)?;
            }
            Err(e) => return Err(e.into()),
        }
    };

    println!("\n=== Results ===");
    println!("Overall score: {:.1}/100", summary.overall_score);
    println!(
        "Penalties: {} tab switches, {} device warnings (-{}%)",
        summary.ledger.tab_switches(),
        summary.ledger.device_warnings(),
        summary.ledger.total_penalty_percent()
    );
    for (i, evaluation) in summary.evaluations.iter().enumerate() {
        println!("Q{}: {:.1} - {}", i + 1, evaluation.average(), evaluation.feedback);
    }

    match oracle.generate_coaching(&summary.role, &summary.evaluations).await {
        Ok(coaching) => println!("\nCoaching:\n{}", coaching),
        Err(e) => warn!("Coaching generation failed: {}", e),
    }

    Ok(())
}
