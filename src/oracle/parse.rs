use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::interview::{Evaluation, QUESTIONS_PER_SESSION};
use crate::interview::scoring::clamp_score;

/// Question appended when the oracle produced fewer than five usable entries.
pub const FILLER_QUESTION: &str =
    "Tell me about a challenging problem you solved recently and how you approached it.";

pub const FALLBACK_FEEDBACK: &str =
    "Your answer was recorded. Keep practicing to add more specific detail and structure.";

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("static regex"));

static LIST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*(?:\d+[.)]\s*|[-*]\s*|"|')+"#).expect("static regex"));

/// The model frequently wraps its JSON in a markdown code fence; unwrap it
/// before attempting a structured parse.
fn strip_code_fence(content: &str) -> &str {
    match CODE_FENCE.captures(content) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(content),
        None => content.trim(),
    }
}

fn canned_question_sets() -> [[&'static str; QUESTIONS_PER_SESSION]; 3] {
    [
        [
            "Walk me through a project you are most proud of and your specific contribution.",
            "How do you approach debugging a problem you have never seen before?",
            "Describe a time you disagreed with a teammate. How was it resolved?",
            "What trade-offs do you consider when designing a new feature?",
            "Where do you want to grow most in the next year, and why?",
        ],
        [
            "Tell me about a time you had to deliver under a tight deadline.",
            "How do you decide when code is good enough to ship?",
            "Describe a piece of feedback that changed how you work.",
            "How do you keep your skills current in a fast-moving field?",
            "What would your previous team say is your biggest strength?",
        ],
        [
            "Describe the most complex system you have worked on. What made it complex?",
            "How do you prioritize when everything feels urgent?",
            "Tell me about a mistake you made at work and what you learned from it.",
            "How do you explain technical decisions to non-technical stakeholders?",
            "Why are you interested in this role?",
        ],
    ]
}

/// Deterministic substitute question set, selected by the variety seed.
pub fn canned_questions(seed: u32) -> Vec<String> {
    let sets = canned_question_sets();
    sets[(seed % sets.len() as u32) as usize]
        .iter()
        .map(|q| q.to_string())
        .collect()
}

/// Force a question list to exactly `QUESTIONS_PER_SESSION` non-empty
/// entries: drop blanks, truncate overlong lists, pad short ones.
fn normalize_questions(mut questions: Vec<String>) -> Vec<String> {
    questions.retain(|q| !q.trim().is_empty());
    questions.truncate(QUESTIONS_PER_SESSION);
    while questions.len() < QUESTIONS_PER_SESSION {
        questions.push(FILLER_QUESTION.to_string());
    }
    questions
}

/// Parse the oracle's question reply. Tries a JSON string array first, then
/// a line-split of the raw text, then the canned set for this seed. Always
/// returns exactly five non-empty questions.
pub fn questions_from_reply(content: &str, seed: u32) -> Vec<String> {
    let payload = strip_code_fence(content);

    if let Ok(parsed) = serde_json::from_str::<Vec<String>>(payload) {
        if !parsed.is_empty() {
            return normalize_questions(parsed);
        }
    }

    let lines: Vec<String> = payload
        .lines()
        .map(|line| {
            LIST_PREFIX
                .replace(line, "")
                .trim_end_matches(['"', '\''])
                .trim()
                .to_string()
        })
        .filter(|line| line.len() > 10)
        .collect();

    if !lines.is_empty() {
        return normalize_questions(lines);
    }

    normalize_questions(canned_questions(seed))
}

fn default_relevance() -> f64 {
    70.0
}
fn default_clarity() -> f64 {
    70.0
}
fn default_grammar() -> f64 {
    75.0
}
fn default_confidence() -> f64 {
    65.0
}
fn default_feedback() -> String {
    FALLBACK_FEEDBACK.to_string()
}

/// Wire shape of one evaluation entry. Missing fields degrade to the fixed
/// fallback scores instead of failing the whole batch.
#[derive(Deserialize)]
struct RawEvaluation {
    #[serde(default = "default_relevance")]
    relevance: f64,
    #[serde(default = "default_clarity")]
    clarity: f64,
    #[serde(default = "default_grammar")]
    grammar: f64,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default = "default_feedback")]
    feedback: String,
}

impl From<RawEvaluation> for Evaluation {
    fn from(raw: RawEvaluation) -> Self {
        Evaluation {
            relevance: clamp_score(raw.relevance),
            clarity: clamp_score(raw.clarity),
            grammar: clamp_score(raw.grammar),
            confidence: clamp_score(raw.confidence),
            feedback: if raw.feedback.trim().is_empty() {
                default_feedback()
            } else {
                raw.feedback
            },
        }
    }
}

/// Parse the oracle's evaluation reply into exactly `expected` entries, in
/// input order. Unparseable or short replies are padded with the fallback
/// evaluation so the caller never sees a length mismatch.
pub fn evaluations_from_reply(content: &str, expected: usize) -> Vec<Evaluation> {
    let payload = strip_code_fence(content);

    let mut evaluations: Vec<Evaluation> = serde_json::from_str::<Vec<RawEvaluation>>(payload)
        .map(|raw| raw.into_iter().map(Evaluation::from).collect())
        .unwrap_or_default();

    evaluations.truncate(expected);
    while evaluations.len() < expected {
        evaluations.push(Evaluation::fallback());
    }
    evaluations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_array() {
        let reply = r#"["Q one is long enough?", "Q two is long enough?", "Q three is long enough?", "Q four is long enough?", "Q five is long enough?"]"#;
        let questions = questions_from_reply(reply, 0);
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0], "Q one is long enough?");
    }

    #[test]
    fn parses_fenced_json_array() {
        let reply = "```json\n[\"What is ownership in Rust?\", \"Explain borrowing rules.\"]\n```";
        let questions = questions_from_reply(reply, 0);
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0], "What is ownership in Rust?");
        // padded with the filler to reach five
        assert_eq!(questions[4], FILLER_QUESTION);
    }

    #[test]
    fn truncates_overlong_list() {
        let reply = serde_json::to_string(&vec!["A question that is long enough?"; 7]).unwrap();
        assert_eq!(questions_from_reply(&reply, 0).len(), 5);
    }

    #[test]
    fn line_split_fallback_strips_numbering() {
        let reply = "1. What drew you to this role today?\n2) Describe a recent technical win.\n- How do you handle conflict at work?";
        let questions = questions_from_reply(reply, 0);
        assert_eq!(questions[0], "What drew you to this role today?");
        assert_eq!(questions[1], "Describe a recent technical win.");
        assert_eq!(questions[2], "How do you handle conflict at work?");
        assert_eq!(questions.len(), 5);
    }

    #[test]
    fn garbage_falls_back_to_canned_set_by_seed() {
        for seed in [0u32, 1, 2, 3, 17] {
            let questions = questions_from_reply("!!", seed);
            assert_eq!(questions, canned_questions(seed));
            assert_eq!(questions.len(), 5);
        }
        // deterministic: same seed, same set
        assert_eq!(questions_from_reply("", 7), questions_from_reply("%", 7));
    }

    #[test]
    fn empty_json_array_still_yields_five() {
        let questions = questions_from_reply("[]", 1);
        assert_eq!(questions.len(), 5);
        assert!(questions.iter().all(|q| !q.trim().is_empty()));
    }

    #[test]
    fn evaluations_match_input_length() {
        let reply = r#"[{"relevance": 80, "clarity": 85, "grammar": 90, "confidence": 75, "feedback": "Good"}]"#;
        let evals = evaluations_from_reply(reply, 3);
        assert_eq!(evals.len(), 3);
        assert_eq!(evals[0].relevance, 80.0);
        assert_eq!(evals[1], Evaluation::fallback());
        assert_eq!(evals[2], Evaluation::fallback());
    }

    #[test]
    fn evaluations_clamp_out_of_range_scores() {
        let reply = r#"[{"relevance": 180, "clarity": -5, "grammar": 90, "confidence": 75, "feedback": "x"}]"#;
        let evals = evaluations_from_reply(reply, 1);
        assert_eq!(evals[0].relevance, 100.0);
        assert_eq!(evals[0].clarity, 0.0);
    }

    #[test]
    fn evaluations_fill_missing_fields() {
        let reply = r#"[{"relevance": 88}]"#;
        let evals = evaluations_from_reply(reply, 1);
        assert_eq!(evals[0].relevance, 88.0);
        assert_eq!(evals[0].clarity, 70.0);
        assert_eq!(evals[0].grammar, 75.0);
        assert_eq!(evals[0].confidence, 65.0);
        assert!(!evals[0].feedback.is_empty());
    }

    #[test]
    fn unparseable_evaluations_use_fallback() {
        let evals = evaluations_from_reply("the model rambled instead", 2);
        assert_eq!(evals, vec![Evaluation::fallback(), Evaluation::fallback()]);
    }

    #[test]
    fn evaluations_truncate_overlong_reply() {
        let reply = r#"[{"relevance": 80}, {"relevance": 81}, {"relevance": 82}]"#;
        assert_eq!(evaluations_from_reply(reply, 2).len(), 2);
    }
}
