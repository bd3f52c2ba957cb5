use serde::{Serialize, Deserialize};

/// Per-answer scores produced by the oracle. Sub-scores are clamped to
/// [0, 100] at the parse boundary, so downstream arithmetic can trust them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub relevance: f64,
    pub clarity: f64,
    pub grammar: f64,
    pub confidence: f64,
    pub feedback: String,
}

impl Evaluation {
    /// Substitute used when the oracle reply is short or unparseable.
    pub fn fallback() -> Self {
        Evaluation {
            relevance: 70.0,
            clarity: 70.0,
            grammar: 75.0,
            confidence: 65.0,
            feedback: "Your answer was recorded. Keep practicing to add more specific detail and structure.".to_string(),
        }
    }

    /// Mean of the four sub-scores.
    pub fn average(&self) -> f64 {
        (self.relevance + self.clarity + self.grammar + self.confidence) / 4.0
    }
}
