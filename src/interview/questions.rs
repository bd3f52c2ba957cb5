use serde::{Serialize, Deserialize};

/// Number of questions generated for every interview session.
pub const QUESTIONS_PER_SESSION: usize = 5;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Question {
    pub text: String,
    /// Written exactly once, when the user advances past this question.
    pub answer: Option<String>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            answer: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// One question/answer pair of the finished transcript, handed to the
/// oracle for evaluation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}
