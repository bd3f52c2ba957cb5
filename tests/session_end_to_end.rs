//! Wires the proctoring sampler, session state machine, and score
//! aggregation together through the crate's public API, the same way the
//! binary and the hosted front end do.

use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;
use uuid::Uuid;

use mockview::error::{AppError, Result};
use mockview::interview::{AnswerOutcome, Evaluation, InterviewFlow, PenaltyLedger, Phase, QuestionAnswer};
use mockview::oracle::QuestionOracle;
use mockview::proctor::{
    CameraSource, ClassifierLoader, Detection, ObjectClassifier, ProctorSampler,
};
use mockview::storage::{NewAnswer, SessionStore};

struct StubCamera;

impl CameraSource for StubCamera {
    fn acquire(&mut self) -> Result<()> {
        Ok(())
    }
    fn capture_frame(&mut self) -> Result<RgbaImage> {
        Ok(RgbaImage::new(4, 4))
    }
    fn release(&mut self) {}
}

struct PhoneClassifier;

impl ObjectClassifier for PhoneClassifier {
    fn classify(&self, _frame: &RgbaImage) -> Result<Vec<Detection>> {
        Ok(vec![Detection {
            label: "cell phone".to_string(),
            score: 0.92,
        }])
    }
}

struct PhoneLoader;

impl ClassifierLoader for PhoneLoader {
    fn load(&self) -> Result<Box<dyn ObjectClassifier>> {
        Ok(Box::new(PhoneClassifier))
    }
}

struct FixedOracle;

impl QuestionOracle for FixedOracle {
    async fn generate_questions(
        &self,
        role: &str,
        _resume_hint: Option<&str>,
        _exclude: &[String],
    ) -> Result<Vec<String>> {
        Ok((1..=5).map(|i| format!("{} question {}?", role, i)).collect())
    }

    async fn evaluate_answers(
        &self,
        _role: &str,
        transcript: &[QuestionAnswer],
    ) -> Result<Vec<Evaluation>> {
        Ok(transcript
            .iter()
            .map(|_| Evaluation {
                relevance: 80.0,
                clarity: 80.0,
                grammar: 80.0,
                confidence: 80.0,
                feedback: "solid".to_string(),
            })
            .collect())
    }

    async fn generate_coaching(&self, _role: &str, _evaluations: &[Evaluation]) -> Result<String> {
        Ok("practice more".to_string())
    }
}

#[derive(Default)]
struct MemoryStore {
    answers: Mutex<Vec<NewAnswer>>,
    finalized: Mutex<Option<f64>>,
}

impl SessionStore for &MemoryStore {
    async fn create_session(&self, _user_id: Uuid, _role: &str) -> Result<Uuid> {
        Ok(Uuid::new_v4())
    }

    async fn save_answers(&self, _session_id: Uuid, answers: &[NewAnswer]) -> Result<()> {
        *self.answers.lock() = answers.to_vec();
        Ok(())
    }

    async fn finalize_session(
        &self,
        _session_id: Uuid,
        overall_score: f64,
        _ledger: &PenaltyLedger,
    ) -> Result<()> {
        *self.finalized.lock() = Some(overall_score);
        Ok(())
    }

    async fn recent_question_texts(&self, _user_id: Uuid, _limit: i64) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn proctored_session_applies_device_and_tab_penalties() {
    let (sampler, mut warnings) =
        ProctorSampler::new(Box::new(StubCamera), Box::new(PhoneLoader));
    let sampler = Arc::new(Mutex::new(sampler));

    let store = MemoryStore::default();
    let mut flow = InterviewFlow::new(FixedOracle, &store, Uuid::new_v4())
        .with_proctor(sampler.clone());

    flow.begin("software-engineer", Some("5 years of Rust")).await.unwrap();
    assert!(sampler.lock().is_running());

    // Three samples, 3 s apart: the middle one falls inside the debounce
    // window, so exactly two warnings come out.
    sampler.lock().sample_once(0);
    sampler.lock().sample_once(3_000);
    sampler.lock().sample_once(6_000);

    while let Ok(warning) = warnings.try_recv() {
        flow.on_device_warning(&warning.labels);
    }
    assert_eq!(flow.ledger().device_warnings(), 2);

    // plus two tab switches
    flow.on_visibility_hidden();
    flow.on_visibility_hidden();
    assert_eq!(flow.ledger().total_penalty_percent(), 30.0);

    for i in 0..5 {
        let outcome = flow.submit_answer(&format!("detailed answer {}", i)).unwrap();
        if i == 4 {
            assert_eq!(outcome, AnswerOutcome::ReadyToSubmit);
        }
    }

    let summary = flow.submit().await.unwrap();

    // all answers averaged 80, minus 30 penalty
    assert_eq!(summary.overall_score, 50.0);
    assert_eq!(*flow.phase(), Phase::Completed);
    assert!(!sampler.lock().is_running());
    assert_eq!(sampler.lock().detected_devices().len(), 3);

    assert_eq!(store.answers.lock().len(), 5);
    assert_eq!(*store.finalized.lock(), Some(50.0));
}

#[tokio::test]
async fn empty_answer_never_reaches_the_transcript() {
    let store = MemoryStore::default();
    let mut flow = InterviewFlow::new(FixedOracle, &store, Uuid::new_v4());
    flow.begin("analyst", None).await.unwrap();

    assert!(matches!(flow.submit_answer(""), Err(AppError::Validation(_))));
    assert!(matches!(flow.submit_answer("\t  \n"), Err(AppError::Validation(_))));
    assert_eq!(*flow.phase(), Phase::QuestionLoop { index: 0 });
}
