pub mod sampler;

pub use sampler::*;

use image::RgbaImage;
use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Interval between frame captures while proctoring is running.
pub const SAMPLE_INTERVAL_MS: u64 = 3_000;

/// Minimum gap between two device warnings. Classification runs every 3 s,
/// so consecutive frames of the same object would otherwise flood the user
/// with near-duplicate alerts.
pub const WARNING_DEBOUNCE_MS: u64 = 5_000;

/// Detections at or below this confidence are ignored.
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// One classifier hit on a captured frame.
#[derive(Debug, Clone)]
pub struct Detection {
    pub label: String,
    pub score: f64,
}

/// Append-only log entry for a suspicious object seen on camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedDevice {
    pub class: String,
    pub score: f64,
    pub timestamp_ms: u64,
}

/// Debounced notification raised when suspicious objects are in frame.
#[derive(Debug, Clone)]
pub struct DeviceWarning {
    pub labels: Vec<String>,
    pub timestamp_ms: u64,
}

/// Exclusive handle on the user's camera. Acquisition failures surface as
/// [`crate::error::AppError::CameraAccessDenied`].
pub trait CameraSource: Send {
    fn acquire(&mut self) -> Result<()>;
    fn capture_frame(&mut self) -> Result<RgbaImage>;
    fn release(&mut self);
}

/// In-browser this is the object-detection model; here it is any inference
/// backend that maps a frame to labeled detections.
pub trait ObjectClassifier: Send {
    fn classify(&self, frame: &RgbaImage) -> Result<Vec<Detection>>;
}

/// Deferred model construction, so a failed download/load can be observed
/// at `start()` without blocking the interview.
pub trait ClassifierLoader: Send {
    fn load(&self) -> Result<Box<dyn ObjectClassifier>>;
}
