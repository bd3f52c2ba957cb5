use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::Result;
use super::{
    CameraSource, ClassifierLoader, DetectedDevice, DeviceWarning, ObjectClassifier,
    CONFIDENCE_THRESHOLD, SAMPLE_INTERVAL_MS, WARNING_DEBOUNCE_MS,
};

/// Object classes that count as a proctoring violation when seen on camera.
static SUSPICIOUS_CLASSES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["cell phone", "phone", "book", "laptop", "remote", "tablet", "computer"])
});

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Owns the camera stream and runs the fixed-interval capture-and-classify
/// loop. Warnings leave through an unbounded channel; the session state
/// machine drains it and converts each event into a penalty increment.
pub struct ProctorSampler {
    camera: Box<dyn CameraSource>,
    loader: Box<dyn ClassifierLoader>,
    classifier: Option<Box<dyn ObjectClassifier>>,
    enabled: bool,
    model_ready: bool,
    running: bool,
    last_warning_ms: Option<u64>,
    detections: Vec<DetectedDevice>,
    warnings: UnboundedSender<DeviceWarning>,
}

impl ProctorSampler {
    pub fn new(
        camera: Box<dyn CameraSource>,
        loader: Box<dyn ClassifierLoader>,
    ) -> (Self, UnboundedReceiver<DeviceWarning>) {
        let (tx, rx) = unbounded_channel();
        let sampler = ProctorSampler {
            camera,
            loader,
            classifier: None,
            enabled: false,
            model_ready: false,
            running: false,
            last_warning_ms: None,
            detections: Vec::new(),
            warnings: tx,
        };
        (sampler, rx)
    }

    /// Acquire the camera and load the detection model. Calling while
    /// already enabled is a no-op; the camera is a singleton resource and is
    /// acquired at most once per `start`/`stop` cycle. A model that fails to
    /// load does not block the interview: the sampler marks itself ready and
    /// simply never detects anything.
    pub fn start(&mut self) -> Result<()> {
        if self.enabled {
            debug!("Proctoring already enabled, ignoring start()");
            return Ok(());
        }

        self.camera.acquire()?;
        self.enabled = true;

        match self.loader.load() {
            Ok(model) => {
                self.classifier = Some(model);
                info!("Proctoring model loaded, sampling every {}ms", SAMPLE_INTERVAL_MS);
            }
            Err(e) => {
                warn!("Proctoring model failed to load, continuing without detection: {}", e);
                self.classifier = None;
            }
        }
        self.model_ready = true;
        self.running = true;
        Ok(())
    }

    /// Release the camera and halt the sampling loop. Safe to call when not
    /// running.
    pub fn stop(&mut self) {
        if self.enabled {
            self.camera.release();
            info!("Proctoring stopped, camera released");
        }
        self.enabled = false;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_model_ready(&self) -> bool {
        self.model_ready
    }

    /// Everything suspicious seen so far this session, oldest first.
    pub fn detected_devices(&self) -> &[DetectedDevice] {
        &self.detections
    }

    /// One iteration of the sampling loop: capture, classify, filter to the
    /// suspicious vocabulary, and raise at most one debounced warning. Frame
    /// capture or classification errors are logged and swallowed; the loop
    /// picks up again at the next interval.
    pub fn sample_once(&mut self, now_ms: u64) {
        if !self.running || !self.model_ready {
            return;
        }
        let Some(classifier) = self.classifier.as_ref() else {
            return;
        };

        let frame = match self.camera.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame capture failed, skipping sample: {}", e);
                return;
            }
        };

        let detections = match classifier.classify(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Classification failed, skipping sample: {}", e);
                return;
            }
        };

        let mut labels: Vec<String> = Vec::new();
        for detection in detections {
            let label = detection.label.to_lowercase();
            if detection.score > CONFIDENCE_THRESHOLD && SUSPICIOUS_CLASSES.contains(label.as_str())
            {
                self.detections.push(DetectedDevice {
                    class: label.clone(),
                    score: detection.score,
                    timestamp_ms: now_ms,
                });
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
        }

        if labels.is_empty() {
            return;
        }

        let debounced = self
            .last_warning_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < WARNING_DEBOUNCE_MS);
        if debounced {
            debug!("Suspicious objects {:?} within debounce window, suppressed", labels);
            return;
        }

        info!("Device warning raised: {:?}", labels);
        self.last_warning_ms = Some(now_ms);
        let _ = self.warnings.send(DeviceWarning {
            labels,
            timestamp_ms: now_ms,
        });
    }
}

/// Drive a shared sampler at the fixed 3-second interval until it is
/// stopped. The lock is held only for the duration of one sample.
pub fn spawn_sampling_loop(sampler: Arc<Mutex<ProctorSampler>>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_millis(SAMPLE_INTERVAL_MS));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let mut guard = sampler.lock();
            if !guard.is_running() {
                break;
            }
            guard.sample_once(now_ms());
        }
    })
}
