use super::camera::StillCamera;
use crate::error::CaptureError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Instant;

/// Scripted result for one call to the mock camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Success,
    Failure,
    Fatal,
}

/// Camera double that returns scripted outcomes and records when each shot started
pub struct MockCamera {
    script: Mutex<VecDeque<ShotOutcome>>,
    shots: Mutex<Vec<Instant>>,
}

impl MockCamera {
    /// Camera that always succeeds
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    /// Camera returning `script` in order, then succeeding
    pub fn with_script(script: Vec<ShotOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            shots: Mutex::new(Vec::new()),
        }
    }

    pub fn shot_count(&self) -> usize {
        self.shots.lock().len()
    }

    /// Start instants of every shot taken so far
    pub fn shot_times(&self) -> Vec<Instant> {
        self.shots.lock().clone()
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StillCamera for MockCamera {
    async fn capture_jpeg(&self) -> Result<Vec<u8>, CaptureError> {
        let index = {
            let mut shots = self.shots.lock();
            shots.push(Instant::now());
            shots.len()
        };

        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(ShotOutcome::Success);

        match outcome {
            // SOI marker, a shot counter and EOI marker
            ShotOutcome::Success => Ok(vec![0xFF, 0xD8, index as u8, 0xFF, 0xD9]),
            ShotOutcome::Failure => Err(CaptureError::Mechanism {
                details: format!("mock shot {} failed", index),
            }),
            ShotOutcome::Fatal => Err(CaptureError::CameraUnavailable {
                details: "mock camera disconnected".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
