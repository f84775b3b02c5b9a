//! The surveillance state machine.
//!
//! [`SurveillanceController`] owns the armed/disarmed state, starts and stops
//! the sensor's listening session and runs the capture sequence when motion
//! starts. Motion events arrive on a queue consumed by a single task, so one
//! sequence finishes before the next event is looked at.

mod sequence;
mod state;
#[cfg(test)]
mod tests;

pub use sequence::{SequenceReport, MOTION_ALERT, SHOTS_PER_SEQUENCE, SHOT_INTERVAL};
pub use state::SurveillanceState;

use crate::capture::CaptureService;
use crate::error::{CaptureError, HomewatchError, Result};
use crate::events::{EventBus, MotionEvent, SurveillanceEvent};
use crate::monitor::MotionMonitor;
use crate::notify::Notifier;
use crate::sensor::MotionSensor;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::SystemTime;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct SurveillanceController {
    state: Mutex<SurveillanceState>,
    monitor: MotionMonitor,
    capture: Arc<CaptureService>,
    notifier: Arc<dyn Notifier>,
    event_bus: Arc<EventBus>,
    shutdown: CancellationToken,
}

impl SurveillanceController {
    /// Build the controller and spawn its motion event task.
    ///
    /// Starts disarmed. Must be called from within a tokio runtime.
    pub fn new(
        sensor: Arc<dyn MotionSensor>,
        capture: Arc<CaptureService>,
        notifier: Arc<dyn Notifier>,
        event_bus: Arc<EventBus>,
        motion_queue_capacity: usize,
    ) -> Arc<Self> {
        let (motion_tx, motion_rx) = mpsc::channel(motion_queue_capacity.max(1));

        let controller = Arc::new(Self {
            state: Mutex::new(SurveillanceState::Disarmed),
            monitor: MotionMonitor::new(sensor, motion_tx),
            capture,
            notifier,
            event_bus,
            shutdown: CancellationToken::new(),
        });

        Self::spawn_motion_task(
            Arc::downgrade(&controller),
            motion_rx,
            controller.shutdown.clone(),
        );

        controller
    }

    fn spawn_motion_task(
        controller: Weak<Self>,
        mut motion_rx: mpsc::Receiver<MotionEvent>,
        shutdown: CancellationToken,
    ) {
        tokio::spawn(async move {
            debug!("Motion event task started");
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = motion_rx.recv() => event,
                };

                let Some(event) = event else { break };
                let Some(controller) = controller.upgrade() else { break };

                match event {
                    MotionEvent::MotionStarted { .. } => {
                        controller.on_motion_detected().await;
                    }
                    MotionEvent::MotionStopped { .. } => {
                        controller.on_motion_stopped().await;
                    }
                }
            }
            debug!("Motion event task stopped");
        });
    }

    pub async fn state(&self) -> SurveillanceState {
        *self.state.lock().await
    }

    pub fn is_listening(&self) -> bool {
        self.monitor.is_listening()
    }

    /// Arm surveillance. The sensor session starts in the background; returning
    /// Ok means the request was accepted, not that the sensor is live.
    pub async fn arm(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(HomewatchError::system("Surveillance controller is shut down"));
        }

        let mut state = self.state.lock().await;
        if state.is_armed() {
            // Revives a session that ended on its own; no-op for a live one
            debug!("Arm requested while already armed");
            self.monitor.start_listening();
            return Ok(());
        }

        self.monitor.start_listening();
        *state = SurveillanceState::Armed;
        info!("Surveillance armed");

        let _ = self.event_bus.publish(SurveillanceEvent::Armed {
            timestamp: SystemTime::now(),
        });
        Ok(())
    }

    /// Disarm surveillance. A capture sequence already running is not interrupted.
    pub async fn disarm(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.is_armed() {
            debug!("Disarm requested while already disarmed");
            return Ok(());
        }

        self.monitor.stop_listening();
        *state = SurveillanceState::Disarmed;
        info!("Surveillance disarmed");

        let _ = self.event_bus.publish(SurveillanceEvent::Disarmed {
            timestamp: SystemTime::now(),
        });
        Ok(())
    }

    /// Take and send one photo in the background, whatever the current state
    pub fn snapshot_now(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = controller.capture_and_send().await {
                error!("Snapshot failed: {}", e);
            }
        });
    }

    /// Alert the operator and take the motion capture sequence.
    ///
    /// Returns `None` when the event was ignored because surveillance is disarmed.
    pub async fn on_motion_detected(&self) -> Option<SequenceReport> {
        if !self.state().await.is_armed() {
            debug!("Motion detected while disarmed, ignoring");
            return None;
        }

        let sequence_id = Uuid::new_v4();
        info!("Motion detected, starting capture sequence {}", sequence_id);
        let _ = self.event_bus.publish(SurveillanceEvent::MotionDetected {
            timestamp: SystemTime::now(),
        });

        self.notify_text(MOTION_ALERT).await;

        let mut report = SequenceReport::default();
        for shot in 1..=SHOTS_PER_SEQUENCE {
            if shot > 1 {
                tokio::time::sleep(SHOT_INTERVAL).await;
            }

            report.attempted += 1;
            match self.capture_and_send().await {
                Ok(_) => report.captured += 1,
                Err(e) if e.is_fatal() => {
                    report.failed += 1;
                    report.aborted = true;
                    error!(
                        "Sequence {} shot {}/{} hit a fatal camera error, skipping the rest: {}",
                        sequence_id, shot, SHOTS_PER_SEQUENCE, e
                    );
                    break;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        "Sequence {} shot {}/{} failed: {}",
                        sequence_id, shot, SHOTS_PER_SEQUENCE, e
                    );
                }
            }
        }

        info!(
            "Capture sequence {} finished: {} captured, {} failed, {} skipped",
            sequence_id,
            report.captured,
            report.failed,
            report.skipped()
        );
        Some(report)
    }

    /// Motion ended. Logged only, the operator is not notified.
    pub async fn on_motion_stopped(&self) {
        if !self.state().await.is_armed() {
            debug!("Motion stopped while disarmed, ignoring");
            return;
        }

        info!("Motion stopped");
        let _ = self.event_bus.publish(SurveillanceEvent::MotionStopped {
            timestamp: SystemTime::now(),
        });
    }

    /// Disarm and stop the motion task
    pub async fn shutdown(&self) -> Result<()> {
        let result = self.disarm().await;
        self.shutdown.cancel();
        result
    }

    /// Capture one photo and send it. Send failures are logged, capture failures returned.
    async fn capture_and_send(&self) -> std::result::Result<PathBuf, CaptureError> {
        let path = match self.capture.capture().await {
            Ok(path) => path,
            Err(e) => {
                let _ = self.event_bus.publish(SurveillanceEvent::CaptureFailed {
                    error: e.to_string(),
                    fatal: e.is_fatal(),
                });
                return Err(e);
            }
        };

        let _ = self
            .event_bus
            .publish(SurveillanceEvent::CaptureCompleted { path: path.clone() });

        if let Err(e) = self.notifier.send_photo(&path).await {
            error!("Failed to send photo {}: {}", path.display(), e);
        }

        Ok(path)
    }

    async fn notify_text(&self, text: &str) {
        if let Err(e) = self.notifier.send_text(text).await {
            error!("Failed to send message '{}': {}", text, e);
        }
    }
}
