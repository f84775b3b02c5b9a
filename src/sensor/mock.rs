use super::MotionSensor;
use crate::error::SensorError;
use crate::events::MotionEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sensor double that exposes session bookkeeping and lets tests inject events
#[derive(Default)]
pub struct MockMotionSensor {
    sessions_started: AtomicUsize,
    sessions_stopped: AtomicUsize,
    active_sessions: AtomicUsize,
    fail_next: AtomicBool,
    sender: Mutex<Option<mpsc::Sender<MotionEvent>>>,
}

impl MockMotionSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::SeqCst)
    }

    pub fn sessions_stopped(&self) -> usize {
        self.sessions_stopped.load(Ordering::SeqCst)
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// Make the next session end immediately with an error
    pub fn fail_next_session(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Push an event as if the hardware fired it. Returns false without a live session.
    pub async fn trigger(&self, event: MotionEvent) -> bool {
        let sender = self.sender.lock().clone();
        match sender {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Wait until exactly `count` sessions are active. Returns false on timeout.
    pub async fn wait_for_active(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.active_sessions() == count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.active_sessions() == count
    }
}

#[async_trait]
impl MotionSensor for MockMotionSensor {
    async fn run_session(
        &self,
        events: mpsc::Sender<MotionEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SensorError> {
        self.sessions_started.fetch_add(1, Ordering::SeqCst);

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SensorError::InvalidValue {
                value: "mock failure".to_string(),
            });
        }

        self.active_sessions.fetch_add(1, Ordering::SeqCst);
        *self.sender.lock() = Some(events);
        debug!("Mock sensor session started");

        cancel.cancelled().await;

        *self.sender.lock() = None;
        self.active_sessions.fetch_sub(1, Ordering::SeqCst);
        self.sessions_stopped.fetch_add(1, Ordering::SeqCst);
        debug!("Mock sensor session stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
