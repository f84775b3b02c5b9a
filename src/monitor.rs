use crate::events::MotionEvent;
use crate::sensor::MotionSensor;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// A running sensor session
struct ListeningSession {
    id: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Bridges a motion sensor to the controller's motion event queue.
///
/// Whether a session should be running is decided by the controller; the
/// monitor only owns the session handles. At most one session runs the
/// sensor at a time: a new session waits for the stopped one to finish
/// tearing down before it touches the sensor.
pub struct MotionMonitor {
    sensor: Arc<dyn MotionSensor>,
    events: mpsc::Sender<MotionEvent>,
    session: Mutex<Option<ListeningSession>>,
    /// Task of the last stopped session, possibly still tearing down
    retiring: Mutex<Option<JoinHandle<()>>>,
    next_session_id: AtomicU64,
}

impl MotionMonitor {
    pub fn new(sensor: Arc<dyn MotionSensor>, events: mpsc::Sender<MotionEvent>) -> Self {
        Self {
            sensor,
            events,
            session: Mutex::new(None),
            retiring: Mutex::new(None),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Start a listening session in the background.
    ///
    /// No-op while a session is live. A session that ended on its own is
    /// replaced.
    pub fn start_listening(&self) {
        let mut session = self.session.lock();

        if let Some(current) = session.as_ref() {
            if !current.task.is_finished() {
                debug!("Listening session {} already active", current.id);
                return;
            }
            debug!("Listening session {} ended, starting a new one", current.id);
        }

        let id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        let previous = self.retiring.lock().take();

        let cancel = CancellationToken::new();
        let sensor = Arc::clone(&self.sensor);
        let events = self.events.clone();
        let session_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            if let Some(previous) = previous {
                debug!("Session {} waiting for the previous session to finish", id);
                if let Err(e) = previous.await {
                    warn!("Previous listening session ended abnormally: {}", e);
                }
            }

            if session_cancel.is_cancelled() {
                debug!("Listening session {} stopped before it started", id);
                return;
            }

            info!("Listening session {} started on sensor {}", id, sensor.name());
            match sensor.run_session(events, session_cancel).await {
                Ok(()) => info!("Listening session {} ended", id),
                Err(e) => error!("Listening session {} failed: {}", id, e),
            }
        });

        *session = Some(ListeningSession { id, cancel, task });
    }

    /// End the current session without waiting for it. Motion handling
    /// already in progress is not interrupted.
    pub fn stop_listening(&self) {
        match self.session.lock().take() {
            Some(session) => {
                info!("Stopping listening session {}", session.id);
                session.cancel.cancel();
                *self.retiring.lock() = Some(session.task);
            }
            None => debug!("No listening session to stop"),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .map(|session| !session.task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for MotionMonitor {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.cancel.cancel();
        }
    }
}
