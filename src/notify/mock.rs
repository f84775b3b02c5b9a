use super::Notifier;
use crate::error::{NotifyError, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// An outbound message recorded by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(String),
    Photo(PathBuf),
}

/// Notifier double that records every send attempt
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    changed: Notify,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail after being recorded
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|sent| match sent {
                Sent::Text(text) => Some(text.clone()),
                Sent::Photo(_) => None,
            })
            .collect()
    }

    pub fn photos(&self) -> Vec<PathBuf> {
        self.sent
            .lock()
            .iter()
            .filter_map(|sent| match sent {
                Sent::Photo(path) => Some(path.clone()),
                Sent::Text(_) => None,
            })
            .collect()
    }

    /// Wait until at least `count` sends were attempted. Returns false on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let changed = self.changed.notified();
                if self.sent.lock().len() >= count {
                    return;
                }
                changed.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    fn record(&self, sent: Sent) -> Result<(), NotifyError> {
        self.sent.lock().push(sent);
        self.changed.notify_waiters();

        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport(TransportError::Api {
                code: Some(502),
                description: "Bad Gateway".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.record(Sent::Text(text.to_string()))
    }

    async fn send_photo(&self, path: &Path) -> Result<(), NotifyError> {
        self.record(Sent::Photo(path.to_path_buf()))
    }
}
