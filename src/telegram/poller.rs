use super::client::TelegramClient;
use super::types::InboundMessage;
use crate::config::TelegramConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Backoff before the next poll after `failures` consecutive errors
pub fn retry_delay(base: Duration, failures: u32) -> Duration {
    let delay = base * 2_u32.pow(failures.saturating_sub(1).min(6));
    delay.min(MAX_RETRY_DELAY)
}

/// Long-polls getUpdates and forwards messages to the dispatcher channel
pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    poll_timeout: Duration,
    retry_base: Duration,
}

impl UpdatePoller {
    pub fn new(client: Arc<TelegramClient>, config: &TelegramConfig) -> Self {
        Self {
            client,
            poll_timeout: Duration::from_secs(config.poll_timeout_seconds),
            retry_base: Duration::from_secs(config.retry_delay_seconds.max(1)),
        }
    }

    /// Start polling in the background until cancelled or the receiver goes away
    pub fn spawn(
        self,
        sender: mpsc::Sender<InboundMessage>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Update poller started");
            self.run(sender, cancel).await;
            info!("Update poller stopped");
        })
    }

    async fn run(self, sender: mpsc::Sender<InboundMessage>, cancel: CancellationToken) {
        let mut offset = 0_i64;
        let mut failures = 0_u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = self.client.get_updates(offset, self.poll_timeout) => result,
            };

            match result {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        offset = offset.max(update.update_id + 1);

                        let Some(message) = InboundMessage::from_update(update) else {
                            continue;
                        };

                        debug!(
                            "[{}] {}",
                            message.sender_name.as_deref().unwrap_or("unknown"),
                            message.text
                        );

                        if sender.send(message).await.is_err() {
                            warn!("Dispatcher channel closed, stopping update poller");
                            return;
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    let delay = retry_delay(self.retry_base, failures);
                    error!(
                        "Polling updates failed (attempt {}): {}; retrying in {:?}",
                        failures, e, delay
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}
