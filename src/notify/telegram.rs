use super::Notifier;
use crate::error::NotifyError;
use crate::telegram::TelegramClient;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Sends messages to the operator's chat through the Bot API
pub struct TelegramNotifier {
    client: Arc<TelegramClient>,
    operator_chat: i64,
}

impl TelegramNotifier {
    pub fn new(client: Arc<TelegramClient>, operator_chat: i64) -> Self {
        Self {
            client,
            operator_chat,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        self.client
            .send_message(self.operator_chat, text)
            .await
            .map_err(NotifyError::from)
    }

    async fn send_photo(&self, path: &Path) -> Result<(), NotifyError> {
        self.client.send_photo(self.operator_chat, path).await
    }
}
