//! Outbound messages to the operator.
//!
//! A [`Notifier`] is bound to one recipient when it is constructed, so no call
//! site can address anybody but the operator.

mod mock;
mod telegram;
#[cfg(test)]
mod tests;

pub use mock::{RecordingNotifier, Sent};
pub use telegram::TelegramNotifier;

use crate::error::NotifyError;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message to the operator
    async fn send_text(&self, text: &str) -> Result<(), NotifyError>;

    /// Upload a photo file to the operator
    async fn send_photo(&self, path: &Path) -> Result<(), NotifyError>;
}
