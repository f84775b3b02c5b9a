mod client;
mod poller;
mod types;
#[cfg(test)]
pub(crate) mod testing;

pub use client::TelegramClient;
pub use poller::{retry_delay, UpdatePoller};
pub use types::{ApiResponse, Chat, InboundMessage, Message, MessageEntity, Update, User};
