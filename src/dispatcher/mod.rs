//! Routes operator messages to the surveillance controller.

mod command;

pub use command::Command;

use crate::controller::SurveillanceController;
use crate::notify::Notifier;
use crate::telegram::InboundMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const HELP_TEXT: &str = "Type /activate, /deactivate or /pic.";
pub const ACTIVATED_REPLY: &str = "Surveillance activated.";
pub const DEACTIVATED_REPLY: &str = "Surveillance stopped. Welcome home!";
pub const SNAPSHOT_REPLY: &str = "Taking photo...";

pub struct CommandDispatcher {
    operator_id: i64,
    controller: Arc<SurveillanceController>,
    notifier: Arc<dyn Notifier>,
}

impl CommandDispatcher {
    pub fn new(
        operator_id: i64,
        controller: Arc<SurveillanceController>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            operator_id,
            controller,
            notifier,
        }
    }

    /// Consume inbound messages until the channel closes or `cancel` fires
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundMessage>, cancel: CancellationToken) {
        info!("Command dispatcher started for operator {}", self.operator_id);

        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                message = inbound.recv() => message,
            };

            match message {
                Some(message) => {
                    self.handle_message(message).await;
                }
                None => {
                    debug!("Inbound message channel closed");
                    break;
                }
            }
        }

        info!("Command dispatcher stopped");
    }

    /// Handle one message. Returns the command that was executed, if any.
    pub async fn handle_message(&self, message: InboundMessage) -> Option<Command> {
        let command = self.authorize(&message)?;
        debug!("Executing {} from operator", command);

        match command {
            Command::Help => {
                self.reply(HELP_TEXT).await;
            }
            Command::Activate => match self.controller.arm().await {
                Ok(()) => self.reply(ACTIVATED_REPLY).await,
                Err(e) => error!("Failed to activate surveillance: {}", e),
            },
            Command::Deactivate => match self.controller.disarm().await {
                Ok(()) => self.reply(DEACTIVATED_REPLY).await,
                Err(e) => error!("Failed to deactivate surveillance: {}", e),
            },
            Command::Snapshot => {
                self.reply(SNAPSHOT_REPLY).await;
                self.controller.snapshot_now();
            }
        }

        Some(command)
    }

    /// Silently drop anything that is not a recognized command from the operator
    fn authorize(&self, message: &InboundMessage) -> Option<Command> {
        let Some(sender) = message.sender else {
            debug!("Dropping message without sender");
            return None;
        };

        if sender != self.operator_id {
            debug!("Dropping message from unauthorized sender {}", sender);
            return None;
        }

        if !message.is_command {
            debug!("Dropping non-command message");
            return None;
        }

        let command = Command::parse(&message.text);
        if command.is_none() {
            debug!("Ignoring unrecognized command '{}'", message.text);
        }
        command
    }

    async fn reply(&self, text: &str) {
        if let Err(e) = self.notifier.send_text(text).await {
            error!("Failed to send reply '{}': {}", text, e);
        }
    }
}
