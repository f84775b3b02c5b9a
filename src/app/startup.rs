use super::{ComponentState, HomewatchOrchestrator};
use crate::error::{HomewatchError, Result};
use crate::telegram::{UpdatePoller, User};
use tokio::sync::mpsc;
use tracing::{error, info};

const INBOUND_QUEUE_CAPACITY: usize = 32;

const COMPONENTS: [&str; 4] = ["telegram", "controller", "poller", "dispatcher"];

impl HomewatchOrchestrator {
    /// Register all components as stopped
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing Homewatch components");

        let mut states = self.component_states.lock().await;
        for component in COMPONENTS {
            states.insert(component.to_string(), ComponentState::Stopped);
        }

        Ok(())
    }

    /// Check the bot credentials against the service.
    ///
    /// Any failure here is a startup error; the process cannot run without the bot.
    pub async fn authenticate(&self) -> Result<User> {
        self.set_component_state("telegram", ComponentState::Starting)
            .await;

        match self.client.get_me().await {
            Ok(user) => {
                self.set_component_state("telegram", ComponentState::Running)
                    .await;
                info!("Bot credentials accepted for account id {}", user.id);
                Ok(user)
            }
            Err(e) => {
                self.set_component_state("telegram", ComponentState::Failed)
                    .await;
                let message = if e.is_unauthorized() {
                    format!("bot token rejected: {}", e)
                } else {
                    format!("could not reach the bot API: {}", e)
                };
                error!("Authentication failed: {}", message);
                Err(HomewatchError::Startup { message })
            }
        }
    }

    /// Authenticate, then start polling for commands
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting Homewatch");

        if self.dispatcher.is_none() {
            return Err(HomewatchError::system("Homewatch already started"));
        }

        self.authenticate().await?;

        // The controller is live from construction, it starts disarmed
        self.set_component_state("controller", ComponentState::Running)
            .await;

        let dispatcher = self
            .dispatcher
            .take()
            .ok_or_else(|| HomewatchError::system("Homewatch already started"))?;

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);

        self.set_component_state("poller", ComponentState::Starting)
            .await;
        let poller = UpdatePoller::new(self.client.clone(), &self.config.telegram);
        let handle = poller.spawn(inbound_tx, self.cancellation_token.child_token());
        self.tasks.push(("poller", handle));
        self.set_component_state("poller", ComponentState::Running)
            .await;

        self.set_component_state("dispatcher", ComponentState::Starting)
            .await;
        let cancel = self.cancellation_token.child_token();
        let handle = tokio::spawn(async move {
            dispatcher.run(inbound_rx, cancel).await;
        });
        self.tasks.push(("dispatcher", handle));
        self.set_component_state("dispatcher", ComponentState::Running)
            .await;

        info!(
            "Homewatch started, waiting for commands from operator {}",
            self.config.telegram.operator_id
        );
        Ok(())
    }
}
