use super::{ComponentState, HomewatchOrchestrator};
use crate::error::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl HomewatchOrchestrator {
    /// Disarm, stop background tasks and report the exit code
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");
        let mut exit_code = 0;

        self.set_component_state("controller", ComponentState::Stopping)
            .await;
        match self.controller.shutdown().await {
            Ok(()) => {
                self.set_component_state("controller", ComponentState::Stopped)
                    .await;
            }
            Err(e) => {
                error!("Error stopping controller: {}", e);
                self.set_component_state("controller", ComponentState::Failed)
                    .await;
                exit_code = 1;
            }
        }

        self.cancellation_token.cancel();

        for (component, handle) in std::mem::take(&mut self.tasks) {
            self.set_component_state(component, ComponentState::Stopping)
                .await;

            match timeout(TASK_STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {
                    self.set_component_state(component, ComponentState::Stopped)
                        .await;
                    info!("{} component stopped", component);
                }
                Ok(Err(e)) => {
                    self.set_component_state(component, ComponentState::Failed)
                        .await;
                    error!("{} task ended abnormally: {}", component, e);
                    exit_code = 1;
                }
                Err(_) => {
                    self.set_component_state(component, ComponentState::Failed)
                        .await;
                    warn!("{} component stop timeout", component);
                    exit_code = 1;
                }
            }
        }

        self.set_component_state("telegram", ComponentState::Stopped)
            .await;

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }
}
