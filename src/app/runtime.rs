use super::{HomewatchOrchestrator, ShutdownReason};
use crate::error::{HomewatchError, Result};
use crate::events::{EventBusError, EventFilter, SurveillanceEvent};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

type ShutdownSlot = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

impl HomewatchOrchestrator {
    /// Block until a signal or a shutdown request arrives, then shut down.
    ///
    /// Returns the process exit code.
    pub async fn run(&mut self) -> Result<i32> {
        info!("Homewatch is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| HomewatchError::system("Shutdown sender already taken"))?;

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| HomewatchError::system("Shutdown receiver already taken"))?;

        let slot: ShutdownSlot = Arc::new(Mutex::new(Some(shutdown_sender)));
        self.setup_signal_handlers(&slot);
        self.setup_shutdown_listener(&slot);

        let reason = shutdown_receiver
            .await
            .map_err(|_| HomewatchError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {:?}", reason);

        let exit_code = self.shutdown().await?;

        info!("Homewatch shutdown complete");
        Ok(exit_code)
    }

    fn setup_signal_handlers(&self, slot: &ShutdownSlot) {
        let cancel = self.cancellation_token.clone();

        #[cfg(unix)]
        {
            let slot = Arc::clone(slot);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate())
                {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    _ = cancel.cancelled() => {}
                    Some(()) = sigterm.recv() => {
                        info!("Received SIGTERM signal");
                        fire(&slot, ShutdownReason::Signal("SIGTERM".to_string())).await;
                    }
                }
            });
        }

        let slot = Arc::clone(slot);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = signal::ctrl_c() => match result {
                    Ok(()) => {
                        info!("Received SIGINT signal (Ctrl+C)");
                        fire(&slot, ShutdownReason::Signal("SIGINT".to_string())).await;
                    }
                    Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                },
            }
        });
    }

    /// Turn ShutdownRequested events into a shutdown
    fn setup_shutdown_listener(&self, slot: &ShutdownSlot) {
        let mut receiver = self.event_bus.subscribe_filtered(
            EventFilter::EventTypes(vec!["shutdown_requested"]),
            "shutdown_listener",
        );
        let cancel = self.cancellation_token.clone();
        let slot = Arc::clone(slot);

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => return,
                    event = receiver.recv() => event,
                };

                match event {
                    Ok(SurveillanceEvent::ShutdownRequested { reason, .. }) => {
                        fire(&slot, ShutdownReason::UserRequest(reason)).await;
                        return;
                    }
                    Ok(_) => {}
                    Err(EventBusError::Lagged(n)) => {
                        warn!("Shutdown listener missed {} events", n);
                    }
                    Err(_) => return,
                }
            }
        });
    }
}

async fn fire(slot: &ShutdownSlot, reason: ShutdownReason) {
    if let Some(sender) = slot.lock().await.take() {
        let _ = sender.send(reason);
    }
}
