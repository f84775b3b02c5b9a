use super::MotionSensor;
use crate::error::SensorError;
use crate::events::{EventBus, MotionEvent, SurveillanceEvent};
use async_trait::async_trait;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Simulated motion sensor driven from the terminal.
///
/// SPACE starts motion, `s` stops it and `q` / ESC requests shutdown.
pub struct KeyboardMotionSensor {
    event_bus: Arc<EventBus>,
}

impl KeyboardMotionSensor {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl MotionSensor for KeyboardMotionSensor {
    async fn run_session(
        &self,
        events: mpsc::Sender<MotionEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SensorError> {
        info!("Keyboard sensor active - SPACE = motion, s = motion stopped, q = quit");

        let event_bus = Arc::clone(&self.event_bus);

        let handle = task::spawn_blocking(move || -> Result<(), SensorError> {
            enable_raw_mode().map_err(|e| SensorError::Terminal {
                details: format!("failed to enable raw mode: {}", e),
            })?;

            let result = loop {
                if cancel.is_cancelled() {
                    debug!("Keyboard sensor stopping");
                    break Ok(());
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let motion = match key_event.code {
                            KeyCode::Char(' ') => Some(MotionEvent::started()),
                            KeyCode::Char('s') => Some(MotionEvent::stopped()),
                            KeyCode::Char('q') | KeyCode::Esc => {
                                let _ = event_bus.publish(SurveillanceEvent::ShutdownRequested {
                                    timestamp: SystemTime::now(),
                                    reason: "User requested via keyboard".to_string(),
                                });
                                break Ok(());
                            }
                            other => {
                                debug!("Key pressed: {:?}", other);
                                None
                            }
                        };

                        if let Some(motion) = motion {
                            debug!("Simulated sensor event: {:?}", motion);
                            if events.blocking_send(motion).is_err() {
                                break Ok(());
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            };

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }

            result
        });

        handle.await.map_err(|e| SensorError::Terminal {
            details: format!("keyboard task failed: {}", e),
        })?
    }

    fn name(&self) -> &str {
        "keyboard"
    }
}
