use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Raw motion events pushed by a sensor driver during a listening session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    MotionStarted { at: SystemTime },
    MotionStopped { at: SystemTime },
}

impl MotionEvent {
    pub fn started() -> Self {
        MotionEvent::MotionStarted {
            at: SystemTime::now(),
        }
    }

    pub fn stopped() -> Self {
        MotionEvent::MotionStopped {
            at: SystemTime::now(),
        }
    }
}

/// Events that can occur in the surveillance system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SurveillanceEvent {
    /// Surveillance was armed by the operator
    Armed { timestamp: SystemTime },
    /// Surveillance was disarmed by the operator
    Disarmed { timestamp: SystemTime },
    /// Motion started while armed
    MotionDetected { timestamp: SystemTime },
    /// Motion stopped while armed
    MotionStopped { timestamp: SystemTime },
    /// A photo was written to disk
    CaptureCompleted { path: PathBuf },
    /// A single shot failed
    CaptureFailed { error: String, fatal: bool },
    /// System shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl SurveillanceEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SurveillanceEvent::Armed { .. } => "Surveillance armed".to_string(),
            SurveillanceEvent::Disarmed { .. } => "Surveillance disarmed".to_string(),
            SurveillanceEvent::MotionDetected { .. } => "Motion detected".to_string(),
            SurveillanceEvent::MotionStopped { .. } => "Motion stopped".to_string(),
            SurveillanceEvent::CaptureCompleted { path } => {
                format!("Capture completed: {}", path.display())
            }
            SurveillanceEvent::CaptureFailed { error, fatal } => {
                format!(
                    "Capture failed ({}): {}",
                    if *fatal { "fatal" } else { "recoverable" },
                    error
                )
            }
            SurveillanceEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SurveillanceEvent::Armed { .. } => "armed",
            SurveillanceEvent::Disarmed { .. } => "disarmed",
            SurveillanceEvent::MotionDetected { .. } => "motion_detected",
            SurveillanceEvent::MotionStopped { .. } => "motion_stopped",
            SurveillanceEvent::CaptureCompleted { .. } => "capture_completed",
            SurveillanceEvent::CaptureFailed { .. } => "capture_failed",
            SurveillanceEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Event bus has no subscribers")]
    NoSubscribers,

    #[error("Receiver lagged behind by {0} events")]
    Lagged(u64),

    #[error("Event bus closed")]
    ChannelClosed,
}

/// Async event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<SurveillanceEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<SurveillanceEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter applied on receive
    pub fn subscribe_filtered(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.to_string())
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: SurveillanceEvent) -> Result<usize, EventBusError> {
        // Failures are logged with context by whoever publishes them
        match &event {
            SurveillanceEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => debug!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|_| EventBusError::NoSubscribers)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &SurveillanceEvent) -> bool {
        match self {
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<SurveillanceEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<SurveillanceEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<SurveillanceEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::Lagged(n));
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}
