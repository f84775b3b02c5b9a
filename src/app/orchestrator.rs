use super::types::{ComponentState, ShutdownReason};
use crate::capture::{CaptureService, CommandCamera};
use crate::config::{HomewatchConfig, SensorBackend};
use crate::controller::SurveillanceController;
use crate::dispatcher::CommandDispatcher;
use crate::error::Result;
use crate::events::EventBus;
use crate::notify::TelegramNotifier;
use crate::sensor::{GpioMotionSensor, KeyboardMotionSensor, MotionSensor};
use crate::telegram::TelegramClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wires the bot, the sensor, the camera and the controller together
pub struct HomewatchOrchestrator {
    pub(super) config: HomewatchConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) client: Arc<TelegramClient>,
    pub(super) controller: Arc<SurveillanceController>,
    pub(super) dispatcher: Option<CommandDispatcher>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) tasks: Vec<(&'static str, JoinHandle<()>)>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl HomewatchOrchestrator {
    /// Build every component from configuration. Nothing touches the network yet.
    ///
    /// `force_keyboard` selects the keyboard sensor whatever the configured backend.
    pub async fn new(config: HomewatchConfig, force_keyboard: bool) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let client = Arc::new(TelegramClient::new(&config.telegram)?);
        let notifier = Arc::new(TelegramNotifier::new(
            Arc::clone(&client),
            config.telegram.operator_id,
        ));

        let sensor: Arc<dyn MotionSensor> =
            if force_keyboard || config.sensor.backend == SensorBackend::Keyboard {
                info!("Using keyboard motion sensor");
                Arc::new(KeyboardMotionSensor::new(Arc::clone(&event_bus)))
            } else {
                info!("Using GPIO motion sensor on pin {}", config.sensor.gpio_pin);
                Arc::new(GpioMotionSensor::new(&config.sensor))
            };

        let camera = Arc::new(CommandCamera::new(&config.capture));
        let capture = Arc::new(CaptureService::new(&config.capture.path, camera));

        let controller = SurveillanceController::new(
            sensor,
            capture,
            notifier.clone(),
            Arc::clone(&event_bus),
            config.system.motion_queue_capacity,
        );

        let dispatcher = CommandDispatcher::new(
            config.telegram.operator_id,
            Arc::clone(&controller),
            notifier,
        );

        Ok(Self {
            config,
            event_bus,
            client,
            controller,
            dispatcher: Some(dispatcher),
            component_states: Arc::new(Mutex::new(HashMap::new())),
            tasks: Vec::new(),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &HomewatchConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn controller(&self) -> Arc<SurveillanceController> {
        Arc::clone(&self.controller)
    }
}
