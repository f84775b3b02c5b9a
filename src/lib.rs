pub mod app;
pub mod capture;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod monitor;
pub mod notify;
pub mod sensor;
pub mod telegram;

pub use app::{ComponentState, HomewatchOrchestrator, ShutdownReason};
pub use capture::{CaptureService, CommandCamera, StillCamera};
pub use config::HomewatchConfig;
pub use controller::{SurveillanceController, SurveillanceState};
pub use dispatcher::{Command, CommandDispatcher};
pub use error::{HomewatchError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, MotionEvent, SurveillanceEvent};
pub use monitor::MotionMonitor;
pub use notify::{Notifier, TelegramNotifier};
pub use sensor::{GpioMotionSensor, KeyboardMotionSensor, MotionSensor};
pub use telegram::{InboundMessage, TelegramClient, UpdatePoller};
