use super::MotionSensor;
use crate::config::SensorConfig;
use crate::error::SensorError;
use crate::events::MotionEvent;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MAX_CONSECUTIVE_ERRORS: u32 = 5;
const EXPORT_SETTLE_ATTEMPTS: u32 = 20;

/// PIR sensor read through the sysfs GPIO interface.
///
/// The sensor output is high while motion is present; rising edges produce
/// `MotionStarted` and falling edges `MotionStopped`.
pub struct GpioMotionSensor {
    pin: String,
    root: PathBuf,
    poll_interval: Duration,
    name: String,
}

impl GpioMotionSensor {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            pin: config.gpio_pin.trim().to_string(),
            root: PathBuf::from(&config.gpio_root),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            name: format!("gpio{}", config.gpio_pin.trim()),
        }
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }

    fn value_path(&self) -> PathBuf {
        self.pin_dir().join("value")
    }

    /// Export the pin and configure it as an input if it is not yet available
    async fn prepare(&self) -> Result<(), SensorError> {
        if tokio::fs::metadata(self.value_path()).await.is_ok() {
            return Ok(());
        }

        info!("Exporting GPIO pin {}", self.pin);
        tokio::fs::write(self.root.join("export"), &self.pin)
            .await
            .map_err(|e| SensorError::GpioExport {
                pin: self.pin.clone(),
                details: e.to_string(),
            })?;

        // udev may need a moment to create the pin directory
        for _ in 0..EXPORT_SETTLE_ATTEMPTS {
            if tokio::fs::metadata(self.value_path()).await.is_ok() {
                break;
            }
            sleep(Duration::from_millis(50)).await;
        }

        if let Err(e) = tokio::fs::write(self.pin_dir().join("direction"), "in").await {
            warn!("Could not set GPIO {} direction: {}", self.pin, e);
        }

        Ok(())
    }

    async fn read_level(&self) -> Result<bool, SensorError> {
        let path = self.value_path();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SensorError::GpioRead {
                path: path.display().to_string(),
                source,
            })?;

        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(SensorError::InvalidValue {
                value: other.to_string(),
            }),
        }
    }
}

#[async_trait]
impl MotionSensor for GpioMotionSensor {
    async fn run_session(
        &self,
        events: mpsc::Sender<MotionEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SensorError> {
        self.prepare().await?;
        info!("Watching {} every {:?}", self.value_path().display(), self.poll_interval);

        let mut motion = false;
        let mut consecutive_errors = 0;

        loop {
            match self.read_level().await {
                Ok(level) => {
                    consecutive_errors = 0;

                    if level != motion {
                        motion = level;
                        let event = if level {
                            MotionEvent::started()
                        } else {
                            MotionEvent::stopped()
                        };
                        debug!("GPIO {} edge: {:?}", self.pin, event);

                        if events.send(event).await.is_err() {
                            debug!("Motion event receiver closed, ending GPIO session");
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(e);
                    }
                    warn!(
                        "Error reading GPIO {} (attempt {}): {}",
                        self.pin, consecutive_errors, e
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("GPIO {} session cancelled", self.pin);
                    return Ok(());
                }
                _ = sleep(self.poll_interval) => {}
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
