mod gpio;
mod keyboard;
mod mock;
#[cfg(test)]
mod tests;

pub use gpio::GpioMotionSensor;
pub use keyboard::KeyboardMotionSensor;
pub use mock::MockMotionSensor;

use crate::error::SensorError;
use crate::events::MotionEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Driver for a physical or simulated motion sensor
#[async_trait]
pub trait MotionSensor: Send + Sync {
    /// Watch the sensor and push motion events until `cancel` fires.
    ///
    /// Returning `Ok` means the session ended normally (cancelled or the
    /// receiver went away); an error ends the session early.
    async fn run_session(
        &self,
        events: mpsc::Sender<MotionEvent>,
        cancel: CancellationToken,
    ) -> Result<(), SensorError>;

    /// Name used in logs
    fn name(&self) -> &str;
}
