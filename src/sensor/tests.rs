use super::*;
use crate::config::{SensorBackend, SensorConfig};
use crate::events::MotionEvent;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn gpio_config(root: &Path, pin: &str) -> SensorConfig {
    SensorConfig {
        backend: SensorBackend::Gpio,
        gpio_pin: pin.to_string(),
        gpio_root: root.display().to_string(),
        poll_interval_ms: 10,
    }
}

fn fake_pin(root: &Path, pin: &str, value: &str) -> std::path::PathBuf {
    let dir = root.join(format!("gpio{}", pin));
    std::fs::create_dir_all(&dir).unwrap();
    let value_path = dir.join("value");
    std::fs::write(&value_path, value).unwrap();
    value_path
}

#[tokio::test]
async fn test_gpio_sensor_emits_edges() {
    let root = tempfile::tempdir().unwrap();
    let value_path = fake_pin(root.path(), "17", "0\n");

    let sensor = Arc::new(GpioMotionSensor::new(&gpio_config(root.path(), "17")));
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    let session = {
        let sensor = Arc::clone(&sensor);
        let cancel = cancel.clone();
        tokio::spawn(async move { sensor.run_session(tx, cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    std::fs::write(&value_path, "1\n").unwrap();
    let event = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(event, MotionEvent::MotionStarted { .. }));

    std::fs::write(&value_path, "0\n").unwrap();
    let event = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(event, MotionEvent::MotionStopped { .. }));

    cancel.cancel();
    let result = timeout(Duration::from_secs(1), session).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(sensor.name(), "gpio17");
}

#[tokio::test]
async fn test_gpio_sensor_high_at_start_reports_motion() {
    let root = tempfile::tempdir().unwrap();
    fake_pin(root.path(), "4", "1");

    let sensor = GpioMotionSensor::new(&gpio_config(root.path(), "4"));
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let session = tokio::spawn(async move { sensor.run_session(tx, cancel_clone).await });

    let event = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(event, MotionEvent::MotionStarted { .. }));

    cancel.cancel();
    assert!(session.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_gpio_sensor_invalid_value_ends_session() {
    let root = tempfile::tempdir().unwrap();
    fake_pin(root.path(), "4", "garbage");

    let sensor = GpioMotionSensor::new(&gpio_config(root.path(), "4"));
    let (tx, _rx) = mpsc::channel(8);

    let result = timeout(
        Duration::from_secs(2),
        sensor.run_session(tx, CancellationToken::new()),
    )
    .await
    .unwrap();

    assert!(matches!(
        result,
        Err(crate::error::SensorError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn test_gpio_sensor_exports_missing_pin() {
    let root = tempfile::tempdir().unwrap();

    let sensor = GpioMotionSensor::new(&gpio_config(root.path(), "22"));
    let (tx, _rx) = mpsc::channel(8);

    // No kernel behind the fake tree, so the pin never appears and reads fail
    let result = timeout(
        Duration::from_secs(5),
        sensor.run_session(tx, CancellationToken::new()),
    )
    .await
    .unwrap();

    assert!(result.is_err());
    let exported = std::fs::read_to_string(root.path().join("export")).unwrap();
    assert_eq!(exported, "22");
}

#[tokio::test]
async fn test_mock_sensor_bookkeeping() {
    let sensor = Arc::new(MockMotionSensor::new());
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    assert!(!sensor.trigger(MotionEvent::started()).await);

    let session = {
        let sensor = Arc::clone(&sensor);
        let cancel = cancel.clone();
        tokio::spawn(async move { sensor.run_session(tx, cancel).await })
    };

    assert!(sensor.wait_for_active(1, Duration::from_secs(1)).await);
    assert!(sensor.trigger(MotionEvent::started()).await);
    assert!(matches!(
        rx.recv().await,
        Some(MotionEvent::MotionStarted { .. })
    ));

    cancel.cancel();
    session.await.unwrap().unwrap();
    assert_eq!(sensor.sessions_started(), 1);
    assert_eq!(sensor.sessions_stopped(), 1);
    assert_eq!(sensor.active_sessions(), 0);
}
