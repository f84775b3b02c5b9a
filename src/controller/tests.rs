use super::*;
use crate::capture::{CaptureService, MockCamera, ShotOutcome};
use crate::events::{EventBus, MotionEvent};
use crate::notify::{RecordingNotifier, Sent};
use crate::sensor::MockMotionSensor;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    controller: Arc<SurveillanceController>,
    sensor: Arc<MockMotionSensor>,
    camera: Arc<MockCamera>,
    notifier: Arc<RecordingNotifier>,
    dir: TempDir,
}

fn harness_with_script(script: Vec<ShotOutcome>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let sensor = Arc::new(MockMotionSensor::new());
    let camera = Arc::new(MockCamera::with_script(script));
    let notifier = Arc::new(RecordingNotifier::new());
    let capture = Arc::new(CaptureService::new(dir.path(), camera.clone()));

    let controller = SurveillanceController::new(
        sensor.clone(),
        capture,
        notifier.clone(),
        Arc::new(EventBus::new(64)),
        8,
    );

    Harness {
        controller,
        sensor,
        camera,
        notifier,
        dir,
    }
}

fn harness() -> Harness {
    harness_with_script(Vec::new())
}

const WAIT: Duration = Duration::from_secs(3);

#[tokio::test]
async fn test_initial_state_is_disarmed() {
    let h = harness();
    assert_eq!(h.controller.state().await, SurveillanceState::Disarmed);
    assert!(!h.controller.is_listening());
}

#[tokio::test]
async fn test_arm_starts_exactly_one_session() {
    let h = harness();

    h.controller.arm().await.unwrap();
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);
    assert!(h.sensor.wait_for_active(1, WAIT).await);

    h.controller.arm().await.unwrap();
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.sensor.sessions_started(), 1);
    assert_eq!(h.sensor.active_sessions(), 1);
}

#[tokio::test]
async fn test_rearm_restarts_session_that_ended_on_its_own() {
    let h = harness();
    h.sensor.fail_next_session();

    h.controller.arm().await.unwrap();
    let deadline = tokio::time::Instant::now() + WAIT;
    while h.controller.is_listening() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!h.controller.is_listening());
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);

    h.controller.arm().await.unwrap();

    assert!(h.sensor.wait_for_active(1, WAIT).await);
    assert!(h.controller.is_listening());
    assert_eq!(h.sensor.sessions_started(), 2);
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_quick_rearm_keeps_one_session() {
    let h = harness();

    h.controller.arm().await.unwrap();
    assert!(h.sensor.wait_for_active(1, WAIT).await);

    h.controller.disarm().await.unwrap();
    h.controller.arm().await.unwrap();

    assert!(h.sensor.wait_for_active(1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.sensor.active_sessions(), 1);
    assert_eq!(h.sensor.sessions_started(), 2);
    assert_eq!(h.sensor.sessions_stopped(), 1);
}

#[tokio::test]
async fn test_disarm_while_disarmed_is_noop() {
    let h = harness();

    h.controller.disarm().await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.controller.state().await, SurveillanceState::Disarmed);
    assert_eq!(h.sensor.sessions_started(), 0);
    assert_eq!(h.sensor.sessions_stopped(), 0);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_disarm_stops_session() {
    let h = harness();

    h.controller.arm().await.unwrap();
    assert!(h.sensor.wait_for_active(1, WAIT).await);

    h.controller.disarm().await.unwrap();
    assert_eq!(h.controller.state().await, SurveillanceState::Disarmed);
    assert!(h.sensor.wait_for_active(0, WAIT).await);
    assert_eq!(h.sensor.sessions_stopped(), 1);

    // Re-arming opens a fresh session
    h.controller.arm().await.unwrap();
    assert!(h.sensor.wait_for_active(1, WAIT).await);
    assert_eq!(h.sensor.sessions_started(), 2);
}

#[tokio::test]
async fn test_motion_sequence_alert_then_three_spaced_shots() {
    let h = harness();
    h.controller.arm().await.unwrap();

    let report = h.controller.on_motion_detected().await.unwrap();

    assert_eq!(
        report,
        SequenceReport {
            attempted: 3,
            captured: 3,
            failed: 0,
            aborted: false,
        }
    );

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0], Sent::Text(MOTION_ALERT.to_string()));
    assert!(sent[1..].iter().all(|s| matches!(s, Sent::Photo(_))));

    let times = h.camera.shot_times();
    assert_eq!(times.len(), SHOTS_PER_SEQUENCE);
    for pair in times.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= SHOT_INTERVAL);
    }
}

#[tokio::test]
async fn test_recoverable_failure_does_not_stop_sequence() {
    let h = harness_with_script(vec![
        ShotOutcome::Success,
        ShotOutcome::Failure,
        ShotOutcome::Success,
    ]);
    h.controller.arm().await.unwrap();

    let report = h.controller.on_motion_detected().await.unwrap();

    assert_eq!(h.camera.shot_count(), 3);
    assert_eq!(report.captured, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.aborted);
    assert_eq!(h.notifier.photos().len(), 2);
    assert_eq!(h.notifier.texts(), vec![MOTION_ALERT.to_string()]);
}

#[tokio::test]
async fn test_fatal_failure_skips_remaining_shots() {
    let h = harness_with_script(vec![ShotOutcome::Success, ShotOutcome::Fatal]);
    h.controller.arm().await.unwrap();
    assert!(h.sensor.wait_for_active(1, WAIT).await);

    let report = h.controller.on_motion_detected().await.unwrap();

    assert_eq!(h.camera.shot_count(), 2);
    assert!(report.aborted);
    assert_eq!(report.skipped(), 1);
    assert_eq!(h.notifier.photos().len(), 1);

    // Neither state nor session are touched by capture failures
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);
    assert_eq!(h.sensor.active_sessions(), 1);
    assert_eq!(h.sensor.sessions_stopped(), 0);
}

#[tokio::test]
async fn test_motion_while_disarmed_is_ignored() {
    let h = harness();

    assert!(h.controller.on_motion_detected().await.is_none());
    h.controller.on_motion_stopped().await;

    assert_eq!(h.camera.shot_count(), 0);
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_motion_stopped_sends_nothing() {
    let h = harness();
    h.controller.arm().await.unwrap();

    h.controller.on_motion_stopped().await;

    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);
}

#[tokio::test]
async fn test_send_failures_do_not_abort_sequence() {
    let h = harness();
    h.notifier.set_failing(true);
    h.controller.arm().await.unwrap();

    let report = h.controller.on_motion_detected().await.unwrap();

    assert_eq!(report.captured, 3);
    assert_eq!(h.notifier.sent().len(), 4);
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);
}

#[tokio::test]
async fn test_sensor_event_drives_full_sequence() {
    let h = harness();
    h.controller.arm().await.unwrap();
    assert!(h.sensor.wait_for_active(1, WAIT).await);

    assert!(h.sensor.trigger(MotionEvent::started()).await);
    assert!(h.notifier.wait_for(4, WAIT).await);

    assert_eq!(h.notifier.texts(), vec![MOTION_ALERT.to_string()]);
    let photos = h.notifier.photos();
    assert_eq!(photos.len(), 3);

    let names: HashSet<_> = photos
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 3);
    for photo in &photos {
        assert_eq!(photo.parent().unwrap(), h.dir.path());
        assert!(photo.exists());
    }

    assert!(h.sensor.trigger(MotionEvent::stopped()).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.notifier.sent().len(), 4);
}

#[tokio::test]
async fn test_disarm_does_not_interrupt_running_sequence() {
    let h = harness();
    h.controller.arm().await.unwrap();
    assert!(h.sensor.wait_for_active(1, WAIT).await);

    assert!(h.sensor.trigger(MotionEvent::started()).await);
    // Alert and first photo are out, the sequence is sleeping before shot two
    assert!(h.notifier.wait_for(2, WAIT).await);

    h.controller.disarm().await.unwrap();
    assert!(h.notifier.wait_for(4, WAIT).await);

    assert_eq!(h.camera.shot_count(), 3);
    assert_eq!(h.controller.state().await, SurveillanceState::Disarmed);
}

#[tokio::test]
async fn test_snapshot_ignores_state() {
    let h = harness();

    h.controller.snapshot_now();
    assert!(h.notifier.wait_for(1, WAIT).await);
    assert_eq!(h.notifier.photos().len(), 1);
    assert_eq!(h.controller.state().await, SurveillanceState::Disarmed);

    h.controller.arm().await.unwrap();
    h.controller.snapshot_now();
    assert!(h.notifier.wait_for(2, WAIT).await);
    assert_eq!(h.notifier.photos().len(), 2);
    assert_eq!(h.controller.state().await, SurveillanceState::Armed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_arm_calls_start_one_session() {
    let h = harness();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let controller = Arc::clone(&h.controller);
        handles.push(tokio::spawn(async move { controller.arm().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(h.controller.state().await, SurveillanceState::Armed);
    assert!(h.sensor.wait_for_active(1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.sensor.sessions_started(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_arm_disarm_stay_consistent() {
    let h = harness();

    let mut handles = Vec::new();
    for i in 0..20 {
        let controller = Arc::clone(&h.controller);
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                controller.arm().await
            } else {
                controller.disarm().await
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let expected_sessions = if h.controller.state().await.is_armed() { 1 } else { 0 };
    assert!(h.sensor.wait_for_active(expected_sessions, WAIT).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.sensor.active_sessions(), expected_sessions);
}

#[tokio::test]
async fn test_arm_after_shutdown_is_rejected() {
    let h = harness();
    h.controller.arm().await.unwrap();

    h.controller.shutdown().await.unwrap();

    assert_eq!(h.controller.state().await, SurveillanceState::Disarmed);
    assert!(h.controller.arm().await.is_err());
    assert_eq!(h.controller.state().await, SurveillanceState::Disarmed);
}
