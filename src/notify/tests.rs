use super::*;
use crate::config::TelegramConfig;
use crate::telegram::TelegramClient;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_recording_notifier_records_in_order() {
    let notifier = RecordingNotifier::new();

    notifier.send_text("Motion detected!").await.unwrap();
    notifier
        .send_photo(Path::new("/tmp/2024-01-01_00:00:00.jpg"))
        .await
        .unwrap();

    assert_eq!(
        notifier.sent(),
        vec![
            Sent::Text("Motion detected!".to_string()),
            Sent::Photo("/tmp/2024-01-01_00:00:00.jpg".into()),
        ]
    );
    assert!(notifier.wait_for(2, Duration::from_millis(10)).await);
    assert!(!notifier.wait_for(3, Duration::from_millis(10)).await);
}

#[tokio::test]
async fn test_failing_notifier_still_records_attempt() {
    let notifier = RecordingNotifier::new();
    notifier.set_failing(true);

    assert!(notifier.send_text("hello").await.is_err());
    assert_eq!(notifier.texts(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn test_telegram_notifier_missing_photo() {
    let client = TelegramClient::new(&TelegramConfig {
        token: "123:abc".to_string(),
        operator_id: 42,
        api_url: "http://127.0.0.1:9".to_string(),
        poll_timeout_seconds: 1,
        retry_delay_seconds: 1,
    })
    .unwrap();
    let notifier = TelegramNotifier::new(Arc::new(client), 42);

    let err = notifier
        .send_photo(Path::new("/nonexistent/homewatch/photo.jpg"))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::NotifyError::PhotoRead { .. }));
}
