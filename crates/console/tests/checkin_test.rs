mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::io::BufReader;
use schooldesk_console::checkin::camera::{Camera, CameraLease, ScanSettings, preferred_device};
use schooldesk_console::checkin::line::LineCamera;
use schooldesk_console::checkin::{CheckInDialog, NO_CAMERA, ScanOutcome, ScanPhase, ScanState};
use schooldesk_console::reconcile::{ReconciliationEngine, SCAN_FAILURE, ScanResult};
use schooldesk_core::errors::DeskError;
use schooldesk_store::mock::MockBackend;
use serde_json::json;

use common::{CountingView, FakeCamera, client};

fn engine(backend: MockBackend) -> ReconciliationEngine {
    ReconciliationEngine::new(client(backend))
}

fn scan_backend(reply: serde_json::Value) -> MockBackend {
    let mut backend = MockBackend::new();
    backend
        .expect_action()
        .withf(|path, body| path == "attendances/scan" && *body == json!({"qrcode": "QR123"}))
        .times(1)
        .returning(move |_, _| Ok(reply.clone()));
    backend
}

#[test_log::test(tokio::test)]
async fn test_no_camera_fails_without_scanning() {
    let mut camera = FakeCamera::default();
    let mut view = CountingView::default();
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    let _close = dialog.open().unwrap();

    let outcome = dialog
        .run(&mut camera, &engine(MockBackend::new()), &mut view)
        .await;

    assert_eq!(
        outcome,
        ScanOutcome::Finished(ScanResult::Failure(NO_CAMERA.to_string()))
    );
    assert_eq!(
        dialog.trail(),
        &[ScanPhase::Idle, ScanPhase::Acquiring, ScanPhase::Result]
    );
    assert!(!dialog.is_open());
    assert_eq!(camera.started, None);
    assert_eq!(view.refreshes, 0);
}

#[test_log::test(tokio::test)]
async fn test_decoded_payload_is_submitted_once() {
    let mut camera = FakeCamera::with_devices(&[("cam-0", "Integrated Camera")])
        .frames(vec![Ok(None), Ok(Some("QR123".to_string()))]);
    let mut view = CountingView::default();
    let engine = engine(scan_backend(json!({"message": "Welcome, Siti"})));
    let mut dialog = CheckInDialog::new(ScanSettings::new(30, 250));
    let _close = dialog.open().unwrap();

    let outcome = dialog.run(&mut camera, &engine, &mut view).await;

    assert_eq!(
        outcome,
        ScanOutcome::Finished(ScanResult::Success("Welcome, Siti".to_string()))
    );
    assert_eq!(
        dialog.trail(),
        &[
            ScanPhase::Idle,
            ScanPhase::Acquiring,
            ScanPhase::Scanning,
            ScanPhase::Decoded,
            ScanPhase::Submitting,
            ScanPhase::Result,
        ]
    );
    assert!(!dialog.is_open());
    assert_eq!(camera.stops, 1);
    assert_eq!(camera.clears, 1);
    assert_eq!(camera.started, None);
    assert_eq!(view.refreshes, 1);
}

#[tokio::test]
async fn test_rear_camera_is_preferred() {
    let mut camera = FakeCamera::with_devices(&[("front", "FaceTime HD Camera"), ("rear", "Back Camera")])
        .frames(vec![Ok(Some("QR123".to_string()))]);
    let mut view = CountingView::default();
    let engine = engine(scan_backend(json!({"message": "ok"})));
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    dialog.open().unwrap();

    dialog.run(&mut camera, &engine, &mut view).await;

    assert_eq!(camera.starts, vec!["rear".to_string()]);
    assert_eq!(camera.settings, Some(ScanSettings::new(10, 250)));
    assert_eq!(
        preferred_device(&camera.devices).map(|d| d.id.as_str()),
        Some("rear")
    );
}

#[tokio::test]
async fn test_closing_while_scanning_releases_camera() {
    let mut camera = FakeCamera::with_devices(&[("cam-0", "USB Camera")]);
    let mut view = CountingView::default();
    let engine = engine(MockBackend::new());
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    let close = dialog.open().unwrap();

    let (outcome, _) = tokio::join!(dialog.run(&mut camera, &engine, &mut view), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        close.close();
    });

    assert_eq!(outcome, ScanOutcome::Cancelled);
    assert_eq!(dialog.state(), &ScanState::Idle);
    assert_eq!(dialog.trail().last(), Some(&ScanPhase::Idle));
    assert!(dialog.trail().contains(&ScanPhase::Scanning));
    assert_eq!(camera.stops, 1);
    assert_eq!(camera.clears, 1);
    assert!(!dialog.is_open());
}

#[tokio::test]
async fn test_closing_before_acquisition_never_fails() {
    let mut camera = FakeCamera::with_devices(&[("cam-0", "USB Camera")]);
    let mut view = CountingView::default();
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    let close = dialog.open().unwrap();
    close.close();

    let outcome = dialog
        .run(&mut camera, &engine(MockBackend::new()), &mut view)
        .await;

    // Stopping a camera that never started errors; release swallows it.
    assert_eq!(outcome, ScanOutcome::Cancelled);
    assert_eq!(camera.stops, 1);
    assert_eq!(camera.clears, 1);
    assert_eq!(dialog.trail(), &[ScanPhase::Idle, ScanPhase::Acquiring, ScanPhase::Idle]);
}

#[test]
fn test_opening_an_open_dialog_is_a_no_op() {
    let mut dialog = CheckInDialog::new(ScanSettings::default());

    assert!(dialog.open().is_some());
    assert!(dialog.open().is_none());
    assert!(dialog.is_open());
    assert!(dialog.session().is_some());
}

#[tokio::test]
async fn test_server_rejection_is_shown_verbatim() {
    let mut backend = MockBackend::new();
    backend.expect_action().times(1).returning(|_, _| {
        Err(DeskError::Rejected {
            status: 400,
            message: "QR code not recognised".into(),
        })
    });
    let mut camera = FakeCamera::with_devices(&[("cam-0", "USB Camera")])
        .frames(vec![Ok(Some("bogus".to_string()))]);
    let mut view = CountingView::default();
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    dialog.open().unwrap();

    let outcome = dialog.run(&mut camera, &engine(backend), &mut view).await;

    assert_eq!(
        outcome,
        ScanOutcome::Finished(ScanResult::Failure("QR code not recognised".to_string()))
    );
    assert_eq!(view.refreshes, 0);
}

#[tokio::test]
async fn test_expired_session_reason_reaches_result() {
    let mut backend = MockBackend::new();
    backend.expect_action().times(1).returning(|_, _| {
        Err(DeskError::Authentication(
            "Token expired, please sign in again".into(),
        ))
    });
    let mut camera = FakeCamera::with_devices(&[("cam-0", "USB Camera")])
        .frames(vec![Ok(Some("QR123".to_string()))]);
    let mut view = CountingView::default();
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    dialog.open().unwrap();

    let outcome = dialog.run(&mut camera, &engine(backend), &mut view).await;

    assert_eq!(
        outcome,
        ScanOutcome::Finished(ScanResult::Failure(
            "Token expired, please sign in again".to_string()
        ))
    );
    assert_eq!(view.refreshes, 0);
}

#[tokio::test]
async fn test_failure_without_reason_uses_generic_message() {
    let mut backend = MockBackend::new();
    backend
        .expect_action()
        .times(1)
        .returning(|_, _| Err(DeskError::Transport("timed out".into())));
    let mut camera = FakeCamera::with_devices(&[("cam-0", "USB Camera")])
        .frames(vec![Ok(Some("QR123".to_string()))]);
    let mut view = CountingView::default();
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    dialog.open().unwrap();

    let outcome = dialog.run(&mut camera, &engine(backend), &mut view).await;

    assert_eq!(
        outcome,
        ScanOutcome::Finished(ScanResult::Failure(SCAN_FAILURE.to_string()))
    );
}

#[tokio::test]
async fn test_lost_stream_ends_session() {
    let mut camera = FakeCamera::with_devices(&[("cam-0", "USB Camera")])
        .frames(vec![Err(DeskError::Hardware("camera unplugged".into()))]);
    let mut view = CountingView::default();
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    dialog.open().unwrap();

    let outcome = dialog
        .run(&mut camera, &engine(MockBackend::new()), &mut view)
        .await;

    match outcome {
        ScanOutcome::Finished(ScanResult::Failure(message)) => {
            assert!(message.contains("camera unplugged"))
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(camera.stops, 1);
    assert!(!dialog.is_open());
}

#[tokio::test]
async fn test_dismiss_returns_to_idle_and_allows_reopen() {
    let mut camera = FakeCamera::default();
    let mut view = CountingView::default();
    let mut dialog = CheckInDialog::new(ScanSettings::default());
    dialog.open().unwrap();
    dialog
        .run(&mut camera, &engine(MockBackend::new()), &mut view)
        .await;
    assert!(dialog.open().is_none());

    dialog.dismiss();

    assert_eq!(dialog.state(), &ScanState::Idle);
    assert!(dialog.open().is_some());
}

#[tokio::test]
async fn test_dropped_lease_clears_camera() {
    let mut camera = FakeCamera::with_devices(&[("cam-0", "USB Camera")]);
    let device = camera.devices[0].clone();

    let lease = CameraLease::acquire(&mut camera, &device, ScanSettings::default())
        .await
        .unwrap();
    drop(lease);

    assert_eq!(camera.clears, 1);
    assert_eq!(camera.stops, 0);
}

#[tokio::test]
async fn test_line_camera_reads_one_code_per_line() {
    let input = tokio_test::io::Builder::new()
        .read(b"\n")
        .read(b"  QR9 \n")
        .build();
    let mut camera = LineCamera::new(BufReader::new(input));
    let device = camera.devices().await.unwrap().remove(0);
    camera.start(&device, ScanSettings::default()).await.unwrap();

    assert_eq!(camera.next_frame().await.unwrap(), None);
    assert_eq!(camera.next_frame().await.unwrap(), Some("QR9".to_string()));
    assert!(matches!(
        camera.next_frame().await,
        Err(DeskError::Hardware(_))
    ));
}

#[test]
fn test_scan_rate_is_clamped() {
    assert_eq!(ScanSettings::new(2, 250).fps, 10);
    assert_eq!(ScanSettings::new(60, 250).fps, 30);
    assert_eq!(ScanSettings::new(15, 300), ScanSettings { fps: 15, box_size: 300 });
}
