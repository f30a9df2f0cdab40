use super::*;
use analysis_engine::{MockAnalysisEngine, MockEngineOptions};
use std::time::Duration;

fn intake() -> UploadIntake {
    let engine = Arc::new(MockAnalysisEngine::with_rng_seed(
        MockEngineOptions {
            step_delay: Duration::from_millis(100),
            result_delay: Duration::from_millis(100),
        },
        9,
    ));
    UploadIntake::new(ProgressController::new(engine))
}

fn file(name: &str, mime: Option<&str>) -> FileDescriptor {
    FileDescriptor::named(name, mime)
}

#[test]
fn allowlist_covers_document_formats() {
    let cases = [
        ("lease.pdf", Some("application/pdf"), "PDF"),
        ("lease.doc", Some("application/msword"), "DOC"),
        (
            "lease.docx",
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
            "DOCX",
        ),
        ("lease.txt", Some("text/plain"), "TXT"),
    ];
    for (name, mime, label) in cases {
        let accepted = validate(&file(name, mime)).expect(name);
        assert_eq!(accepted.label, label);
    }
}

#[test]
fn extension_match_is_case_insensitive() {
    let accepted = validate(&file("LEASE.PDF", None)).expect("uppercase extension");
    assert_eq!(accepted.label, "PDF");
}

#[test]
fn mime_type_alone_is_enough() {
    let accepted = validate(&file("scan", Some("Application/PDF"))).expect("mime only");
    assert_eq!(accepted.label, "PDF");
}

#[test]
fn executables_are_rejected() {
    let err = validate(&file("bad.exe", Some("application/x-msdownload"))).unwrap_err();
    assert_eq!(
        err,
        IntakeError::UnsupportedFileType {
            name: "bad.exe".into(),
            mime_type: Some("application/x-msdownload".into()),
        }
    );
    assert_eq!(err.report().code, ErrorCode::UnsupportedFileType);
}

#[tokio::test(start_paused = true)]
async fn rejected_file_starts_nothing() {
    let intake = intake();
    let err = intake
        .submit(file("bad.exe", Some("application/x-msdownload")))
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::UnsupportedFileType { .. }));

    let snapshot = intake.controller().snapshot().await;
    assert!(!snapshot.is_analyzing());
    assert!(snapshot.steps.is_empty());
    assert!(intake.is_armed().await);
}

#[tokio::test(start_paused = true)]
async fn accepted_file_starts_a_run() {
    let intake = intake();
    let outcome = intake
        .submit(file("contract.pdf", Some("application/pdf")))
        .await
        .expect("accepted");

    let IntakeOutcome::Started(run) = outcome else {
        panic!("expected a run, got {outcome:?}");
    };
    let snapshot = intake.controller().snapshot().await;
    assert_eq!(snapshot.run_id, run);
    assert!(snapshot.is_analyzing());
    assert!(!intake.is_armed().await);
}

#[tokio::test(start_paused = true)]
async fn submissions_are_ignored_while_analyzing() {
    let intake = intake();
    intake
        .submit(file("contract.pdf", Some("application/pdf")))
        .await
        .expect("first");

    let second = intake
        .submit(file("other.pdf", Some("application/pdf")))
        .await
        .expect("ignored, not an error");
    assert_eq!(second, IntakeOutcome::Ignored);

    // Even an unsupported file is ignored rather than rejected.
    let third = intake.submit(file("bad.exe", None)).await.expect("ignored");
    assert_eq!(third, IntakeOutcome::Ignored);

    let snapshot = intake.controller().snapshot().await;
    assert_eq!(
        snapshot.file.map(|file| file.name),
        Some("contract.pdf".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn intake_rearms_after_the_run_finishes() {
    let intake = intake();
    let mut rx = intake.controller().subscribe_events();
    intake
        .submit(file("contract.pdf", Some("application/pdf")))
        .await
        .expect("first");

    loop {
        let event = rx.recv().await.expect("event");
        if event.is_terminal() {
            break;
        }
    }
    assert!(intake.is_armed().await);

    let outcome = intake
        .submit(file("next.txt", Some("text/plain")))
        .await
        .expect("second");
    assert!(matches!(outcome, IntakeOutcome::Started(_)));
}

#[tokio::test(start_paused = true)]
async fn batch_submission_takes_exactly_one_file() {
    let intake = intake();

    assert_eq!(
        intake.submit_batch(Vec::new()).await,
        Ok(IntakeOutcome::Ignored)
    );

    let err = intake
        .submit_batch(vec![
            file("a.pdf", Some("application/pdf")),
            file("b.pdf", Some("application/pdf")),
        ])
        .await
        .unwrap_err();
    assert_eq!(err, IntakeError::TooManyFiles { count: 2 });
    assert_eq!(err.report().code, ErrorCode::TooManyFiles);
    assert!(intake.is_armed().await);

    let outcome = intake
        .submit_batch(vec![file("a.pdf", Some("application/pdf"))])
        .await
        .expect("single file");
    assert!(matches!(outcome, IntakeOutcome::Started(_)));
}
