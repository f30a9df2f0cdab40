use super::*;
use shared::domain::{AnalysisStatus, RiskLevel, StepId, StepStatus};
use std::time::Duration;

fn fast_options() -> MockEngineOptions {
    MockEngineOptions {
        step_delay: Duration::from_millis(10),
        result_delay: Duration::from_millis(5),
    }
}

#[test]
fn mock_plan_lists_five_steps_in_order() {
    let engine = MockAnalysisEngine::default();
    let plan = engine.step_plan(&FileDescriptor::named("contract.pdf", Some("application/pdf")));

    let ids: Vec<_> = plan.iter().map(|step| step.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(plan[0].title, "Document Processing");
    assert_eq!(plan[4].title, "Generating Recommendations");
}

#[tokio::test(start_paused = true)]
async fn mock_stream_alternates_processing_and_completed() {
    let engine = MockAnalysisEngine::new(fast_options());
    let file = FileDescriptor::named("contract.pdf", Some("application/pdf"));

    let transitions: Vec<StepTransition> = engine
        .run_steps(&file)
        .map(|item| item.expect("mock never fails"))
        .collect()
        .await;

    assert_eq!(transitions.len(), 10);
    for (index, pair) in transitions.chunks(2).enumerate() {
        let expected = StepId::new((index + 1).to_string());
        assert_eq!(pair[0], StepTransition::processing(expected.clone()));
        assert_eq!(pair[1].step_id, expected);
        assert_eq!(pair[1].status, StepStatus::Completed);
    }
}

#[tokio::test(start_paused = true)]
async fn mock_stream_waits_step_delay_before_completion() {
    let engine = MockAnalysisEngine::new(MockEngineOptions {
        step_delay: Duration::from_millis(1500),
        result_delay: Duration::from_millis(1000),
    });
    let file = FileDescriptor::named("contract.pdf", None);
    let mut steps = engine.run_steps(&file);

    let started = tokio::time::Instant::now();
    let first = steps.next().await.expect("item").expect("ok");
    assert_eq!(first.status, StepStatus::Processing);
    assert_eq!(started.elapsed(), Duration::ZERO);

    let second = steps.next().await.expect("item").expect("ok");
    assert_eq!(second.status, StepStatus::Completed);
    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert!(started.elapsed() < Duration::from_millis(1600));
}

#[tokio::test(start_paused = true)]
async fn mock_result_carries_file_name_and_templates() {
    let engine = MockAnalysisEngine::with_rng_seed(fast_options(), 7);
    let file = FileDescriptor::named("lease.docx", None);

    let analysis = engine.produce_result(&file).await.expect("result");

    assert_eq!(analysis.file_name, "lease.docx");
    assert_eq!(analysis.status, AnalysisStatus::Completed);
    assert!(templates::DOCUMENT_TYPES.contains(&analysis.document_type.as_str()));
    assert!(RiskLevel::ALL.contains(&analysis.risk_level));
    assert_eq!(analysis.key_points.len(), 5);
    assert_eq!(analysis.recommendations.len(), 4);
    assert_eq!(analysis.important_clauses.len(), 3);
}

#[test]
fn seeded_engines_pick_the_same_content() {
    let left = MockAnalysisEngine::with_rng_seed(fast_options(), 42);
    let right = MockAnalysisEngine::with_rng_seed(fast_options(), 42);

    for _ in 0..8 {
        let a = left.synthesize("a.pdf");
        let b = right.synthesize("a.pdf");
        assert_eq!(a.document_type, b.document_type);
        assert_eq!(a.risk_level, b.risk_level);
    }
}

#[tokio::test]
async fn missing_engine_fails_every_request() {
    let engine = MissingAnalysisEngine;
    let file = FileDescriptor::named("contract.pdf", None);

    assert!(engine.step_plan(&file).is_empty());
    let first = engine.run_steps(&file).next().await.expect("one item");
    assert!(first.is_err());
    let err = engine.produce_result(&file).await.expect_err("no result");
    assert!(err.to_string().contains("contract.pdf"));
}
