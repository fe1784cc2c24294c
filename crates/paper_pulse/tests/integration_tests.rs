mod mocks;

use std::{path::Path, time::Duration};

use episode_feed::FeedDocument;
use mocks::{
    feed_store::MockFeedStore, generator::MockSummaryGenerator, media_host::MockMediaHost,
    merger::MockAudioMerger, scratch_dir,
};
use paper_pulse::{
    FailurePolicy, PipelineError, PodcastPipeline, PodcastPipelineBuilder, Stage,
};

type MockPipeline = PodcastPipeline<MockSummaryGenerator, MockAudioMerger, MockMediaHost, MockFeedStore>;

const EMAIL: &str = "Today's picks:\n\
    https://arxiv.org/abs/2301.00001 and https://arxiv.org/pdf/2302.00002v2\n\
    (again: https://arxiv.org/abs/2301.00001)";

const LINK_A: &str = "https://arxiv.org/abs/2301.00001";
const LINK_B: &str = "https://arxiv.org/pdf/2302.00002v2";

fn build_pipeline(
    workdir: &Path,
    generator: MockSummaryGenerator,
    merger: MockAudioMerger,
    host: MockMediaHost,
    store: MockFeedStore,
    policy: FailurePolicy,
) -> MockPipeline {
    PodcastPipelineBuilder::new(workdir)
        .generator(generator)
        .merger(merger)
        .media_host(host)
        .feed_store(store)
        .failure_policy(policy)
        .build()
}

fn run_dirs_left(workdir: &Path) -> usize {
    std::fs::read_dir(workdir).unwrap().count()
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_email_becomes_published_episode() {
    let workdir = scratch_dir("pipeline");
    let generator = MockSummaryGenerator::default();
    let merger = MockAudioMerger::default();
    let host = MockMediaHost::default();
    let store = MockFeedStore::default();

    let generator_calls = generator.calls.clone();
    let merger_calls = merger.calls.clone();
    let uploads = host.uploads.clone();

    let pipeline = build_pipeline(
        &workdir,
        generator,
        merger,
        host,
        store.clone(),
        FailurePolicy::default(),
    );

    let report = pipeline.run(EMAIL).await.expect("pipeline should succeed");

    // duplicates collapse, first-seen order kept
    let links = report
        .paper_links
        .iter()
        .map(|link| link.as_str())
        .collect::<Vec<_>>();
    assert_eq!(links, vec![LINK_A, LINK_B]);
    assert_eq!(*generator_calls.lock().unwrap(), vec![vec![LINK_A.to_string(), LINK_B.to_string()]]);

    assert_eq!(report.audio_files, vec!["summary_0.mp3", "summary_1.mp3"]);
    assert_eq!(
        *merger_calls.lock().unwrap(),
        vec![vec!["summary_0.mp3".to_string(), "summary_1.mp3".to_string()]]
    );
    assert!(report.failed_links.is_empty());

    let uploads = uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(
        uploads[0].bytes,
        format!("audio for {LINK_A}audio for {LINK_B}").into_bytes()
    );
    assert!(uploads[0].title.starts_with("AI Papers Summary - "));
    assert_eq!(uploads[0].description, "Summary of 2 AI research papers from arXiv");

    let url = report.episode_url.clone().expect("episode url");
    assert!(url.starts_with("https://media.example.com/episodes/episode-"));
    let feed = FeedDocument::parse(&store.xml().unwrap()).unwrap();
    assert_eq!(feed.len(), 1);
    assert!(feed.contains_guid(&url));
    assert!(store.xml().unwrap().contains("Summary of 2 AI research papers from arXiv"));

    // per-run directory is gone once the run is over
    assert_eq!(run_dirs_left(&workdir), 0);
}

#[tokio::test]
async fn test_email_without_links_does_nothing() {
    let workdir = scratch_dir("pipeline");
    let generator = MockSummaryGenerator::default();
    let host = MockMediaHost::default();
    let store = MockFeedStore::default();
    let generator_calls = generator.calls.clone();

    let pipeline = build_pipeline(
        &workdir,
        generator,
        MockAudioMerger::default(),
        host.clone(),
        store.clone(),
        FailurePolicy::default(),
    );

    let report = pipeline
        .run("see https://example.com/abs/1234.5678 and arxiv.org/abs/2301.00001")
        .await
        .unwrap();

    assert!(report.paper_links.is_empty());
    assert!(report.episode_url.is_none());
    assert!(generator_calls.lock().unwrap().is_empty());
    assert!(host.uploads.lock().unwrap().is_empty());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_cancelled_run_still_removes_run_directory() {
    let workdir = scratch_dir("pipeline");
    let generator = MockSummaryGenerator::default().with_delay(Duration::from_secs(30));

    let pipeline = build_pipeline(
        &workdir,
        generator,
        MockAudioMerger::default(),
        MockMediaHost::default(),
        MockFeedStore::default(),
        FailurePolicy::default(),
    );

    let outcome = tokio::time::timeout(Duration::from_millis(100), pipeline.run(EMAIL)).await;

    assert!(outcome.is_err(), "run should still be generating");
    assert_eq!(run_dirs_left(&workdir), 0);
}

// ─── Partial failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fail_fast_aborts_on_any_failed_link() {
    let workdir = scratch_dir("pipeline");
    let merger = MockAudioMerger::default();
    let host = MockMediaHost::default();
    let merger_calls = merger.calls.clone();

    let pipeline = build_pipeline(
        &workdir,
        MockSummaryGenerator::failing(LINK_B, Stage::Generate),
        merger,
        host.clone(),
        MockFeedStore::default(),
        FailurePolicy::FailFast,
    );

    let err = pipeline.run(EMAIL).await.unwrap_err();

    match &err {
        PipelineError::Automation(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].stage, Stage::Generate);
            assert_eq!(failures[0].link.as_str(), LINK_B);
        }
        other => panic!("expected automation error, got {other:?}"),
    }
    assert!(err.to_string().contains("generate failed for https://arxiv.org/pdf/2302.00002v2"));
    assert!(merger_calls.lock().unwrap().is_empty());
    assert!(host.uploads.lock().unwrap().is_empty());
    assert_eq!(run_dirs_left(&workdir), 0);
}

#[tokio::test]
async fn test_best_effort_publishes_successful_links_and_reports_failures() {
    let workdir = scratch_dir("pipeline");
    let merger = MockAudioMerger::default();
    let store = MockFeedStore::default();
    let merger_calls = merger.calls.clone();

    let pipeline = build_pipeline(
        &workdir,
        MockSummaryGenerator::failing(LINK_A, Stage::Download),
        merger,
        MockMediaHost::default(),
        store.clone(),
        FailurePolicy::BestEffort,
    );

    let report = pipeline.run(EMAIL).await.unwrap();

    assert_eq!(report.paper_links.len(), 2);
    assert_eq!(report.audio_files, vec!["summary_1.mp3"]);
    assert_eq!(
        *merger_calls.lock().unwrap(),
        vec![vec!["summary_1.mp3".to_string()]]
    );
    assert_eq!(report.failed_links.len(), 1);
    assert_eq!(report.failed_links[0].link.as_str(), LINK_A);
    assert_eq!(report.failed_links[0].stage, Stage::Download);
    assert!(report.episode_url.is_some());
    assert!(store.xml().unwrap().contains("Summary of 1 AI research papers from arXiv"));
}

#[tokio::test]
async fn test_best_effort_fails_when_nothing_succeeded() {
    let workdir = scratch_dir("pipeline");
    let host = MockMediaHost::default();

    let pipeline = build_pipeline(
        &workdir,
        MockSummaryGenerator::failing_all(&[LINK_A, LINK_B], Stage::Authenticate),
        MockAudioMerger::default(),
        host.clone(),
        MockFeedStore::default(),
        FailurePolicy::BestEffort,
    );

    let err = pipeline.run(EMAIL).await.unwrap_err();

    assert!(matches!(err, PipelineError::Automation(ref failures) if failures.len() == 2));
    assert!(host.uploads.lock().unwrap().is_empty());
}

// ─── Error propagation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_merge_failure_stops_before_publishing() {
    let workdir = scratch_dir("pipeline");
    let host = MockMediaHost::default();

    let pipeline = build_pipeline(
        &workdir,
        MockSummaryGenerator::default(),
        MockAudioMerger::failing("corrupt mp3 frame"),
        host.clone(),
        MockFeedStore::default(),
        FailurePolicy::default(),
    );

    let err = pipeline.run(EMAIL).await.unwrap_err();

    assert!(matches!(err, PipelineError::Merge(_)));
    assert!(err.to_string().contains("corrupt mp3 frame"));
    assert!(host.uploads.lock().unwrap().is_empty());
    assert_eq!(run_dirs_left(&workdir), 0);
}

#[tokio::test]
async fn test_upload_failure_propagates_and_feed_is_untouched() {
    let workdir = scratch_dir("pipeline");
    let store = MockFeedStore::default();

    let pipeline = build_pipeline(
        &workdir,
        MockSummaryGenerator::default(),
        MockAudioMerger::default(),
        MockMediaHost::failing("host unavailable"),
        store.clone(),
        FailurePolicy::default(),
    );

    let err = pipeline.run(EMAIL).await.unwrap_err();

    assert!(matches!(err, PipelineError::Publish(_)));
    assert_eq!(store.save_count(), 0);
    assert!(store.xml().is_none());
}

#[tokio::test]
async fn test_feed_failure_propagates() {
    let workdir = scratch_dir("pipeline");

    let pipeline = build_pipeline(
        &workdir,
        MockSummaryGenerator::default(),
        MockAudioMerger::default(),
        MockMediaHost::default(),
        MockFeedStore::failing("permission denied"),
        FailurePolicy::default(),
    );

    let err = pipeline.run(EMAIL).await.unwrap_err();

    assert!(matches!(err, PipelineError::Publish(_)));
    assert!(err.to_string().contains("permission denied"));
}
