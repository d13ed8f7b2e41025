//! Playback Orchestration Integration Tests
//!
//! Exercises the selection state machine against counting mock adapters:
//! cache reuse, fetch failure, stale-reference fallback, duplicate-fetch
//! suppression, and the cleanup invariant.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use jukebox::adapters::{AudioFetcher, AudioPublisher, FetchError, PublishError};
use jukebox::cache::FileRefCache;
use jukebox::core::PlaybackOrchestrator;
use jukebox::domain::{FileRef, PlaybackOutcome, PlaybackRequest, PreparedAudio, TrackId};

struct MockFetcher {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
    /// Scratch directories handed out, to assert cleanup
    produced: Mutex<Vec<PathBuf>>,
}

impl MockFetcher {
    fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
            produced: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn no_scratch_left(&self) -> bool {
        self.produced.lock().unwrap().iter().all(|dir| !dir.exists())
    }
}

#[async_trait]
impl AudioFetcher for MockFetcher {
    async fn prepare(&self, track: &TrackId) -> Result<PreparedAudio, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(FetchError::Failed("source unavailable".to_string()));
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("{}.mp3", track.as_str()));
        std::fs::write(&path, b"fake audio").unwrap();
        self.produced.lock().unwrap().push(dir.path().to_path_buf());

        Ok(PreparedAudio::new(
            dir,
            path,
            format!("Title {}", track),
            Some("Artist".to_string()),
            Some(180),
        ))
    }
}

struct MockPublisher {
    file_calls: AtomicUsize,
    ref_calls: AtomicUsize,
    fail_ref_times: AtomicUsize,
    fail_file: AtomicBool,
    counter: AtomicUsize,
}

impl MockPublisher {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            file_calls: AtomicUsize::new(0),
            ref_calls: AtomicUsize::new(0),
            fail_ref_times: AtomicUsize::new(0),
            fail_file: AtomicBool::new(false),
            counter: AtomicUsize::new(0),
        })
    }

    fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }

    fn ref_calls(&self) -> usize {
        self.ref_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioPublisher for MockPublisher {
    async fn publish_file(
        &self,
        _chat_id: i64,
        _audio: &PreparedAudio,
    ) -> Result<FileRef, PublishError> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_file.load(Ordering::SeqCst) {
            return Err(PublishError::Api("upload rejected".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(FileRef::new(format!("ref-{}", n)))
    }

    async fn publish_ref(&self, _chat_id: i64, _file_ref: &FileRef) -> Result<(), PublishError> {
        self.ref_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ref_times.load(Ordering::SeqCst) > 0 {
            self.fail_ref_times.fetch_sub(1, Ordering::SeqCst);
            return Err(PublishError::Api("reference expired".to_string()));
        }
        Ok(())
    }
}

type MockOrchestrator = PlaybackOrchestrator<Arc<MockFetcher>, Arc<MockPublisher>>;

fn orchestrator(
    fetcher: Arc<MockFetcher>,
    publisher: Arc<MockPublisher>,
) -> (MockOrchestrator, Arc<FileRefCache>) {
    let cache = Arc::new(FileRefCache::default());
    (
        PlaybackOrchestrator::new(fetcher, publisher, cache.clone()),
        cache,
    )
}

fn request(track: &str) -> PlaybackRequest {
    PlaybackRequest {
        track: TrackId::new(track),
        chat_id: 1,
        status_message_id: None,
        lang: "en".to_string(),
    }
}

#[tokio::test]
async fn test_first_selection_fetches_and_caches() {
    let fetcher = MockFetcher::new();
    let publisher = MockPublisher::new();
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    let outcome = orch.handle(&request("abc123")).await;

    assert_eq!(outcome, PlaybackOutcome::Delivered);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(publisher.file_calls(), 1);
    assert!(cache.get(&TrackId::new("abc123")).await.is_some());
    assert!(fetcher.no_scratch_left());
}

#[tokio::test]
async fn test_second_selection_resends_without_fetching() {
    let fetcher = MockFetcher::new();
    let publisher = MockPublisher::new();
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    orch.handle(&request("abc123")).await;
    let outcome = orch.handle(&request("abc123")).await;

    assert_eq!(outcome, PlaybackOutcome::Resent);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(publisher.ref_calls(), 1);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_fetch_failure_is_terminal_and_leaves_no_entry() {
    let fetcher = MockFetcher::new();
    fetcher.fail.store(true, Ordering::SeqCst);
    let publisher = MockPublisher::new();
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    let outcome = orch.handle(&request("bad1")).await;

    assert!(matches!(outcome, PlaybackOutcome::Failed(_)));
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(publisher.file_calls(), 0);
    assert!(cache.get(&TrackId::new("bad1")).await.is_none());
}

#[tokio::test]
async fn test_stale_reference_falls_through_to_fresh_fetch() {
    let fetcher = MockFetcher::new();
    let publisher = MockPublisher::new();
    publisher.fail_ref_times.store(1, Ordering::SeqCst);
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    let track = TrackId::new("abc123");
    cache.put(track.clone(), FileRef::new("stale-ref")).await;

    let outcome = orch.handle(&request("abc123")).await;

    assert_eq!(outcome, PlaybackOutcome::Delivered);
    assert_eq!(publisher.ref_calls(), 1);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(publisher.file_calls(), 1);

    // Stale entry was overwritten by the fresh upload's reference
    let current = cache.get(&track).await.unwrap();
    assert_ne!(current, FileRef::new("stale-ref"));
    assert!(fetcher.no_scratch_left());
}

#[tokio::test]
async fn test_publish_failure_still_releases_artifact() {
    let fetcher = MockFetcher::new();
    let publisher = MockPublisher::new();
    publisher.fail_file.store(true, Ordering::SeqCst);
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    let outcome = orch.handle(&request("abc123")).await;

    assert!(matches!(outcome, PlaybackOutcome::Failed(_)));
    assert!(cache.get(&TrackId::new("abc123")).await.is_none());
    assert!(fetcher.no_scratch_left());
}

#[tokio::test]
async fn test_concurrent_selections_fetch_once() {
    let fetcher = MockFetcher::with_delay(Duration::from_millis(80));
    let publisher = MockPublisher::new();
    let cache = Arc::new(FileRefCache::default());
    let orch = Arc::new(PlaybackOrchestrator::new(
        fetcher.clone(),
        publisher.clone(),
        cache.clone(),
    ));

    let a = tokio::spawn({
        let orch = orch.clone();
        async move { orch.handle(&request("abc123")).await }
    });
    let b = tokio::spawn({
        let orch = orch.clone();
        async move { orch.handle(&request("abc123")).await }
    });

    let (first, second) = (a.await.unwrap(), b.await.unwrap());

    // One caller fetched, the other resent from the cache it populated
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(publisher.file_calls(), 1);
    assert_eq!(publisher.ref_calls(), 1);

    let outcomes = [first, second];
    assert!(outcomes.contains(&PlaybackOutcome::Delivered));
    assert!(outcomes.contains(&PlaybackOutcome::Resent));
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_independent_tracks_fetch_independently() {
    let fetcher = MockFetcher::new();
    let publisher = MockPublisher::new();
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    orch.handle(&request("track-a")).await;
    orch.handle(&request("track-b")).await;

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(cache.len().await, 2);
}

#[tokio::test]
async fn test_repeated_orchestrations_keep_one_entry_per_track() {
    let fetcher = MockFetcher::new();
    let publisher = MockPublisher::new();
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    for _ in 0..3 {
        orch.handle(&request("abc123")).await;
    }

    assert_eq!(cache.len().await, 1);
    assert_eq!(fetcher.calls(), 1);
    assert!(fetcher.no_scratch_left());
}

#[tokio::test]
async fn test_failed_fetch_then_retry_selection_succeeds() {
    let fetcher = MockFetcher::new();
    fetcher.fail.store(true, Ordering::SeqCst);
    let publisher = MockPublisher::new();
    let (orch, cache) = orchestrator(fetcher.clone(), publisher.clone());

    assert!(matches!(
        orch.handle(&request("abc123")).await,
        PlaybackOutcome::Failed(_)
    ));

    // A retry is a fresh user selection, not an automatic loop
    fetcher.fail.store(false, Ordering::SeqCst);
    assert_eq!(orch.handle(&request("abc123")).await, PlaybackOutcome::Delivered);
    assert_eq!(fetcher.calls(), 2);
    assert!(cache.get(&TrackId::new("abc123")).await.is_some());
}
