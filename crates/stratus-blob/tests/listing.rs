//! Segmented listing against the in-memory blob service.

use std::sync::Mutex;
use std::time::Duration;

use futures::TryStreamExt;
use stratus_blob::prelude::*;
use stratus_core::{CancellationToken, ErrorKind, MAX_PAGE_SIZE, SegmentConfig};
use stratus_test::{MockBlobContainer, MockStorageConfig};

fn names(items: &[ListBlobItem]) -> Vec<&str> {
    items.iter().map(ListBlobItem::name).collect()
}

fn seeded(config: MockStorageConfig, blobs: &[&str]) -> MockBlobContainer {
    let container = MockBlobContainer::with_config("data", config);
    for name in blobs {
        container.insert_blob(*name, name.to_string());
    }
    container
}

fn flat() -> Option<BlobRequestOptions> {
    Some(BlobRequestOptions::new().with_flat_listing())
}

#[tokio::test]
async fn lists_every_segment_in_order() {
    let container = seeded(Default::default(), &["a", "b", "c", "d", "e"]);
    let seen = Mutex::new(Vec::new());
    let progress = |page: &[ListBlobItem]| {
        seen.lock().unwrap().push(names(page).join(""));
    };

    let listed = container
        .list_blobs_segmented(2, flat(), Some(&progress))
        .await
        .unwrap();

    assert_eq!(names(&listed), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(listed.pages(), 3);
    assert_eq!(*seen.lock().unwrap(), vec!["ab", "cd", "e"]);
    assert_eq!(container.stats().segment_requests(), 3);
}

#[tokio::test]
async fn server_may_return_smaller_segments() {
    let config = MockStorageConfig::default().with_max_segment(2);
    let container = seeded(config, &["a", "b", "c", "d", "e", "f"]);

    let listed = container
        .list_blobs_segmented(MAX_PAGE_SIZE, flat(), None)
        .await
        .unwrap();

    assert_eq!(listed.len(), 6);
    assert_eq!(listed.pages(), 3);
}

#[tokio::test]
async fn empty_container_reports_one_empty_segment() {
    let container = MockBlobContainer::new("data");
    container.create_if_not_exists().await.unwrap();

    let seen = Mutex::new(Vec::new());
    let progress = |page: &[ListBlobItem]| seen.lock().unwrap().push(page.len());

    let listed = container
        .list_blobs_segmented(100, None, Some(&progress))
        .await
        .unwrap();

    assert!(listed.is_empty());
    assert_eq!(*seen.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn directory_listing_follows_continuation() {
    let container = seeded(
        Default::default(),
        &["logs/1", "logs/2", "logs/3", "logs/4", "logs/5", "other"],
    );
    let directory = container.directory("logs");

    let listed = directory.list_blobs_segmented(2, None, None).await.unwrap();

    assert_eq!(
        names(&listed),
        vec!["logs/1", "logs/2", "logs/3", "logs/4", "logs/5"]
    );
    assert_eq!(container.stats().segment_requests(), 3);
}

#[tokio::test]
async fn hierarchical_listing_returns_directories() {
    let container = seeded(Default::default(), &["a.txt", "logs/1", "logs/old/0"]);

    let top = container.list_blobs_segmented(10, None, None).await.unwrap();
    let logs = container
        .directory("logs/")
        .list_blobs_segmented(10, None, None)
        .await
        .unwrap();

    assert_eq!(names(&top), vec!["a.txt", "logs/"]);
    assert!(top[1].is_directory());
    assert_eq!(names(&logs), vec!["logs/1", "logs/old/"]);
}

#[tokio::test]
async fn listing_details_include_metadata() {
    let container = seeded(Default::default(), &["a"]);
    let metadata = Metadata::from([("owner".to_owned(), "ops".to_owned())]);
    container.blob("a").set_metadata(&metadata).await.unwrap();

    let plain = container.list_blobs_segmented(10, None, None).await.unwrap();
    let detailed = container
        .list_blobs_segmented(10, Some(BlobRequestOptions::new().with_metadata()), None)
        .await
        .unwrap();

    assert!(plain[0].as_blob().unwrap().metadata.is_empty());
    assert_eq!(detailed[0].as_blob().unwrap().metadata, metadata);
}

#[tokio::test]
async fn rejects_page_sizes_out_of_range() {
    let container = seeded(Default::default(), &["a"]);

    for page_size in [0, MAX_PAGE_SIZE + 1] {
        let error = container
            .list_blobs_segmented(page_size, None, None)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
    }

    assert_eq!(container.stats().segment_requests(), 0);
}

#[tokio::test]
async fn missing_container_fails() {
    let container = MockBlobContainer::new("missing");

    let error = container
        .list_blobs_segmented(10, None, None)
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn failure_discards_earlier_segments() {
    let container = seeded(Default::default(), &["a", "b", "c", "d", "e"]);
    container.stats().fail_segment_at(2, ErrorKind::Network);

    let seen = Mutex::new(0usize);
    let progress = |_: &[ListBlobItem]| *seen.lock().unwrap() += 1;

    let error = container
        .list_blobs_segmented(2, flat(), Some(&progress))
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Network);
    assert!(error.is_retryable());
    assert_eq!(*seen.lock().unwrap(), 1);
    assert_eq!(container.stats().segment_requests(), 2);
}

#[tokio::test]
async fn stream_fetches_on_demand() {
    let container = seeded(Default::default(), &["a", "b", "c", "d"]);

    let mut pages = container
        .list_blobs(1, BlobRequestOptions::default())
        .unwrap()
        .into_stream();
    let first = pages.try_next().await.unwrap().unwrap();

    assert_eq!(names(first.items()), vec!["a"]);
    assert!(first.has_more());
    assert_eq!(container.stats().segment_requests(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_between_segments_stops_listing() {
    let config = MockStorageConfig::default().with_latency(Duration::from_millis(100));
    let container = seeded(config, &["a", "b", "c"]);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let progress = move |_: &[ListBlobItem]| trigger.cancel();

    let error = container
        .list_blobs(1, BlobRequestOptions::default())
        .unwrap()
        .with_progress(&progress)
        .with_cancellation(cancel)
        .collect()
        .await
        .unwrap_err();

    assert!(error.is_cancelled());
    assert_eq!(container.stats().segment_requests(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_outstanding_segment() {
    let config = MockStorageConfig::default().with_latency(Duration::from_millis(100));
    let container = seeded(config, &["a", "b", "c"]);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let error = container
        .list_blobs(1, BlobRequestOptions::default())
        .unwrap()
        .with_cancellation(cancel)
        .collect()
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Cancelled);
    assert_eq!(container.stats().segment_requests(), 2);
    assert_eq!(container.stats().cancellations(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_segment_times_out() {
    let config = MockStorageConfig::default().with_latency(Duration::from_secs(5));
    let container = seeded(config, &["a"]);

    let error = container
        .list_blobs(10, BlobRequestOptions::default())
        .unwrap()
        .with_fetch_timeout(Duration::from_secs(1))
        .collect()
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(container.stats().cancellations(), 1);
}

#[tokio::test]
async fn config_drives_page_size() {
    let container = seeded(Default::default(), &["a", "b", "c", "d", "e"]);

    let listed = container
        .list_blobs_with(
            &SegmentConfig::new(2),
            BlobRequestOptions::new().with_flat_listing(),
        )
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(names(&listed), vec!["a", "b", "c", "d", "e"]);
    assert_eq!(listed.pages(), 3);
    assert_eq!(container.stats().segment_requests(), 3);
}

#[tokio::test(start_paused = true)]
async fn config_timeout_applies_to_listing() {
    let config = MockStorageConfig::default().with_latency(Duration::from_secs(5));
    let container = seeded(config, &["a"]);
    let segments = SegmentConfig::new(10).with_fetch_timeout_secs(1);

    let error = container
        .list_blobs_with(&segments, BlobRequestOptions::default())
        .unwrap()
        .collect()
        .await
        .unwrap_err();

    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(container.stats().cancellations(), 1);
}

#[tokio::test]
async fn invalid_config_requests_nothing() {
    let container = seeded(Default::default(), &["a"]);

    let error = container
        .list_blobs_with(&SegmentConfig::new(0), BlobRequestOptions::default())
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::InvalidInput);

    let zero_timeout = SegmentConfig::new(10).with_fetch_timeout_secs(0);
    let error = container
        .list_blobs_with(&zero_timeout, BlobRequestOptions::default())
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::Configuration);

    assert_eq!(container.stats().segment_requests(), 0);
}
