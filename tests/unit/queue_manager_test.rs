//! QueueManager tests against a local mock server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use omnidownloader::managers::queue_manager::{QueueManager, ANALYZING_PLACEHOLDER, ARCHIVE_FETCH_FAILED};
use omnidownloader::services::classifier::{classify_by_extension, Classifier, HeuristicClassifier};
use omnidownloader::services::fetch_engine::{AccessStrategy, FetchEngine};
use omnidownloader::services::save_target::{DirectorySaveTarget, SaveTarget};
use omnidownloader::types::errors::{ClassifierError, QueueError, SaveError};
use omnidownloader::types::media::{AnalysisResult, DownloadStatus, MediaType};
use omnidownloader::types::settings::FetchSettings;
use tempfile::TempDir;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Heuristic classifier that holds back batches containing "pending" until
/// the gate is opened.
struct GatedClassifier {
    gate: Arc<Notify>,
}

#[async_trait]
impl Classifier for GatedClassifier {
    async fn classify(&self, urls: &[String]) -> Result<Vec<AnalysisResult>, ClassifierError> {
        if urls.iter().any(|u| u.contains("pending")) {
            self.gate.notified().await;
        }
        Ok(urls.iter().map(|u| classify_by_extension(u)).collect())
    }
}

/// Save boundary that always fails, as a full disk would.
struct FullDiskTarget;

impl SaveTarget for FullDiskTarget {
    fn save(&self, _bytes: &[u8], _filename: &str) -> Result<std::path::PathBuf, SaveError> {
        Err(SaveError::IoError("disk full".to_string()))
    }
}

fn direct_fetcher() -> Arc<FetchEngine> {
    Arc::new(
        FetchEngine::new(&FetchSettings::default())
            .unwrap()
            .with_strategies(vec![AccessStrategy::Direct]),
    )
}

fn queue() -> QueueManager {
    QueueManager::new(Arc::new(HeuristicClassifier), direct_fetcher())
}

async fn serve(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

fn zip_names(path: &std::path::Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[tokio::test]
async fn enqueue_classifies_and_prepends() {
    let queue = queue();
    queue.enqueue("https://a.com/old.png").await;

    let ids = queue
        .enqueue("a.com/one.jpg not-a-url https://a.com/two.webm")
        .await;
    assert_eq!(ids.len(), 2);

    let items = queue.items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].id, ids[0]);
    assert_eq!(items[1].id, ids[1]);
    assert_eq!(items[2].filename, "old.png");

    assert_eq!(items[0].original_url, "https://a.com/one.jpg");
    assert_eq!(items[0].direct_url.as_deref(), Some("https://a.com/one.jpg"));
    assert_eq!(items[0].status, DownloadStatus::Ready);
    assert_eq!(items[0].media_type, MediaType::Image);

    assert_eq!(items[1].media_type, MediaType::Video);
    assert_eq!(items[1].filename, "two.mov");
    assert_eq!(items[1].original_filename.as_deref(), Some("two.mov"));
}

#[tokio::test]
async fn enqueue_without_urls_is_noop() {
    let queue = queue();
    assert!(queue.enqueue("  nothing here  ").await.is_empty());
    assert!(queue.is_empty());
}

#[tokio::test]
async fn analyzing_items_are_not_ready_or_editable() {
    let gate = Arc::new(Notify::new());
    let queue = QueueManager::new(
        Arc::new(GatedClassifier { gate: gate.clone() }),
        direct_fetcher(),
    );
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let (ids, _) = tokio::join!(queue.enqueue("https://a.com/pending.png"), async {
        let item = queue.items().remove(0);
        assert_eq!(item.status, DownloadStatus::Analyzing);
        assert_eq!(item.filename, ANALYZING_PLACEHOLDER);
        assert!(matches!(
            queue.download_one(&item.id, &target).await,
            Err(QueueError::NotReady(_))
        ));
        assert!(matches!(
            queue.rename(&item.id, "x.png"),
            Err(QueueError::NotEditable(_))
        ));
        gate.notify_one();
    });

    assert_eq!(queue.get(&ids[0]).unwrap().status, DownloadStatus::Ready);
}

#[tokio::test]
async fn download_one_saves_video_as_mov() {
    let server = MockServer::start().await;
    serve(&server, "/clip.mp4", b"video-bytes").await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let queue = queue();
    let ids = queue.enqueue(&format!("{}/clip.mp4", server.uri())).await;
    queue.rename(&ids[0], "  holiday.mp4 ").unwrap();

    let saved = queue.download_one(&ids[0], &target).await.unwrap();
    assert_eq!(saved.file_name().unwrap(), "holiday.mov");
    assert_eq!(std::fs::read(&saved).unwrap(), b"video-bytes".to_vec());

    let item = queue.get(&ids[0]).unwrap();
    assert_eq!(item.status, DownloadStatus::Completed);
    assert_eq!(item.progress, 100);
    assert!(item.size_label.is_some());
}

#[tokio::test]
async fn download_one_failure_marks_error_and_allows_retry() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let queue = queue();
    let ids = queue.enqueue(&format!("{}/late.png", server.uri())).await;

    let err = queue.download_one(&ids[0], &target).await.unwrap_err();
    assert!(matches!(err, QueueError::Fetch(_)));
    assert_eq!(err.to_string(), "All access strategies failed: HTTP 404");
    let item = queue.get(&ids[0]).unwrap();
    assert_eq!(item.status, DownloadStatus::Error);
    assert_eq!(item.error.as_deref(), Some("HTTP 404"));

    serve(&server, "/late.png", b"png").await;
    queue.download_one(&ids[0], &target).await.unwrap();
    let item = queue.get(&ids[0]).unwrap();
    assert_eq!(item.status, DownloadStatus::Completed);
    assert!(item.error.is_none());
}

#[tokio::test]
async fn download_one_rejects_item_already_downloading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let queue = queue();
    let ids = queue.enqueue(&format!("{}/slow.jpg", server.uri())).await;

    let (first, second) = tokio::join!(
        queue.download_one(&ids[0], &target),
        queue.download_one(&ids[0], &target)
    );
    assert!(first.is_ok());
    assert!(matches!(second, Err(QueueError::AlreadyDownloading(_))));
}

#[tokio::test]
async fn download_one_unknown_id() {
    let dir = TempDir::new().unwrap();
    let result = queue()
        .download_one("missing", &DirectorySaveTarget::new(dir.path()))
        .await;
    assert!(matches!(result, Err(QueueError::NotFound(_))));
}

#[tokio::test]
async fn archive_skips_analyzing_items() {
    let server = MockServer::start().await;
    serve(&server, "/a.jpg", b"aaa").await;
    serve(&server, "/b.mp4", b"bbb").await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let gate = Arc::new(Notify::new());
    let queue = QueueManager::new(
        Arc::new(GatedClassifier { gate: gate.clone() }),
        direct_fetcher(),
    );
    let uri = server.uri();
    let ids = queue.enqueue(&format!("{uri}/a.jpg {uri}/b.mp4")).await;
    queue.download_one(&ids[1], &target).await.unwrap();

    let pending = format!("{uri}/pending.png");
    let (_, report) = tokio::join!(queue.enqueue(&pending), async {
        let report = queue.download_all_as_archive(&target).await;
        gate.notify_one();
        report
    });

    let report = report.unwrap().unwrap();
    assert!(report.archive_name.starts_with("Batch_"));
    assert_eq!(report.entries, vec!["a.jpg".to_string(), "b.mov".to_string()]);
    assert!(report.failures.is_empty());
    assert_eq!(zip_names(&report.saved_path.unwrap()), report.entries);

    assert_eq!(queue.get(&ids[0]).unwrap().status, DownloadStatus::Completed);
}

#[tokio::test]
async fn archive_continues_past_failed_fetch() {
    let server = MockServer::start().await;
    serve(&server, "/ok.png", b"ok").await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let queue = queue();
    let uri = server.uri();
    let ids = queue.enqueue(&format!("{uri}/ok.png {uri}/gone.png")).await;

    let report = queue.download_all_as_archive(&target).await.unwrap().unwrap();
    assert_eq!(report.entries, vec!["ok.png".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, ids[1]);
    assert_eq!(report.failures[0].message, "HTTP 404");

    let failed = queue.get(&ids[1]).unwrap();
    assert_eq!(failed.status, DownloadStatus::Error);
    assert_eq!(failed.error.as_deref(), Some(ARCHIVE_FETCH_FAILED));
    assert!(report.saved_path.is_some());
}

#[tokio::test]
async fn archive_with_every_fetch_failing_saves_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let queue = queue();
    queue.enqueue(&format!("{}/gone.png", server.uri())).await;

    let report = queue.download_all_as_archive(&target).await.unwrap().unwrap();
    assert!(report.entries.is_empty());
    assert!(report.saved_path.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0), 0);
}

#[tokio::test]
async fn archive_on_empty_queue_is_none() {
    let dir = TempDir::new().unwrap();
    let report = queue()
        .download_all_as_archive(&DirectorySaveTarget::new(dir.path()))
        .await
        .unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn concurrent_archive_request_is_noop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"big".to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let queue = queue();
    queue.enqueue(&format!("{}/big.jpg", server.uri())).await;

    let (first, second) = tokio::join!(
        queue.download_all_as_archive(&target),
        queue.download_all_as_archive(&target)
    );
    assert!(first.unwrap().is_some());
    assert!(second.unwrap().is_none());
    assert!(!queue.is_archiving());
}

#[tokio::test]
async fn rename_validation() {
    let queue = queue();
    let ids = queue.enqueue("https://a.com/pic.png").await;

    assert!(matches!(queue.rename(&ids[0], "   "), Err(QueueError::InvalidFilename(_))));
    assert!(matches!(queue.rename("nope", "x"), Err(QueueError::NotFound(_))));

    queue.rename(&ids[0], " cover.png ").unwrap();
    assert_eq!(queue.get(&ids[0]).unwrap().filename, "cover.png");
}

#[tokio::test]
async fn bulk_operations_on_queue() {
    let queue = queue();
    queue.enqueue("https://a.com/x.png https://a.com/y.pdf https://a.com/z").await;

    assert_eq!(queue.bulk_prefix("  "), 0);
    assert_eq!(queue.bulk_prefix("A_"), 3);
    queue.sequence();
    let names: Vec<String> = queue.items().into_iter().map(|i| i.filename).collect();
    assert_eq!(names, vec!["A_x-01.png", "A_y-02.pdf", "A_z-03"]);

    assert_eq!(queue.search_replace("A_", ""), 3);
    assert_eq!(queue.search_replace("", "q"), 0);
    assert_eq!(queue.search_replace("-02", "-two"), 1);
    assert_eq!(queue.items()[1].filename, "y-two.pdf");

    queue.reset_names();
    let names: Vec<String> = queue.items().into_iter().map(|i| i.filename).collect();
    assert_eq!(names, vec!["x.png", "y.pdf", "z"]);
}

#[tokio::test]
async fn remove_and_clear() {
    let queue = queue();
    let ids = queue.enqueue("https://a.com/1.png https://a.com/2.png").await;

    let removed = queue.remove(&ids[0]).unwrap();
    assert_eq!(removed.filename, "1.png");
    assert!(matches!(queue.remove(&ids[0]), Err(QueueError::NotFound(_))));
    assert_eq!(queue.len(), 1);

    queue.clear();
    assert!(queue.is_empty());
}

#[tokio::test]
async fn archive_save_failure_marks_fetched_items_error() {
    let server = MockServer::start().await;
    serve(&server, "/a.png", b"aaa").await;
    serve(&server, "/b.png", b"bbb").await;

    let queue = queue();
    let uri = server.uri();
    let ids = queue.enqueue(&format!("{uri}/a.png {uri}/b.png")).await;

    let result = queue.download_all_as_archive(&FullDiskTarget).await;
    assert!(matches!(result, Err(QueueError::Save(_))));

    for id in &ids {
        let item = queue.get(id).unwrap();
        assert_eq!(item.status, DownloadStatus::Error);
        assert_eq!(item.error.as_deref(), Some("Save failed: disk full"));
    }
    assert!(!queue.is_archiving());
}

#[tokio::test]
async fn archive_skips_item_taken_by_single_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/first.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"first".to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"second".to_vec())
                .set_delay(Duration::from_millis(800)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let target = DirectorySaveTarget::new(dir.path());

    let queue = queue();
    let uri = server.uri();
    let ids = queue.enqueue(&format!("{uri}/first.jpg {uri}/second.jpg")).await;

    let (archive, single) = tokio::join!(
        queue.download_all_as_archive(&target),
        queue.download_one(&ids[1], &target)
    );

    let report = archive.unwrap().unwrap();
    assert_eq!(report.entries, vec!["first.jpg".to_string()]);
    assert!(report.failures.is_empty());
    assert_eq!(single.unwrap().file_name().unwrap(), "second.jpg");
    assert_eq!(queue.get(&ids[1]).unwrap().status, DownloadStatus::Completed);
}

#[tokio::test]
async fn search_replace_never_blanks_a_filename() {
    let queue = queue();
    let ids = queue.enqueue("https://a.com/x.png https://a.com/xx.png").await;

    assert_eq!(queue.search_replace("x.png", ""), 1);
    let first = queue.get(&ids[0]).unwrap();
    assert_eq!(first.status, DownloadStatus::Ready);
    assert_eq!(first.filename, "x.png");
    assert_eq!(queue.get(&ids[1]).unwrap().filename, "x");

    assert_eq!(queue.search_replace("x.png", " "), 0);
    assert_eq!(queue.search_replace("png", "png"), 0);
}
