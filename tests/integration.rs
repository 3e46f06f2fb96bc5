//! End-to-end pipeline tests against an in-memory site, without hitting the network.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tiktok_dl::downloader::transport::ByteStream;
use tiktok_dl::queue::TaskStatus;
use tiktok_dl::{Downloader, DownloaderSettings, QueueManager, TiktokError, Transport};

const VIDEO_URL: &str = "https://www.tiktok.com/@user/video/7000000000001";
const PLAY_URL: &str = "https://v16.example/video.mp4";
const COVER_URL: &str = "https://p16.example/cover.jpg";

#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, String>,
    media: HashMap<String, Vec<u8>>,
    page_requests: Mutex<Vec<String>>,
    media_requests: Mutex<Vec<String>>,
}

impl FakeSite {
    fn with_page(mut self, url: &str, page_props: Value) -> Self {
        self.pages.insert(url.to_string(), render_page(&page_props));
        self
    }

    fn with_raw_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn with_media(mut self, url: &str, body: &[u8]) -> Self {
        self.media.insert(url.to_string(), body.to_vec());
        self
    }

    fn media_requests(&self) -> Vec<String> {
        self.media_requests.lock().unwrap().clone()
    }

    fn page_requests(&self) -> usize {
        self.page_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeSite {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn fetch_page(&self, url: &str) -> Result<String, TiktokError> {
        self.page_requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or(TiktokError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_media(&self, url: &str) -> Result<ByteStream, TiktokError> {
        self.media_requests.lock().unwrap().push(url.to_string());
        let body = self.media.get(url).cloned().ok_or(TiktokError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })?;
        // deliver in two chunks to exercise streaming
        let mid = body.len() / 2;
        let chunks = vec![Ok(body[..mid].to_vec()), Ok(body[mid..].to_vec())];
        Ok(stream::iter(chunks).boxed())
    }
}

fn render_page(page_props: &Value) -> String {
    let next_data = json!({"props": {"pageProps": page_props}, "page": "/share/video/[id]"});
    format!(
        "<!DOCTYPE html><html><head><title>TikTok</title></head><body>\
         <script id=\"__NEXT_DATA__\" type=\"application/json\" crossorigin=\"anonymous\">{}</script>\
         </body></html>",
        next_data
    )
}

fn page_props(id: &str) -> Value {
    json!({
        "statusCode": 0,
        "videoData": {
            "itemInfos": {
                "id": id,
                "createTime": "1700000000",
                "video": {
                    "urls": [PLAY_URL, "https://v19.example/video.mp4"],
                    "videoMeta": {"width": 576, "height": 1024, "duration": 15}
                },
                "covers": [COVER_URL],
                "commentCount": 12,
                "diggCount": 340,
                "shareCount": 5,
                "playCount": 10000
            },
            "authorInfos": {
                "uniqueId": "user",
                "nickName": "Zoë ünïcode",
                "secUid": "MS4wLjABAAAA",
                "userId": "6800000000000000000",
                "covers": ["https://p16.example/avatar.jpg"]
            },
            "authorStats": {"followerCount": 2500, "heartCount": 98765},
            "musicInfos": {"musicId": "1", "musicName": "original sound", "authorName": "user"},
            "challengeInfoList": [],
            "textExtra": []
        },
        "shareMeta": {"desc": "caption #fyp"}
    })
}

fn settings(dir: &TempDir) -> DownloaderSettings {
    DownloaderSettings {
        directory_prefix: Some(dir.path().to_path_buf()),
        sleep_interval: 0.0,
        ..Default::default()
    }
}

fn full_site() -> FakeSite {
    FakeSite::default()
        .with_page(VIDEO_URL, page_props("7000000000001"))
        .with_media(PLAY_URL, b"mp4-bytes")
        .with_media(COVER_URL, b"jpg-bytes")
}

async fn downloader(settings: DownloaderSettings, site: Arc<FakeSite>) -> Downloader {
    Downloader::with_transport(settings, site).await.expect("downloader")
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).expect("json file")).expect("valid json")
}

#[tokio::test]
async fn end_to_end_writes_three_files() {
    let temp = TempDir::new().expect("temp dir");
    let site = Arc::new(full_site());
    let dl = downloader(settings(&temp), site.clone()).await;

    let report = dl.download(VIDEO_URL).await.expect("download");
    let base = temp
        .path()
        .join("2023-14-11_22-13-20 7000000000001_6800000000000000000");
    assert_eq!(report.base_path, base);
    assert_eq!(report.written.len(), 3);

    let mp4 = base.with_extension("mp4");
    let jpg = base.with_extension("jpg");
    let sidecar = base.with_extension("json");
    assert_eq!(std::fs::read(&mp4).unwrap(), b"mp4-bytes");
    assert_eq!(std::fs::read(&jpg).unwrap(), b"jpg-bytes");

    let envelope = read_json(&sidecar);
    assert_eq!(envelope["video_data"]["id"], "7000000000001");
    assert_eq!(envelope["video_data"]["upload_date"], "20231114");
    assert_eq!(envelope["aweme_data"]["statusCode"], 0);
    assert_eq!(envelope["tiktok-dl"], env!("CARGO_PKG_VERSION"));
    assert!(envelope["timestamp"].as_i64().unwrap() > 0);

    // non-ASCII text is written as-is
    let raw = std::fs::read_to_string(&sidecar).unwrap();
    assert!(raw.contains("Zoë ünïcode"));

    // only the first candidate URLs are used
    assert_eq!(site.media_requests(), vec![PLAY_URL, COVER_URL]);
}

#[tokio::test]
async fn unavailable_video_downloads_nothing() {
    let temp = TempDir::new().expect("temp dir");
    let site = Arc::new(FakeSite::default().with_page(
        VIDEO_URL,
        json!({"statusCode": 10004, "videoData": {}}),
    ));
    let dl = downloader(settings(&temp), site.clone()).await;

    let err = dl.download(VIDEO_URL).await.unwrap_err();
    assert!(matches!(err, TiktokError::VideoUnavailable(ref id) if id == "7000000000001"));
    assert!(err.is_warning());
    assert!(site.media_requests().is_empty());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn malformed_json_reports_video_id() {
    let temp = TempDir::new().expect("temp dir");
    let html = r#"<script id="__NEXT_DATA__" type="application/json" crossorigin="anonymous">{"props": </script>"#;
    let site = Arc::new(FakeSite::default().with_raw_page(VIDEO_URL, html));
    let dl = downloader(settings(&temp), site).await;

    let err = dl.download(VIDEO_URL).await.unwrap_err();
    assert!(matches!(err, TiktokError::JsonDecodeError { ref video_id, .. } if video_id == "7000000000001"));
}

#[tokio::test]
async fn page_without_data_is_extraction_error() {
    let temp = TempDir::new().expect("temp dir");
    let site = Arc::new(FakeSite::default().with_raw_page(VIDEO_URL, "<html></html>"));
    let dl = downloader(settings(&temp), site).await;

    let err = dl.download(VIDEO_URL).await.unwrap_err();
    assert!(matches!(err, TiktokError::ExtractionError(_)));
}

#[tokio::test]
async fn failed_video_keeps_other_files() {
    let temp = TempDir::new().expect("temp dir");
    let site = Arc::new(
        FakeSite::default()
            .with_page(VIDEO_URL, page_props("7000000000001"))
            .with_media(COVER_URL, b"jpg-bytes"),
    );
    let dl = downloader(settings(&temp), site).await;

    let report = dl.download(VIDEO_URL).await.expect("download");
    assert!(!report.base_path.with_extension("mp4").exists());
    assert!(report.base_path.with_extension("jpg").exists());
    assert!(report.base_path.with_extension("json").exists());
}

#[tokio::test]
async fn missing_template_value_is_fatal_for_url() {
    let temp = TempDir::new().expect("temp dir");
    let mut props = page_props("7000000000001");
    props["videoData"]["itemInfos"]
        .as_object_mut()
        .unwrap()
        .remove("createTime");
    let site = Arc::new(
        FakeSite::default()
            .with_page(VIDEO_URL, props)
            .with_media(PLAY_URL, b"mp4-bytes"),
    );
    let dl = downloader(settings(&temp), site.clone()).await;

    let err = dl.download(VIDEO_URL).await.unwrap_err();
    assert!(matches!(err, TiktokError::Template(_)));
    assert!(site.media_requests().is_empty());
}

#[tokio::test]
async fn simulate_writes_nothing() {
    let temp = TempDir::new().expect("temp dir");
    let site = Arc::new(full_site());
    let dl = downloader(
        DownloaderSettings {
            simulate: true,
            ..settings(&temp)
        },
        site.clone(),
    )
    .await;

    let report = dl.download(VIDEO_URL).await.expect("download");
    assert!(report.written.is_empty());
    assert!(site.media_requests().is_empty());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn skip_download_still_writes_sidecars() {
    let temp = TempDir::new().expect("temp dir");
    let site = Arc::new(full_site());
    let dl = downloader(
        DownloaderSettings {
            skip_download: true,
            write_description: true,
            output_template: "{unique_id}/{id}".to_string(),
            ..settings(&temp)
        },
        site.clone(),
    )
    .await;

    let report = dl.download(VIDEO_URL).await.expect("download");
    let base = temp.path().join("user").join("7000000000001");
    assert_eq!(report.base_path, base);
    assert!(site.media_requests().is_empty());
    assert_eq!(
        std::fs::read_to_string(base.with_extension("description")).unwrap(),
        "caption #fyp"
    );
    assert!(base.with_extension("json").exists());
}

#[tokio::test]
async fn no_overwrites_keeps_existing_sidecar() {
    let temp = TempDir::new().expect("temp dir");
    let site = Arc::new(full_site());
    let dl = downloader(
        DownloaderSettings {
            no_overwrites: true,
            output_template: "{id}".to_string(),
            ..settings(&temp)
        },
        site,
    )
    .await;

    let sidecar = temp.path().join("7000000000001.json");
    std::fs::write(&sidecar, b"{}").unwrap();

    dl.download(VIDEO_URL).await.expect("download");
    assert_eq!(std::fs::read(&sidecar).unwrap(), b"{}");
}

#[tokio::test]
async fn archive_skips_known_ids() {
    let temp = TempDir::new().expect("temp dir");
    let archive = temp.path().join("archive.txt");
    let site = Arc::new(full_site());
    let config = DownloaderSettings {
        download_archive: Some(archive.clone()),
        ..settings(&temp)
    };

    let dl = downloader(config.clone(), site.clone()).await;
    dl.download(VIDEO_URL).await.expect("first download");
    assert_eq!(std::fs::read_to_string(&archive).unwrap(), "7000000000001\n");

    // a fresh run reloads the archive and skips before fetching the page
    let dl = downloader(config, site.clone()).await;
    let err = dl.download(VIDEO_URL).await.unwrap_err();
    assert!(matches!(err, TiktokError::AlreadyArchived(_)));
    assert_eq!(site.page_requests(), 1);
}

#[tokio::test]
async fn failed_video_is_not_archived() {
    let temp = TempDir::new().expect("temp dir");
    let archive = temp.path().join("archive.txt");
    let site = Arc::new(
        FakeSite::default()
            .with_page(VIDEO_URL, page_props("7000000000001"))
            .with_media(COVER_URL, b"jpg-bytes"),
    );
    let config = DownloaderSettings {
        download_archive: Some(archive.clone()),
        ..settings(&temp)
    };

    let dl = downloader(config.clone(), site.clone()).await;
    let report = dl.download(VIDEO_URL).await.expect("download");
    assert!(!report.base_path.with_extension("mp4").exists());
    assert!(!archive.exists() || std::fs::read_to_string(&archive).unwrap().is_empty());

    // the next run tries the video again
    let dl = downloader(config, site.clone()).await;
    dl.download(VIDEO_URL).await.expect("retry");
    assert_eq!(site.page_requests(), 2);
    assert_eq!(site.media_requests().iter().filter(|u| *u == PLAY_URL).count(), 2);
}

#[tokio::test]
async fn batch_isolates_failures() {
    let temp = TempDir::new().expect("temp dir");
    let unavailable = "https://www.tiktok.com/@user/video/7000000000002";
    let site = Arc::new(full_site().with_page(unavailable, json!({"statusCode": 10004})));
    let dl = downloader(settings(&temp), site).await;
    let queue = QueueManager::new(Arc::new(dl)).with_concurrency(1);

    let urls = vec![
        "https://example.com/not-a-video".to_string(),
        unavailable.to_string(),
        // not served by the site: the page fetch fails with a 404
        "https://www.tiktok.com/@user/video/7000000000404".to_string(),
        VIDEO_URL.to_string(),
    ];
    let results = queue.run(urls.clone()).await;
    assert_eq!(results.len(), 4);

    let status_of = |url: &str| {
        results
            .iter()
            .find(|r| r.url == url)
            .map(|r| r.status.clone())
            .unwrap()
    };
    assert!(matches!(status_of(&urls[0]), TaskStatus::Failed(_)));
    assert!(matches!(status_of(&urls[1]), TaskStatus::Skipped(_)));
    assert!(matches!(status_of(&urls[2]), TaskStatus::Failed(ref e) if e.contains("404")));
    assert_eq!(status_of(&urls[3]), TaskStatus::Completed);
}

#[tokio::test]
async fn duplicate_urls_download_once() {
    let temp = TempDir::new().expect("temp dir");
    let archive = temp.path().join("archive.txt");
    let site = Arc::new(full_site());
    let dl = downloader(
        DownloaderSettings {
            download_archive: Some(archive.clone()),
            concurrent_count: 2,
            ..settings(&temp)
        },
        site.clone(),
    )
    .await;

    let urls = vec![VIDEO_URL.to_string(), VIDEO_URL.to_string()];
    let summary = QueueManager::new(Arc::new(dl)).run_summary(urls).await;
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(site.page_requests(), 1);
    assert_eq!(
        site.media_requests().iter().filter(|u| *u == PLAY_URL).count(),
        1
    );
    assert_eq!(std::fs::read_to_string(&archive).unwrap(), "7000000000001\n");
}

#[tokio::test]
async fn concurrent_batch_completes_every_url() {
    let temp = TempDir::new().expect("temp dir");
    let mut site = FakeSite::default()
        .with_media(PLAY_URL, b"mp4-bytes")
        .with_media(COVER_URL, b"jpg-bytes");
    let mut urls = Vec::new();
    for n in 1..=4 {
        let id = format!("700000000000{}", n);
        let url = format!("https://www.tiktok.com/@user/video/{}", id);
        site = site.with_page(&url, page_props(&id));
        urls.push(url);
    }
    let dl = downloader(
        DownloaderSettings {
            output_template: "{id}".to_string(),
            concurrent_count: 3,
            ..settings(&temp)
        },
        Arc::new(site),
    )
    .await;

    let summary = QueueManager::new(Arc::new(dl)).run_summary(urls).await;
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.total(), 4);
    for n in 1..=4 {
        assert!(temp.path().join(format!("700000000000{}.mp4", n)).exists());
    }
}
