//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing and detail pages to the real
//! HTTP browser, and run generation and execution end-to-end against a
//! SQLite queue and a file sink.

use job_crawl::config::{parse_config, Config};
use job_crawl::crawler;
use job_crawl::output::load_statistics;
use job_crawl::queue::JobQueue;
use job_crawl::storage::SqliteStore;
use job_crawl::{CrawlError, CrawlJob, JobStatus};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a validated configuration around the given strategy-specific TOML
fn create_test_config(base_url: &str, workdir: &Path, body: &str) -> Config {
    let content = format!(
        r#"
[crawler]
base-url = "{base_url}/"
sleep-seconds = 0
timeout-seconds = 5
retry-count = 0
batch-size = 2
batch-interval-seconds = 0
output-directory = '{out}'
{body}

[store]
backend = "sqlite"
path = '{db}'
"#,
        base_url = base_url,
        out = workdir.join("pages").display(),
        db = workdir.join("jobs.db").display(),
        body = body,
    );
    parse_config(&content).expect("test config should be valid")
}

const NEXT_LINK: &str = r#"strategy = "next_link"

[selector]
list-links = "ul.areas a"
detail-links = "a.job"
next-page = "a.next"

[pagination]
type = "none"
"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn open_queue(workdir: &Path) -> Arc<JobQueue> {
    let store = SqliteStore::new(&workdir.join("jobs.db")).expect("open store");
    Arc::new(JobQueue::new(Arc::new(store)))
}

async fn mount_listing_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        r#"<ul class="areas"><li><a href="/list/tokyo">Tokyo</a></li></ul>"#,
    )
    .await;
    mount_page(
        server,
        "/list/tokyo",
        r#"<a class="job" href="/job/1">1</a>
           <a class="job" href="/job/2">2</a>
           <a class="next" href="/list/tokyo/page/2">Next</a>"#,
    )
    .await;
    mount_page(
        server,
        "/list/tokyo/page/2",
        r#"<a class="job" href="/job/2">2</a>
           <a class="job" href="/job/3">3</a>"#,
    )
    .await;
}

#[tokio::test]
async fn test_generate_then_execute() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    mount_listing_site(&server).await;
    for id in 1..=3 {
        mount_page(&server, &format!("/job/{}", id), &format!("<h1>Job {}</h1>", id)).await;
    }

    let config = Arc::new(create_test_config(&server.uri(), workdir.path(), NEXT_LINK));
    let queue = open_queue(workdir.path());

    let generated = crawler::generate(config.clone(), queue.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(generated.seeds, 1);
    assert_eq!(generated.jobs_created, 3);
    assert_eq!(queue.count_by_status(JobStatus::Pending).await.unwrap(), 3);

    let executed = crawler::execute(config.clone(), queue.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(executed.succeeded, 3);
    assert_eq!(executed.failed, 0);
    assert_eq!(executed.batches, 2);

    let stats = load_statistics(&queue).await.unwrap();
    assert_eq!(stats.count(JobStatus::Pending), 0);
    assert_eq!(stats.count(JobStatus::Success), 3);

    let pages: Vec<_> = std::fs::read_dir(workdir.path().join("pages"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(pages.len(), 3);
    assert!(pages
        .iter()
        .all(|p| p.extension().and_then(|e| e.to_str()) == Some("html")));
}

#[tokio::test]
async fn test_generation_is_idempotent() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    mount_listing_site(&server).await;

    let config = Arc::new(create_test_config(&server.uri(), workdir.path(), NEXT_LINK));
    let queue = open_queue(workdir.path());

    crawler::generate(config.clone(), queue.clone(), CancellationToken::new())
        .await
        .unwrap();
    let second = crawler::generate(config.clone(), queue.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(second.jobs_created, 0);
    assert_eq!(second.duplicates, 4);
    assert_eq!(queue.count_by_status(JobStatus::Pending).await.unwrap(), 3);
}

#[tokio::test]
async fn test_failed_job_is_retried_on_next_pass() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/job/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = Arc::new(create_test_config(&server.uri(), workdir.path(), NEXT_LINK));
    let queue = open_queue(workdir.path());
    let job = CrawlJob::new(&format!("{}/job/1", server.uri())).unwrap();
    queue.save(&job).await.unwrap();

    let first = crawler::execute(config.clone(), queue.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.failed, 1);
    assert!(queue.exists(&job).await.unwrap());
    assert!(queue
        .exists(&job.with_status(JobStatus::Failed))
        .await
        .unwrap());

    server.reset().await;
    mount_page(&server, "/job/1", "<h1>Back</h1>").await;

    let second = crawler::execute(config.clone(), queue.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.succeeded, 1);

    let stats = load_statistics(&queue).await.unwrap();
    assert_eq!(stats.total_jobs, 1);
    assert_eq!(stats.count(JobStatus::Success), 1);

    let saved =
        std::fs::read_to_string(workdir.path().join("pages").join(job.artifact_name())).unwrap();
    assert!(saved.contains("Back"));
}

#[tokio::test]
async fn test_total_count_queues_every_listing_page() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    mount_page(&server, "/list", r#"<p class="total">該当件数 25件</p>"#).await;

    let body = r#"seed-mode = "manual"
urls = ["/list?area=osaka"]
strategy = "total_count"

[selector]
total-count = "p.total"

[pagination]
type = "query"
param-identifier = "page"
per-page = 10
"#;
    let config = Arc::new(create_test_config(&server.uri(), workdir.path(), body));
    let queue = open_queue(workdir.path());

    let generated = crawler::generate(config.clone(), queue.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(generated.jobs_created, 3);
    for page in 1..=3 {
        let url = format!("{}/list?area=osaka&page={}", server.uri(), page);
        let job = CrawlJob::new(&url).unwrap();
        assert!(queue.exists(&job).await.unwrap(), "missing {}", url);
    }
}

#[tokio::test]
async fn test_listing_without_links_is_no_seeds() {
    let server = MockServer::start().await;
    let workdir = TempDir::new().unwrap();
    mount_page(&server, "/", "<p>Maintenance</p>").await;

    let config = Arc::new(create_test_config(&server.uri(), workdir.path(), NEXT_LINK));
    let queue = open_queue(workdir.path());

    let result = crawler::generate(config, queue, CancellationToken::new()).await;
    assert!(matches!(result, Err(CrawlError::NoSeeds)));
}
