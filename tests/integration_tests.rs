//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: request form → parallel HTTP page fetches
//! → ordered items

use clap::Parser;
use pagereq::cli::{Cli, Runner};
use pagereq::error::Error;
use pagereq::http::{HttpClient, HttpClientConfig, PacingConfig, ResponseErrorStrategy};
use pagereq::pagination::{
    fetch_all_pages, fetch_all_pages_with, FetchOptions, FormTransport, JsonPageExecutor,
    PageParams, PageRequest,
};
use pagereq::types::{BackoffType, Method};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

// ============================================================================
// Mock Paginated Service
// ============================================================================

/// Answers `{message, data, meta}` pages of `{"number": n}` items, reading
/// `page`/`limit` from the JSON body or, when there is none, the query string
struct PaginatedApi {
    total: u64,
    reject_page: Option<u32>,
}

impl PaginatedApi {
    fn new(total: u64) -> Self {
        Self {
            total,
            reject_page: None,
        }
    }

    fn rejecting(mut self, page: u32) -> Self {
        self.reject_page = Some(page);
        self
    }
}

fn paging_of(request: &Request) -> (u32, u32) {
    let read = |value: Option<&Value>| {
        value
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0) as u32
    };

    if request.body.is_empty() {
        let pairs: serde_json::Map<String, Value> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        (read(pairs.get("page")), read(pairs.get("limit")))
    } else {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        (read(body.get("page")), read(body.get("limit")))
    }
}

impl Respond for PaginatedApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let (page, limit) = paging_of(request);
        let page = page.max(1);

        if self.reject_page == Some(page) {
            return ResponseTemplate::new(422).set_body_json(json!({
                "error": {
                    "message": "page rejected",
                    "code": "E_PAGE",
                    "name": "ValidationError",
                    "data": [{"name": "page", "code": "invalid", "message": "bad page"}]
                }
            }));
        }

        let start = u64::from(page - 1) * u64::from(limit);
        let end = (start + u64::from(limit)).min(self.total);
        let data: Vec<Value> = (start..end).map(|n| json!({"number": n})).collect();

        // Scramble completion order across pages
        let delay = Duration::from_millis(u64::from(page * 37 % 5) * 10);

        ResponseTemplate::new(200)
            .set_delay(delay)
            .set_body_json(json!({
                "message": "paginator",
                "data": data,
                "meta": {"page": page, "limit": limit, "total": self.total}
            }))
    }
}

#[derive(Debug, Clone, Serialize)]
struct PostSearch {
    title: String,
    #[serde(flatten)]
    paging: PageParams,
}

impl PostSearch {
    fn new(page: u32, limit: u32, parallel: usize) -> Self {
        Self {
            title: "Anonymous".to_string(),
            paging: PageParams::new(page, limit).with_parallel(parallel),
        }
    }
}

impl PageRequest for PostSearch {
    fn page(&self) -> u32 {
        self.paging.page
    }

    fn set_page(&mut self, page: u32) {
        self.paging.page = page;
    }

    fn limit(&self) -> u32 {
        self.paging.limit
    }

    fn set_limit(&mut self, limit: u32) {
        self.paging.limit = limit;
    }

    fn parallel_count(&self) -> usize {
        self.paging.parallel_count
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Post {
    number: u64,
}

async fn mount(server: &MockServer, api: PaginatedApi) {
    Mock::given(path("/posts/search"))
        .respond_with(api)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> Arc<HttpClient> {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .label("gorest")
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(10),
        )
        .error_strategy(ResponseErrorStrategy::Envelope)
        .build();
    Arc::new(HttpClient::with_config(config).unwrap())
}

// ============================================================================
// Parallel Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_parallel_fetch_end_to_end() {
    let server = MockServer::start().await;
    mount(&server, PaginatedApi::new(125)).await;

    let executor = Arc::new(JsonPageExecutor::<Post>::new(
        client(&server),
        Method::POST,
        "/posts/search",
    ));
    let (page, limit) = (4u32, 13u32);

    let result = fetch_all_pages(PostSearch::new(page, limit, 10), executor)
        .await
        .unwrap();

    assert_eq!(result.items.len(), 86);
    for (i, post) in result.items.iter().enumerate() {
        assert_eq!(post.number, i as u64 + u64::from((page - 1) * limit));
    }
    assert_eq!(result.meta.total, 125);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 7);
}

#[tokio::test]
async fn test_parallel_fetch_matches_sequential() {
    let server = MockServer::start().await;
    mount(&server, PaginatedApi::new(301)).await;

    let executor = Arc::new(JsonPageExecutor::<Post>::new(
        client(&server),
        Method::POST,
        "/posts/search",
    ));

    let parallel = fetch_all_pages(PostSearch::new(1, 20, 4), Arc::clone(&executor))
        .await
        .unwrap();

    let mut sequential = Vec::new();
    for page in 1..=16 {
        let single = fetch_all_pages(PostSearch::new(page, 20, 0), Arc::clone(&executor))
            .await
            .unwrap();
        sequential.extend(single.items);
    }

    assert_eq!(parallel.items, sequential);
    assert_eq!(parallel.items.len(), 301);
}

#[tokio::test]
async fn test_query_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/search"))
        .respond_with(PaginatedApi::new(50))
        .mount(&server)
        .await;

    let executor = Arc::new(
        JsonPageExecutor::<Post>::new(client(&server), Method::GET, "/posts/search")
            .with_transport(FormTransport::Query),
    );

    let result = fetch_all_pages(PostSearch::new(1, 10, 3), executor)
        .await
        .unwrap();

    assert_eq!(
        result.items.iter().map(|p| p.number).collect::<Vec<_>>(),
        (0..50).collect::<Vec<_>>()
    );

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.body.is_empty()));
    assert!(requests
        .iter()
        .all(|r| r.url.query().is_some_and(|q| q.contains("title=Anonymous"))));
}

#[tokio::test]
async fn test_first_page_only_without_parallelism() {
    let server = MockServer::start().await;
    mount(&server, PaginatedApi::new(125)).await;

    let executor = Arc::new(JsonPageExecutor::<Post>::new(
        client(&server),
        Method::POST,
        "/posts/search",
    ));

    let result = fetch_all_pages(PostSearch::new(2, 13, 0), executor)
        .await
        .unwrap();

    assert_eq!(result.items.len(), 13);
    assert_eq!(result.items[0], Post { number: 13 });
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_page_error_envelope_is_returned() {
    let server = MockServer::start().await;
    mount(&server, PaginatedApi::new(125).rejecting(7)).await;

    let executor = Arc::new(JsonPageExecutor::<Post>::new(
        client(&server),
        Method::POST,
        "/posts/search",
    ));

    let err = fetch_all_pages_with(
        PostSearch::new(1, 13, 4),
        executor,
        FetchOptions::new().cancel_on_error(),
    )
    .await
    .unwrap_err();

    match err {
        Error::Api {
            status,
            message,
            code,
            details,
        } => {
            assert_eq!(status, 422);
            assert_eq!(message, "page rejected");
            assert_eq!(code.as_deref(), Some("E_PAGE"));
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].message, "bad page");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_meta_ends_pagination() {
    let server = MockServer::start().await;
    Mock::given(path("/legacy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"number": 1}, {"number": 2}]
        })))
        .mount(&server)
        .await;

    let executor = Arc::new(JsonPageExecutor::<Post>::new(
        client(&server),
        Method::POST,
        "/legacy",
    ));

    let result = fetch_all_pages(PostSearch::new(1, 2, 8), executor)
        .await
        .unwrap();

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.meta.total, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_fetches_share_client() {
    let server = MockServer::start().await;
    mount(&server, PaginatedApi::new(60)).await;

    let executor = Arc::new(JsonPageExecutor::<Post>::new(
        client(&server),
        Method::POST,
        "/posts/search",
    ));

    let calls = (1..=3).map(|_| fetch_all_pages(PostSearch::new(1, 10, 2), Arc::clone(&executor)));
    let results = futures::future::join_all(calls).await;

    for result in results {
        assert_eq!(result.unwrap().items.len(), 60);
    }
}

#[tokio::test]
async fn test_pacing_spreads_parallel_pages() {
    let server = MockServer::start().await;
    mount(&server, PaginatedApi::new(50)).await;

    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .pacing(PacingConfig::new(20, 1))
        .build();
    let client = Arc::new(HttpClient::with_config(config).unwrap());
    let executor = Arc::new(JsonPageExecutor::<Post>::new(
        client,
        Method::POST,
        "/posts/search",
    ));

    let start = Instant::now();
    let result = fetch_all_pages(PostSearch::new(1, 10, 5), executor)
        .await
        .unwrap();

    assert_eq!(result.items.len(), 50);
    // Five requests at 20/s with no burst take at least four intervals
    assert!(start.elapsed() >= Duration::from_millis(150));
}

// ============================================================================
// CLI Tests
// ============================================================================

#[tokio::test]
async fn test_cli_fetch_command() {
    let server = MockServer::start().await;
    mount(&server, PaginatedApi::new(30)).await;

    let url = format!("{}/posts/search", server.uri());
    let cli = Cli::parse_from([
        "pagereq",
        "fetch",
        "--url",
        url.as_str(),
        "--limit",
        "10",
        "--parallel",
        "2",
        "--form",
        r#"{"title": "Anonymous"}"#,
    ]);

    Runner::new(cli).run().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let first: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first["title"], "Anonymous");
}

#[tokio::test]
async fn test_cli_curl_command() {
    let cli = Cli::parse_from([
        "pagereq",
        "curl",
        "--url",
        "http://localhost:8080/posts",
        "-X",
        "POST",
        "-H",
        "X-Trace: 1",
        "--data",
        r#"{"page": 1}"#,
    ]);

    Runner::new(cli).run().await.unwrap();
}

#[tokio::test]
async fn test_cli_rejects_bad_form() {
    let cli = Cli::parse_from([
        "pagereq",
        "fetch",
        "--url",
        "http://localhost:1/x",
        "--form",
        "[1]",
    ]);

    let err = Runner::new(cli).run().await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}
