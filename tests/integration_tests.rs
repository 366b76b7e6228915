//! Integration tests using mock HTTP server
//!
//! Tests the full flow: engine → randomuser API over HTTP → local cache → notifications

use randomuser::engine::{ChannelNotifier, LoadOutcome, PaginationEngine, ViewEvent};
use randomuser::http::HttpClientConfig;
use randomuser::scheduler::ManualScheduler;
use randomuser::source::RandomUserApi;
use randomuser::store::{DuckDbUserStore, LocalUserStore, MemoryUserStore};
use randomuser::types::BackoffType;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Deterministic page of users for the query of `request`
fn page_response(request: &Request) -> ResponseTemplate {
    let query = |key: &str| {
        request
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    };
    let page: usize = query("page").parse().unwrap_or(1);
    let results: usize = query("results").parse().unwrap_or(10);
    let seed = query("seed");

    let users: Vec<_> = (0..results)
        .map(|i| {
            let index = (page - 1) * results + i;
            json!({
                "gender": if index % 2 == 0 { "female" } else { "male" },
                "name": {"title": "Ms", "first": format!("Person{index}"), "last": "Doe"},
                "location": {
                    "street": {"number": index, "name": "Elm Street"},
                    "city": "Springwood",
                    "state": "Ohio",
                    "country": "United States",
                    "postcode": 44100 + index,
                    "coordinates": {"latitude": "41.1", "longitude": "-81.5"},
                    "timezone": {"offset": "-5:00", "description": "Eastern Time"}
                },
                "email": format!("person{index}@example.com"),
                "login": {"uuid": format!("{seed}-{index}")},
                "phone": "(330) 555-0100",
                "cell": "(330) 555-0199",
                "picture": {
                    "large": format!("https://randomuser.me/api/portraits/women/{index}.jpg"),
                    "medium": format!("https://randomuser.me/api/portraits/med/women/{index}.jpg"),
                    "thumbnail": format!("https://randomuser.me/api/portraits/thumb/women/{index}.jpg")
                }
            })
        })
        .collect();

    ResponseTemplate::new(200).set_body_json(json!({
        "results": users,
        "info": {"seed": seed, "results": results, "page": page, "version": "1.3"}
    }))
}

async fn mock_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.3/"))
        .respond_with(page_response)
        .mount(&server)
        .await;
    server
}

fn api(server: &MockServer, max_retries: u32) -> Arc<RandomUserApi> {
    let config = HttpClientConfig::builder()
        .max_retries(max_retries)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(10),
        )
        .no_rate_limit()
        .build();
    Arc::new(RandomUserApi::new(&format!("{}/api/1.3/", server.uri()), config).unwrap())
}

/// Complete every queued data token, returning the events seen
fn drain(events: &mut UnboundedReceiver<ViewEvent>) -> Vec<String> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(match event {
            ViewEvent::DataAvailable(ready) => {
                ready.done();
                "data".to_string()
            }
            ViewEvent::RefreshStarting => "refresh".to_string(),
            ViewEvent::PagingEnded => "paged".to_string(),
            ViewEvent::Error(message) => format!("error: {message}"),
        });
    }
    seen
}

// ============================================================================
// End-to-end Paging
// ============================================================================

#[tokio::test]
async fn test_cache_bootstrap_then_paging_then_offline_restart() {
    let server = mock_api().await;
    let store = Arc::new(DuckDbUserStore::in_memory().unwrap());

    let engine = PaginationEngine::builder()
        .source(api(&server, 0))
        .store(store.clone())
        .seed("integration")
        .build()
        .unwrap();
    let (notifier, mut events) = ChannelNotifier::new();
    engine.inject(&notifier);

    assert_eq!(engine.load_cached().await, LoadOutcome::Loaded { received: 10 });
    assert_eq!(drain(&mut events), vec!["data"]);
    assert_eq!(engine.load_more().await, LoadOutcome::Loaded { received: 10 });
    assert_eq!(drain(&mut events), vec!["paged"]);

    assert_eq!(engine.len(), 20);
    assert_eq!(engine.next_page(), 3);
    assert_eq!(engine.current_max_users(), 30);
    assert_eq!(engine.number_of_distinct_named_people(), 20);
    assert_eq!(engine.records()[12].id, "integration-12");
    assert_eq!(engine.records()[12].location.postcode, "44112");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let query = requests[1].url.query().unwrap_or_default().to_string();
    assert!(query.contains("page=2"));
    assert!(query.contains("results=10"));
    assert!(query.contains("seed=integration"));

    // a second session on the same cache never touches the network
    let restarted = PaginationEngine::builder()
        .source(api(&server, 0))
        .store(store.clone())
        .build()
        .unwrap();
    assert_eq!(restarted.load_cached().await, LoadOutcome::Loaded { received: 20 });
    assert_eq!(restarted.records(), engine.records());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_refresh_reloads_with_new_seed() {
    let server = mock_api().await;
    let store = Arc::new(MemoryUserStore::new());
    let scheduler = Arc::new(ManualScheduler::new());

    let engine = PaginationEngine::builder()
        .source(api(&server, 0))
        .store(store.clone())
        .scheduler(scheduler.clone())
        .seed("before")
        .build()
        .unwrap();
    let (notifier, mut events) = ChannelNotifier::new();
    engine.inject(&notifier);

    assert_eq!(engine.load_initial().await, LoadOutcome::Loaded { received: 10 });
    assert_eq!(drain(&mut events), vec!["data"]);
    assert_eq!(engine.load_more().await, LoadOutcome::Loaded { received: 10 });
    assert_eq!(drain(&mut events), vec!["paged"]);
    assert_eq!(store.len().await, 20);

    engine.refresh(Duration::from_millis(250)).await;
    engine.refresh(Duration::from_millis(250)).await;
    assert_eq!(drain(&mut events), vec!["refresh", "refresh"]);
    assert!(engine.is_empty());
    assert!(store.is_empty().await);

    assert_eq!(scheduler.advance(Duration::from_millis(250)).await, 2);
    assert_eq!(drain(&mut events), vec!["data"]);

    let seed = engine.seed();
    assert_ne!(seed, "before");
    assert_eq!(engine.len(), 10);
    assert_eq!(engine.records()[0].id, format!("{seed}-0"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let query = requests[2].url.query().unwrap_or_default().to_string();
    assert!(query.contains("page=1"));
    assert!(query.contains(&format!("seed={seed}")));
}

// ============================================================================
// Failure Paths
// ============================================================================

#[tokio::test]
async fn test_api_error_body_reaches_view() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.3/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error": "Uh oh, something has gone wrong."})),
        )
        .mount(&server)
        .await;

    let engine = PaginationEngine::builder()
        .source(api(&server, 0))
        .store(Arc::new(MemoryUserStore::new()))
        .build()
        .unwrap();
    let (notifier, mut events) = ChannelNotifier::new();
    engine.inject(&notifier);

    let outcome = engine.load_initial().await;

    assert!(matches!(outcome, LoadOutcome::Failed { .. }));
    assert_eq!(
        drain(&mut events),
        vec!["error: API error: Uh oh, something has gone wrong."]
    );
    assert!(!engine.is_fetch_in_progress());
    assert!(engine.is_empty());
}

#[tokio::test]
async fn test_transient_server_error_is_retried_by_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.3/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1.3/"))
        .and(query_param("page", "1"))
        .respond_with(page_response)
        .mount(&server)
        .await;

    let engine = PaginationEngine::builder()
        .source(api(&server, 2))
        .store(Arc::new(MemoryUserStore::new()))
        .build()
        .unwrap();

    assert_eq!(engine.load_initial().await, LoadOutcome::Loaded { received: 10 });
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(engine.stats().pages_fetched, 1);
}

#[tokio::test]
async fn test_persist_failure_does_not_roll_back() {
    let server = mock_api().await;
    let dir = tempfile::tempdir().unwrap();
    // a directory where the cache file should be makes every write fail
    let blocked = dir.path().join("cache.json");
    std::fs::create_dir_all(blocked.join("occupied")).unwrap();
    let store = Arc::new(randomuser::store::JsonFileUserStore::new(&blocked));

    let engine = PaginationEngine::builder()
        .source(api(&server, 0))
        .store(store.clone())
        .build()
        .unwrap();
    let (notifier, mut events) = ChannelNotifier::new();
    engine.inject(&notifier);

    engine.load_initial().await;
    drain(&mut events);
    assert!(engine.load_more().await.is_loaded());

    let seen = drain(&mut events);
    assert_eq!(seen[0], "paged");
    assert!(seen[1].starts_with("error: Store error"));
    assert_eq!(engine.len(), 20);
    assert!(store.read_all().await.is_err());
}
