#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]
#![allow(missing_docs)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cinelist_api::catalog::{CatalogClient, Category};
use cinelist_loader::{CategoryLoader, LoadPhase, LoadMoreTrigger, RetryPolicy};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_1: &str = include_str!("../../../fixtures/catalog/popular_page_1.json");
const PAGE_2: &str = include_str!("../../../fixtures/catalog/popular_page_2.json");

fn client_for(server: &MockServer) -> Arc<CatalogClient> {
    let base_url = format!("{}/3/", server.uri());
    let client = CatalogClient::builder()
        .base_url(base_url.parse().unwrap())
        .api_key("test-key")
        .user_agent("test/0.0.0")
        .build()
        .unwrap();
    Arc::new(client)
}

/// Reads an HTTP request head from `stream`.
fn read_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0_u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

/// Serves two connections: the first closes halfway through the body,
/// the second answers with `body` in full.
fn drop_then_serve(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut first, _) = listener.accept().unwrap();
        read_head(&mut first);
        let _ = first.write_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 1000\r\n\r\n{\"page\":1,",
        );
        drop(first);

        let (mut second, _) = listener.accept().unwrap();
        read_head(&mut second);
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = second.write_all(reply.as_bytes());
    });
    addr
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::with_time_unit(3, Duration::from_millis(10))
}

fn ids(loader: &CategoryLoader) -> Vec<u64> {
    loader.snapshot().items.iter().map(|m| m.id).collect()
}

#[tokio::test]
async fn test_scroll_to_end_loads_next_page() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_1))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_2))
        .expect(1)
        .mount(&server)
        .await;
    let loader = CategoryLoader::spawn(client_for(&server), Category::Popular, fast_policy());
    let mut trigger = LoadMoreTrigger::new();
    loader.load_initial().await.unwrap();
    let first = loader.wait_until_settled().await.unwrap();

    // Act
    let last_id = first.items.last().unwrap().id;
    let mut fired = 0;
    for _ in 0..3 {
        if trigger.on_item_visible(last_id, &first.items) && loader.load_more().await.unwrap() {
            fired += 1;
        }
    }
    let settled = loader.wait_until_settled().await.unwrap();

    // Assert
    assert_eq!(fired, 1);
    assert_eq!(ids(&loader), vec![550, 680, 13]);
    assert_eq!(settled.current_page, 2);
    assert_eq!(settled.total_pages, 5);
    assert_eq!(settled.phase, LoadPhase::Success);
}

#[tokio::test]
async fn test_rate_limit_surfaces_without_retry() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/top_rated"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    let loader = CategoryLoader::spawn(client_for(&server), Category::TopRated, fast_policy());

    // Act
    loader.load_initial().await.unwrap();
    let settled = loader.wait_until_settled().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Assert
    assert!(settled.has_error);
    assert!(!settled.is_retrying);
    assert_eq!(
        settled.error_message.as_deref(),
        Some("Request limit exceeded. Try again later.")
    );
}

#[tokio::test]
async fn test_truncated_bodies_are_retried_until_success() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/now_playing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"page": 1, "results": ["#))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/movie/now_playing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_1))
        .expect(1)
        .mount(&server)
        .await;
    let loader = CategoryLoader::spawn(client_for(&server), Category::NowPlaying, fast_policy());

    // Act
    loader.load_initial().await.unwrap();
    let settled = loader.wait_until_settled().await.unwrap();

    // Assert
    assert!(!settled.has_error);
    assert_eq!(settled.retry_count, 0);
    assert_eq!(ids(&loader), vec![550, 680]);
}

#[tokio::test]
async fn test_invalid_credentials_then_retry_succeeds() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/upcoming"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/movie/upcoming"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_1))
        .mount(&server)
        .await;
    let loader = CategoryLoader::spawn(client_for(&server), Category::Upcoming, fast_policy());
    loader.load_initial().await.unwrap();
    let failed = loader.wait_until_settled().await.unwrap();

    // Act
    let started = loader.retry().await.unwrap();
    let settled = loader.wait_until_settled().await.unwrap();

    // Assert
    assert_eq!(
        failed.error_message.as_deref(),
        Some("Invalid API key. Check your configuration.")
    );
    assert!(started);
    assert!(!settled.has_error);
    assert_eq!(settled.items.len(), 2);
}

#[tokio::test]
async fn test_dropped_connection_waits_two_units_then_recovers() {
    // Arrange
    let addr = drop_then_serve(PAGE_1);
    let client = CatalogClient::builder()
        .base_url(format!("http://{addr}/3/").parse().unwrap())
        .api_key("test-key")
        .user_agent("test/0.0.0")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let policy = RetryPolicy::with_time_unit(3, Duration::from_millis(100));
    let loader = CategoryLoader::spawn(Arc::new(client), Category::Popular, policy);
    let mut rx = loader.subscribe();
    let start = Instant::now();

    // Act
    loader.load_initial().await.unwrap();
    rx.wait_for(|s| s.is_retrying && !s.is_loading).await.unwrap();
    let settled = loader.wait_until_settled().await.unwrap();

    // Assert
    assert!(start.elapsed() >= Duration::from_millis(200));
    assert!(!settled.has_error);
    assert_eq!(settled.retry_count, 0);
    assert_eq!(ids(&loader), vec![550, 680]);
}
