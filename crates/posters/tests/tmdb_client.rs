//! Tests for the TMDB poster client against a local mock API.
//!
//! Each test starts an axum server on a random port that imitates one
//! behaviour of the search endpoint.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use posters::{Poster, PosterConfig, PosterFetcher, TmdbPosterClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

const PLACEHOLDER: &str = "http://placeholder.test/none.png";
const IMAGE_BASE: &str = "http://images.test/t/p/w500";

/// Start a mock API on a random port and return its base URL
async fn start_mock_api(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock API");
    let addr = listener.local_addr().expect("Failed to get local address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Mock API failed");
    });

    format!("http://{}", addr)
}

fn client_for(api_url: &str, timeout_secs: u64) -> TmdbPosterClient {
    let config = PosterConfig {
        api_key: Some("test-key".to_string()),
        api_url: api_url.to_string(),
        image_base_url: IMAGE_BASE.to_string(),
        placeholder_url: PLACEHOLDER.to_string(),
        timeout_secs,
    };
    TmdbPosterClient::new(&config).expect("Failed to build client")
}

fn placeholder() -> Poster {
    Poster::Placeholder(PLACEHOLDER.to_string())
}

async fn search_with_poster(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let authorised = params.get("api_key").map(String::as_str) == Some("test-key");
    let query_ok = params.get("query").map(String::as_str) == Some("The Matrix");
    let year_ok = params.get("year").map(String::as_str) == Some("1999");

    if authorised && query_ok && year_ok {
        Json(json!({
            "page": 1,
            "results": [
                { "title": "The Matrix", "poster_path": "/matrix.jpg" },
                { "title": "The Matrix Reloaded", "poster_path": "/reloaded.jpg" }
            ]
        }))
    } else {
        Json(json!({ "results": [] }))
    }
}

#[tokio::test]
async fn test_builds_image_url_from_first_result() {
    let api = start_mock_api(Router::new().route("/search/movie", get(search_with_poster))).await;
    let client = client_for(&api, 5);

    let poster = client.fetch_poster_url("Matrix, The (1999)").await;

    assert_eq!(
        poster,
        Poster::Image(format!("{}/matrix.jpg", IMAGE_BASE))
    );
}

#[tokio::test]
async fn test_no_results_returns_placeholder() {
    let router = Router::new().route(
        "/search/movie",
        get(|| async { Json(json!({ "page": 1, "results": [] })) }),
    );
    let api = start_mock_api(router).await;

    let poster = client_for(&api, 5).fetch_poster_url("Obscure Film (1921)").await;

    assert_eq!(poster, placeholder());
}

#[tokio::test]
async fn test_missing_results_field_returns_placeholder() {
    let router = Router::new().route(
        "/search/movie",
        get(|| async { Json(json!({ "status_message": "nope" })) }),
    );
    let api = start_mock_api(router).await;

    assert_eq!(client_for(&api, 5).fetch_poster_url("Heat (1995)").await, placeholder());
}

#[tokio::test]
async fn test_null_poster_path_returns_placeholder() {
    let router = Router::new().route(
        "/search/movie",
        get(|| async { Json(json!({ "results": [{ "title": "Heat", "poster_path": null }] })) }),
    );
    let api = start_mock_api(router).await;

    assert_eq!(client_for(&api, 5).fetch_poster_url("Heat (1995)").await, placeholder());
}

#[tokio::test]
async fn test_error_status_returns_placeholder() {
    let router = Router::new().route(
        "/search/movie",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "status_code": 7 }))) }),
    );
    let api = start_mock_api(router).await;

    let client = client_for(&api, 5);
    assert!(client.lookup("Heat (1995)").await.is_err());
    assert_eq!(client.fetch_poster_url("Heat (1995)").await, placeholder());
}

#[tokio::test]
async fn test_malformed_json_returns_placeholder() {
    let router = Router::new().route("/search/movie", get(|| async { "<html>not json</html>" }));
    let api = start_mock_api(router).await;

    let client = client_for(&api, 5);
    assert!(matches!(
        client.lookup("Heat (1995)").await,
        Err(posters::PosterError::MalformedResponse(_))
    ));
    assert_eq!(client.fetch_poster_url("Heat (1995)").await, placeholder());
}

#[tokio::test]
async fn test_timeout_returns_placeholder_within_bound() {
    let router = Router::new().route(
        "/search/movie",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(json!({ "results": [{ "poster_path": "/late.jpg" }] }))
        }),
    );
    let api = start_mock_api(router).await;
    let client = client_for(&api, 1);

    let start = Instant::now();
    let poster = client.fetch_poster_url("Slow Movie (2000)").await;
    let elapsed = start.elapsed();

    assert_eq!(poster, placeholder());
    assert!(
        elapsed < client.timeout() + Duration::from_secs(2),
        "lookup took {:?}",
        elapsed
    );
    assert!(matches!(
        client.lookup("Slow Movie (2000)").await,
        Err(posters::PosterError::Timeout)
    ));
}

#[tokio::test]
async fn test_unreachable_service_returns_placeholder() {
    // Bind then drop a listener so the port is known to be closed
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr), 2);
    assert_eq!(client.fetch_poster_url("Heat (1995)").await, placeholder());
}

#[tokio::test]
async fn test_empty_title_never_calls_out() {
    let client = client_for("http://127.0.0.1:9", 1);
    assert!(matches!(
        client.lookup("   ").await,
        Err(posters::PosterError::EmptyTitle)
    ));
    assert_eq!(client.fetch_poster_url("").await, placeholder());
}
