mod common;

use axum::http::{Method, StatusCode};

use common::app::{spawn_test_app_behind_proxy, spawn_test_app_with_limit};
use common::http::{assert_json_error, get_from_peer, request, response_json};

const TIME_IMPACT: &str = "/api/visibility/time-impact?hour=12";

#[tokio::test]
async fn it_rate_limit_triggers_429_with_headers() {
    let app = spawn_test_app_with_limit(3).await;

    let mut final_status = StatusCode::OK;
    let mut final_headers = axum::http::HeaderMap::new();
    let mut final_body = serde_json::Value::Null;

    for _ in 0..4 {
        let response = request(&app.app, Method::GET, TIME_IMPACT, None, &[]).await;
        let (status, headers, body) = response_json(response).await;
        final_status = status;
        final_headers = headers;
        final_body = body;
    }

    assert_eq!(final_status, StatusCode::TOO_MANY_REQUESTS);
    assert_json_error(&final_body, "RATE_LIMITED");
    assert!(final_headers.get("retry-after").is_some());
    assert_eq!(final_headers.get("ratelimit-limit").unwrap(), "3");
    assert_eq!(final_headers.get("ratelimit-remaining").unwrap(), "0");
    assert!(final_headers.get("ratelimit-reset").is_some());
}

#[tokio::test]
async fn it_rate_limit_remaining_counts_down() {
    let app = spawn_test_app_with_limit(5).await;

    let first = request(&app.app, Method::GET, TIME_IMPACT, None, &[]).await;
    assert_eq!(first.headers().get("ratelimit-remaining").unwrap(), "4");
    let second = request(&app.app, Method::GET, TIME_IMPACT, None, &[]).await;
    assert_eq!(second.headers().get("ratelimit-remaining").unwrap(), "3");
}

#[tokio::test]
async fn it_forwarded_clients_get_separate_windows_behind_proxy() {
    let app = spawn_test_app_behind_proxy(1).await;

    let a = [("x-forwarded-for", "10.0.0.1".to_string())];
    let b = [("x-forwarded-for", "10.0.0.2, 172.16.0.1".to_string())];

    assert_eq!(request(&app.app, Method::GET, TIME_IMPACT, None, &a).await.status(), StatusCode::OK);
    assert_eq!(request(&app.app, Method::GET, TIME_IMPACT, None, &b).await.status(), StatusCode::OK);
    assert_eq!(
        request(&app.app, Method::GET, TIME_IMPACT, None, &a).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn it_forwarded_header_ignored_without_trusted_proxy() {
    let app = spawn_test_app_with_limit(1).await;

    let a = [("x-forwarded-for", "10.0.0.1".to_string())];
    let b = [("x-forwarded-for", "10.0.0.2".to_string())];

    assert_eq!(request(&app.app, Method::GET, TIME_IMPACT, None, &a).await.status(), StatusCode::OK);
    assert_eq!(
        request(&app.app, Method::GET, TIME_IMPACT, None, &b).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn it_rotating_real_ip_without_trusted_proxy_is_still_limited() {
    let app = spawn_test_app_with_limit(1).await;

    let mut statuses = Vec::new();
    for i in 0..5 {
        let headers = [("x-real-ip", format!("10.9.9.{i}"))];
        let resp = request(&app.app, Method::GET, TIME_IMPACT, None, &headers).await;
        statuses.push(resp.status());
    }

    assert_eq!(statuses[0], StatusCode::OK);
    assert!(statuses[1..]
        .iter()
        .all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn it_direct_clients_are_bucketed_by_socket_address() {
    let app = spawn_test_app_with_limit(1).await;

    let noisy: std::net::SocketAddr = "192.0.2.1:40000".parse().unwrap();
    let quiet: std::net::SocketAddr = "192.0.2.2:40001".parse().unwrap();
    let spoof = [("x-real-ip", "192.0.2.2".to_string())];

    assert_eq!(get_from_peer(&app.app, TIME_IMPACT, noisy, &[]).await.status(), StatusCode::OK);
    assert_eq!(
        get_from_peer(&app.app, TIME_IMPACT, noisy, &spoof).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(get_from_peer(&app.app, TIME_IMPACT, quiet, &[]).await.status(), StatusCode::OK);
}
