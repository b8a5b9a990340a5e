mod support;

use reqwest::{header, Client, StatusCode};

use support::{spawn_server, APP_JS, INDEX_HTML};

#[tokio::test]
async fn root_serves_entry_document() {
    let server = spawn_server().await;

    let response = reqwest::get(server.http_url("/")).await.expect("get /");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), INDEX_HTML);
}

#[tokio::test]
async fn other_paths_fall_back_to_static_root() {
    let server = spawn_server().await;

    let response = reqwest::get(server.http_url("/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), APP_JS);

    let missing = reqwest::get(server.http_url("/missing.css")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_cors() {
    let server = spawn_server().await;

    let response = Client::new()
        .get(server.http_url("/health"))
        .header(header::ORIGIN, "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
}
