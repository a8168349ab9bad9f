//! End-to-end tests: generation, pagination and hosting against a mock CMS.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

use space_traveling::cms::CmsClient;
use space_traveling::generator::Generator;
use space_traveling::listing::Listing;
use space_traveling::server::{router, ServerState};
use space_traveling::SpaceTraveling;

use common::*;

fn site(dir: &TempDir, server: &MockServer) -> SpaceTraveling {
    SpaceTraveling::with_config(dir.path(), site_config(server))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Poll `uri` until the background render lands
async fn get_eventually(app: &Router, uri: &str, done: impl Fn(StatusCode, &str) -> bool) -> (StatusCode, String) {
    for _ in 0..100 {
        let (status, body) = get(app, uri).await;
        if done(status, &body) {
            return (status, body);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} never finished rendering", uri);
}

#[tokio::test]
async fn test_generate_writes_listing_and_posts() {
    let server = mock_cms().await;
    let dir = TempDir::new().unwrap();
    let site = site(&dir, &server);

    let summary = site.generate().await.unwrap();
    assert_eq!(summary.written, 3);
    assert_eq!(summary.pages.len(), 3);

    let public = dir.path().join("public");
    let index = std::fs::read_to_string(public.join("index.html")).unwrap();
    assert!(index.contains("Como utilizar Hooks"));
    assert!(index.contains("Criando um app CRA do zero"));
    assert!(!index.contains("Mapas com React"));
    assert!(index.contains("25 mar 2021"));
    assert!(index.contains(r#"id="load-more""#));

    let post = std::fs::read_to_string(public.join("post/p1/index.html")).unwrap();
    assert!(post.contains("<strong>Nullam</strong> dolor sapien"));
    assert!(post.contains("<ul><li>Lorem ipsum</li><li>Dolor sit amet</li></ul>"));
    assert!(post.contains("1 min"));
    assert!(post.contains("Proin et varius"));

    assert!(public.join("post/p2/index.html").exists());
    assert!(!public.join("post/p3").exists());
    assert!(public.join("style.css").exists());
    assert!(public.join("logo.svg").exists());
}

#[tokio::test]
async fn test_regenerate_skips_unchanged_and_removes_dropped_posts() {
    let server = mock_cms().await;
    let dir = TempDir::new().unwrap();
    let site = site(&dir, &server);

    site.generate().await.unwrap();
    let again = site.generate().await.unwrap();
    assert_eq!(again.written, 0);
    assert_eq!(again.unchanged, 3);

    // p2 leaves the first page
    server.reset().await;
    mount_api_root(&server).await;
    wiremock::Mock::given(wiremock::matchers::path("/api/v2/documents/search"))
        .and(wiremock::matchers::query_param(
            "q",
            r#"[[at(document.type, "posts")]]"#,
        ))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(search_page(
            vec![post_doc("p1", "Como utilizar Hooks", "2021-03-25T19:25:28+0000")],
            None,
        )))
        .mount(&server)
        .await;
    mount_post(
        &server,
        "p1",
        Some(post_doc("p1", "Como utilizar Hooks", "2021-03-25T19:25:28+0000")),
    )
    .await;

    let third = site.generate().await.unwrap();
    assert_eq!(third.removed, 1);
    assert!(!dir.path().join("public/post/p2").exists());
    assert!(dir.path().join("public/post/p1/index.html").exists());

    site.clean().unwrap();
    assert!(!dir.path().join("public").exists());
}

#[tokio::test]
async fn test_listing_appends_next_page_without_duplicates() {
    let server = mock_cms().await;
    let client = CmsClient::new(&site_config(&server).cms).unwrap();

    let mut listing = Listing::new(client.first_page().await.unwrap());
    assert!(listing.has_more());

    let added = listing.load_more(&client).await.unwrap();
    assert_eq!(added, 1);

    let uids: Vec<&str> = listing.posts().iter().map(|p| p.uid.as_str()).collect();
    assert_eq!(uids, ["p1", "p2", "p3"]);
    assert!(!listing.has_more());

    // exhausted listings do not fetch again
    assert_eq!(listing.load_more(&client).await.unwrap(), 0);
}

#[tokio::test]
async fn test_server_renders_post_on_first_request() {
    let server = mock_cms().await;
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(&site(&dir, &server)).unwrap();
    let app = router(Arc::new(ServerState::new(generator)));

    let (status, body) = get(&app, "/post/p3").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Carregando..."));

    let (status, body) = get_eventually(&app, "/post/p3", |_, body| body.contains("Mapas com React")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Joseph Oliveira"));
    assert!(!body.contains("Carregando..."));
}

#[tokio::test]
async fn test_server_unknown_post_is_not_found() {
    let server = mock_cms().await;
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(&site(&dir, &server)).unwrap();
    let app = router(Arc::new(ServerState::new(generator)));

    let (_, body) =
        get_eventually(&app, "/post/missing", |status, _| status == StatusCode::NOT_FOUND).await;
    assert!(body.contains("Post não encontrado"));
}

#[tokio::test]
async fn test_server_index_and_load_more() {
    let server = mock_cms().await;
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(&site(&dir, &server)).unwrap();
    let app = router(Arc::new(ServerState::new(generator)));

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Como utilizar Hooks"));

    let cursor: String = url::form_urlencoded::byte_serialize(page_two_url(&server).as_bytes()).collect();
    let (status, body) = get(&app, &format!("/posts/more?cursor={}", cursor)).await;
    assert_eq!(status, StatusCode::OK);

    let more: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(more["html"].as_str().unwrap().contains("Mapas com React"));
    assert!(more["next_page"].is_null());
}

/// uids carried by the `data-uid` attributes of a rendered listing
fn listed_uids(html: &str) -> Vec<String> {
    html.split(r#"data-uid=""#)
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_load_more_skips_posts_already_listed() {
    let server = mock_cms().await;
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(&site(&dir, &server)).unwrap();
    let app = router(Arc::new(ServerState::new(generator)));

    let (_, index) = get(&app, "/").await;
    let shown = listed_uids(&index);
    assert_eq!(shown, ["p1", "p2"]);

    // page 2 repeats p2
    let cursor: String = url::form_urlencoded::byte_serialize(page_two_url(&server).as_bytes()).collect();
    let (status, body) = get(
        &app,
        &format!("/posts/more?cursor={}&shown={}", cursor, shown.join(",")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let more: serde_json::Value = serde_json::from_str(&body).unwrap();
    let fragment = more["html"].as_str().unwrap();
    assert_eq!(listed_uids(fragment), ["p3"]);
    assert!(!fragment.contains("Criando um app CRA do zero"));
}

#[tokio::test]
async fn test_server_serves_generated_assets() {
    let server = mock_cms().await;
    let dir = TempDir::new().unwrap();
    let site = site(&dir, &server);
    let summary = site.generate().await.unwrap();

    let state = Arc::new(ServerState::new(Generator::new(&site).unwrap()));
    state.seed(summary.pages).await;
    let app = router(state);

    let (status, body) = get(&app, "/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.is_empty());

    let (status, body) = get(&app, "/post/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Como utilizar Hooks"));
}
