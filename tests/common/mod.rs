//! Mock CMS shared by the integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use space_traveling::config::{CmsConfig, SiteConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MASTER_REF: &str = "YGR2TxEAACEAmDkO";

pub fn endpoint(server: &MockServer) -> String {
    format!("{}/api/v2", server.uri())
}

pub fn site_config(server: &MockServer) -> SiteConfig {
    SiteConfig {
        cms: CmsConfig {
            endpoint: endpoint(server),
            access_token: Some("secret-token".to_string()),
            ..CmsConfig::default()
        },
        ..SiteConfig::default()
    }
}

/// URL the CMS hands out for page 2 of the listing
pub fn page_two_url(server: &MockServer) -> String {
    format!(
        "{}/documents/search?ref={}&page=2&pageSize=2",
        endpoint(server),
        MASTER_REF
    )
}

pub fn post_doc(uid: &str, title: &str, published: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "posts",
        "first_publication_date": published,
        "last_publication_date": published,
        "data": {
            "title": title,
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": {
                "url": format!("https://images.prismic.io/spacetraveling/{}.png", uid),
                "alt": null,
                "dimensions": { "width": 1440, "height": 400 }
            },
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        {
                            "type": "paragraph",
                            "text": "Nullam dolor sapien, vulputate eu diam at, condimentum hendrerit tellus.",
                            "spans": [{ "start": 0, "end": 6, "type": "strong" }]
                        }
                    ]
                },
                {
                    "heading": "Cras laoreet mi",
                    "body": [
                        { "type": "list-item", "text": "Lorem ipsum", "spans": [] },
                        { "type": "list-item", "text": "Dolor sit amet", "spans": [] }
                    ]
                }
            ]
        }
    })
}

pub fn search_page(results: Vec<Value>, next_page: Option<String>) -> Value {
    json!({
        "page": 1,
        "results_per_page": 2,
        "results_size": results.len(),
        "total_results_size": 3,
        "total_pages": 2,
        "next_page": next_page,
        "prev_page": null,
        "results": results
    })
}

pub async fn mount_api_root(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "refs": [
                { "id": "preview", "ref": "preview-ref", "label": "Preview", "isMasterRef": false },
                { "id": "master", "ref": MASTER_REF, "label": "Master", "isMasterRef": true }
            ],
            "types": { "posts": "Posts" }
        })))
        .mount(server)
        .await;
}

/// Two posts on page 1, one more behind the cursor
pub async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("q", r#"[[at(document.type, "posts")]]"#))
        .and(query_param("orderings", "[document.first_publication_date desc]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            vec![
                post_doc("p1", "Como utilizar Hooks", "2021-03-25T19:25:28+0000"),
                post_doc("p2", "Criando um app CRA do zero", "2021-03-15T19:27:35+0000"),
            ],
            Some(page_two_url(server)),
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(
            vec![
                // repeated entry from page 1
                post_doc("p2", "Criando um app CRA do zero", "2021-03-15T19:27:35+0000"),
                post_doc("p3", "Mapas com React", "2021-03-01T10:00:00+0000"),
            ],
            None,
        )))
        .mount(server)
        .await;
}

pub async fn mount_post(server: &MockServer, uid: &str, doc: Option<Value>) {
    let results: Vec<Value> = doc.into_iter().collect();
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/search"))
        .and(query_param("q", format!(r#"[[at(my.posts.uid, "{}")]]"#, uid)))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(results, None)))
        .mount(server)
        .await;
}

/// A CMS with the listing and every post of it
pub async fn mock_cms() -> MockServer {
    let server = MockServer::start().await;
    mount_api_root(&server).await;
    mount_listing(&server).await;
    mount_post(
        &server,
        "p1",
        Some(post_doc("p1", "Como utilizar Hooks", "2021-03-25T19:25:28+0000")),
    )
    .await;
    mount_post(
        &server,
        "p2",
        Some(post_doc("p2", "Criando um app CRA do zero", "2021-03-15T19:27:35+0000")),
    )
    .await;
    mount_post(
        &server,
        "p3",
        Some(post_doc("p3", "Mapas com React", "2021-03-01T10:00:00+0000")),
    )
    .await;
    mount_post(&server, "missing", None).await;
    server
}
