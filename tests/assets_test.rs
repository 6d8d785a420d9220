//! Integration tests for the asset proxy.

mod common;

use common::{TestHarness, ORIGIN_KEY};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn forwards_body_type_and_query() {
    let h = TestHarness::start().await;
    Mock::given(method("GET"))
        .and(path("/scene/5/vtt/sprite"))
        .and(query_param("t", "17"))
        .and(header("ApiKey", ORIGIN_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/webp")
                .set_body_bytes(b"sprite-bytes".to_vec()),
        )
        .expect(1)
        .mount(&h.origin)
        .await;

    let resp = h
        .client
        .get(h.url("/assets/scene/5/vtt/sprite?t=17"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/webp");
    assert_eq!(resp.headers()["cache-control"], "public, max-age=3600");
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"sprite-bytes");
}

#[tokio::test]
async fn missing_content_type_defaults_to_jpeg() {
    let h = TestHarness::start().await;
    Mock::given(method("GET"))
        .and(path("/scene/5/sprite.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&h.origin)
        .await;

    let resp = h
        .client
        .get(h.url("/assets/scene/5/sprite.jpg"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/jpeg");
    assert_eq!(resp.headers()["content-length"], "3");
}

#[tokio::test]
async fn origin_status_is_mirrored() {
    let h = TestHarness::start().await;
    Mock::given(method("GET"))
        .and(path("/scene/5/forbidden.vtt"))
        .respond_with(ResponseTemplate::new(403).set_body_string("origin says no"))
        .mount(&h.origin)
        .await;

    let resp = h
        .client
        .get(h.url("/assets/scene/5/forbidden.vtt"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 403);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert!(resp.bytes().await.unwrap().is_empty());
}
