//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which starts a `wiremock` origin and the gateway
//! router on a random port, pointed at that origin with a known credential.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;

use image::{ImageFormat, Rgb, RgbImage};
use vg_core::config::Config;
use vg_server::context::AppContext;
use vg_server::router::build_router;
use wiremock::MockServer;

/// Credential the gateway attaches to every origin request in tests.
pub const ORIGIN_KEY: &str = "origin-test-key";

/// Client token accepted when auth is enabled in tests.
pub const CLIENT_TOKEN: &str = "client-test-token";

/// A mock origin plus a running gateway pointed at it.
pub struct TestHarness {
    pub origin: MockServer,
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestHarness {
    /// Start a mock origin and a gateway with default configuration.
    pub async fn start() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start a mock origin and a gateway with auth enabled.
    pub async fn with_auth() -> Self {
        Self::with_config(|config| {
            config.auth.enabled = true;
            config.auth.tokens = vec![CLIENT_TOKEN.to_string()];
        })
        .await
    }

    /// Start a mock origin and a gateway, letting the caller adjust config.
    pub async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let origin = MockServer::start().await;

        let mut config = Config::default();
        config.origin.url = origin.uri();
        config.origin.api_key = ORIGIN_KEY.to_string();
        customize(&mut config);

        let addr = spawn_gateway(config).await;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build test client");

        Self {
            origin,
            addr,
            client,
        }
    }

    /// Absolute gateway URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the gateway router on a random port and return the bound address.
pub async fn spawn_gateway(config: Config) -> SocketAddr {
    let ctx = AppContext::new(config, None).expect("failed to build context");
    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let addr = listener.local_addr().expect("failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    addr
}

/// Encode a solid-colour PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("failed to encode test png");
    buf.into_inner()
}

/// Decode a JPEG body and return its size.
pub fn jpeg_size(bytes: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .expect("response is not a JPEG");
    (img.width(), img.height())
}
