//! Axum router construction.
//!
//! Builds the full gateway router with all routes and middleware layers.

use axum::middleware;
use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes::{self, assets, health, images, media, metrics};

/// Build the complete application router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // Stream and preview accept any method and classify it themselves.
    let media_routes = Router::new()
        .route("/media/{id}/stream", any(media::stream_media))
        .route("/media/{id}/preview", any(media::preview_media))
        // HEAD is served by the GET handler.
        .route(
            "/media/{id}/download",
            get(media::download_media)
                .post(media::download_media)
                .put(media::download_media),
        );

    let image_routes = Router::new()
        .route("/media/{id}/poster", get(images::scene_poster))
        .route("/actors/{id}/image", get(images::actor_image))
        .route("/studios/{id}/image", get(images::studio_image));

    Router::new()
        .merge(media_routes)
        .merge(image_routes)
        .route("/assets/{*path}", get(assets::proxy_asset))
        .route("/health", get(health::liveness))
        .route("/api/health", get(health::origin_health))
        .route("/metrics", get(metrics::metrics_handler))
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::not_found)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}
