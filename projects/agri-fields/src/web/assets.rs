use axum::Router;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

/// Mounts the image result directories under `static_root`, and the built
/// dashboard (with `index.html` fallback for client-side routes) when
/// `client_dist` is set.
pub fn with_static_assets(
    router: Router,
    static_root: &Path,
    client_dist: Option<&Path>,
) -> Router {
    let router = router
        .nest_service(
            "/detect_results",
            ServeDir::new(static_root.join("detect_results")),
        )
        .nest_service("/crop_imgs", ServeDir::new(static_root.join("crop_imgs")));

    match client_dist {
        Some(dist) => {
            info!("Serving dashboard from {}", dist.display());
            let index = ServeFile::new(dist.join("index.html"));
            router.fallback_service(ServeDir::new(dist).fallback(index))
        }
        None => router,
    }
}
