use crate::cli::Args;
use crate::field::export::CoordinateExporter;
use crate::field::store::FileFieldStore;
use crate::web::api::{
    create_field_handler, delete_field_handler, get_field_handler, list_fields_handler,
    update_manipal_handler, AppState,
};
use crate::web::assets::with_static_assets;
use crate::web::middleware::build_cors_layer;
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Field API routes only, without static assets or middleware
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/fields",
            get(list_fields_handler).post(create_field_handler),
        )
        .route(
            "/api/fields/:id",
            get(get_field_handler).delete(delete_field_handler),
        )
        .route("/api/update-manipal", post(update_manipal_handler))
        .with_state(state)
}

pub fn build_app(args: &Args) -> Router {
    let store = FileFieldStore::new(&args.fields_dir);
    let exporter = CoordinateExporter::new(&args.export_path);
    info!(
        "Field records in {}, coordinate exports to {}",
        store.dir().display(),
        exporter.output_path().display()
    );
    let state = Arc::new(AppState {
        store: Arc::new(store),
        exporter,
    });

    with_static_assets(
        api_router(state),
        &args.static_root,
        args.client_dist.as_deref(),
    )
    .layer(build_cors_layer(&args.cors_origins))
    .layer(TraceLayer::new_for_http())
}

pub async fn run_server(args: Args) -> Result<()> {
    let mut current_port = args.port;
    let listener = loop {
        let addr = SocketAddr::new(args.host, current_port);
        match TcpListener::bind(addr) {
            Ok(listener) => {
                listener.set_nonblocking(true)?;
                info!("Successfully bound to {}", addr);
                break listener;
            }
            Err(e) => {
                warn!("Failed to bind to {}: {}. Trying next port...", addr, e);
                current_port = current_port
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("No available ports found"))?;
            }
        }
    };

    let app = build_app(&args);

    let tokio_listener = tokio::net::TcpListener::from_std(listener)?;
    info!(
        "Agri fields server started on http://{:?}",
        tokio_listener.local_addr()?
    );

    axum::serve(tokio_listener, app).await?;

    Ok(())
}
