//! tagnotes HTTP API.
//!
//! Every route is served at the root and again under `/api`, the base path
//! the web frontend uses.

mod error;
mod routes;

use axum::routing::{get, MethodRouter};
use axum::Router;
use tagnotes_sqlite::SqliteStore;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, INTERNAL_ERROR, ROUTE_NOT_FOUND};

/// Shared state handed to every handler. Holds no note data, only the means
/// to open a session.
#[derive(Clone)]
pub struct AppState {
    pub store: SqliteStore,
}

/// Build the complete application: routes, fallbacks and middleware.
pub fn router(store: SqliteStore) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/", with_405(get(routes::index)))
        .merge(note_routes())
        .nest("/api", note_routes())
        .fallback(routes::route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/health", with_405(get(routes::health)))
        .route(
            "/notes",
            with_405(get(routes::list_notes).post(routes::create_note)),
        )
        .route(
            "/notes/:id",
            with_405(
                get(routes::get_note)
                    .put(routes::update_note)
                    .delete(routes::delete_note),
            ),
        )
        .route("/notes/tag/:tag", with_405(get(routes::search_by_tag)))
}

fn with_405(method_router: MethodRouter<AppState>) -> MethodRouter<AppState> {
    method_router.fallback(routes::method_not_allowed)
}
