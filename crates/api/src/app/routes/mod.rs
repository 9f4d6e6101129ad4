use axum::Router;

pub mod automation;
pub mod caps;
pub mod leads;
pub mod orders;
pub mod system;

/// Router for every engine endpoint (everything except `/health`).
pub fn router() -> Router {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/leads", leads::router())
        .nest("/caps", caps::router())
        .nest("/automation", automation::router())
}
