//! HTTP API module for the greeting, health, and database diagnostic endpoints.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
