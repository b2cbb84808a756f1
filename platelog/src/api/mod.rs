pub mod dto;
mod extractors;
pub mod handlers;
pub mod openapi;
mod routes;
mod state;

pub use routes::{create_router, MAX_BODY_BYTES};
pub use state::AppState;
