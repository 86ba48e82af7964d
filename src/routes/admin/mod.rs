pub mod hermes;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/hermes", hermes::router())
}
