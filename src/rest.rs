use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::{auth, handlers, AppState};

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to Expense Tracker API",
        "status": "running",
    }))
}

pub fn router(state: AppState) -> Router {
    // Everything behind the auth layer sees an authenticated User in
    // its request extensions.
    let protected = Router::new()
        .route(
            "/users/me",
            get(handlers::users::me).put(handlers::users::update_me),
        )
        .route("/users/me/statistics", get(handlers::users::statistics))
        .route(
            "/expenses",
            get(handlers::expenses::list).post(handlers::expenses::create),
        )
        .route(
            "/expenses/statistics/summary",
            get(handlers::expenses::summary),
        )
        .route(
            "/expenses/:id",
            get(handlers::expenses::get)
                .put(handlers::expenses::update)
                .delete(handlers::expenses::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .route("/", get(root))
        .route("/users/register", post(handlers::users::register))
        .route("/users/token", post(handlers::users::login))
        .merge(protected)
        .with_state(state)
}
