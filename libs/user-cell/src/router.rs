use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn user_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_users))
        .route("/accounts", post(handlers::create_account))
        .route(
            "/accounts/{uid}",
            put(handlers::update_account).delete(handlers::delete_account),
        )
        .route(
            "/{user_id}",
            get(handlers::get_user)
                .put(handlers::set_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/{user_id}/photo",
            put(handlers::set_user_photo).delete(handlers::delete_user_photo),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
