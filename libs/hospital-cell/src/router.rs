use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn hospital_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_hospitals).post(handlers::add_hospital))
        .route("/assignments", get(handlers::list_assignments))
        .route(
            "/assignments/{user_id}",
            get(handlers::get_assignment)
                .put(handlers::set_assignment)
                .delete(handlers::delete_assignment),
        )
        .route(
            "/{hospital_id}",
            get(handlers::get_hospital)
                .put(handlers::set_hospital)
                .delete(handlers::delete_hospital),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn department_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_departments).post(handlers::add_department))
        .route(
            "/{department_id}",
            get(handlers::get_department)
                .put(handlers::set_department)
                .delete(handlers::delete_department),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
