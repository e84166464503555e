// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, groups, lessons, student, tasks},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * `/api/auth` is public; everything else under `/api` needs a bearer token.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool + config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    let task_routes = Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/{id}", get(tasks::get_task));

    let group_routes = Router::new()
        .route("/", get(groups::list_groups))
        .route("/{id}", get(groups::get_group))
        .route("/{id}/active-lesson", get(groups::get_active_lesson));

    let lesson_routes = Router::new()
        .route("/start", post(lessons::start_lesson))
        .route("/{id}/tasks", get(lessons::get_lesson_tasks))
        .route("/{id}/attend", post(lessons::mark_attendance))
        .route("/{id}/submit", post(lessons::submit_answers))
        .route("/{id}/analytics", get(lessons::get_analytics))
        .route("/{id}/live", get(lessons::get_live))
        .route("/{id}/end", post(lessons::end_lesson));

    let student_routes = Router::new().route("/lessons/history", get(student::lesson_history));

    // `route_layer` only wraps the routes registered before it, so the
    // auth routes nested afterwards stay public.
    let api_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/groups", group_routes)
        .nest("/lessons", lesson_routes)
        .nest("/student", student_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .nest("/auth", auth_routes);

    Router::new()
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
