use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use crate::{blogs, comments, events, handler, users};

/// Build the axum router with every Quill endpoint under `/api/v1`.
pub fn build_router(state: AppState, frontend_url: Option<&str>) -> Router {
    let api = Router::new()
        .route("/health", get(handler::health))
        .route("/events", get(events::subscribe))
        .merge(user_routes())
        .merge(blog_routes())
        .merge(comment_routes());

    Router::new()
        .nest("/api/v1", api)
        .layer(cors(frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(users::register))
        .route("/user/login", post(users::login))
        .route("/user/logout", get(users::logout))
        .route("/user/auth/federated-login", post(users::federated_login))
        .route("/user/profile/update", put(users::update_profile))
        .route("/user/all-users", get(users::all_users))
}

fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/blog/", post(blogs::create))
        .route("/blog/get-all-blogs", get(blogs::all))
        .route("/blog/get-published-blogs", get(blogs::published))
        .route("/blog/get-own-blogs", get(blogs::own))
        .route("/blog/my-blogs/likes", get(blogs::my_likes))
        .route("/blog/my-blogs/dislikes", get(blogs::my_dislikes))
        .route("/blog/delete/:id", delete(blogs::delete))
        .route(
            "/blog/:id",
            put(blogs::update).patch(blogs::toggle_publish),
        )
        .route("/blog/:id/like", get(blogs::like))
        .route("/blog/:id/dislike", get(blogs::dislike))
        .route("/blog/:id/react", post(blogs::react))
}

fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/blog/:id/comment/create", post(comments::create))
        .route("/blog/:id/comment/all", get(comments::for_blog))
        .route("/comment/my-blogs/comments", get(comments::on_my_blogs))
        .route("/comment/:id/edit", put(comments::edit))
        .route("/comment/:id/delete", delete(comments::delete))
        .route("/comment/:id/like", get(comments::like))
        .route("/comment/:id/dislike", get(comments::dislike))
        .route("/comment/:id/react", post(comments::react))
}

fn cors(frontend_url: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);
    match frontend_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin).allow_credentials(true),
        Some(Err(e)) => {
            warn!(error = %e, "ignoring unusable frontend origin");
            layer
        }
        None => layer,
    }
}
