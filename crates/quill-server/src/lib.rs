//! HTTP server for Quill.
//!
//! Serves the REST API under `/api/v1`, resolves the caller through a single
//! [`Authenticated`] extractor, and exposes the broadcast channel to
//! observers as a Server-Sent Events stream at `/api/v1/events`.

pub mod auth;
pub mod blogs;
pub mod comments;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod reply;
pub mod router;
pub mod server;
pub mod state;
pub mod users;

pub use auth::Authenticated;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ServerError, ServerResult};
pub use reply::{Payload, Reply};
pub use server::QuillServer;
pub use state::{AppState, CookiePolicy};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
    use axum::http::{HeaderMap, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use quill_auth::{NoFederation, TokenSigner};
    use quill_fabric::EventHub;
    use quill_store::{CommentStore, InMemoryStore};
    use quill_types::CommentId;

    struct TestApp {
        router: Router,
        store: Arc<InMemoryStore>,
    }

    fn app() -> TestApp {
        let store = Arc::new(InMemoryStore::new());
        let config = ServerConfig {
            password_rounds: 2,
            ..Default::default()
        };
        let state = AppState::new(
            store.clone(),
            Arc::new(EventHub::default()),
            Arc::new(TokenSigner::generate(3600)),
            Arc::new(NoFederation),
            &config,
        );
        TestApp {
            router: router::build_router(state, None),
            store,
        }
    }

    struct Response {
        status: StatusCode,
        headers: HeaderMap,
        body: Value,
    }

    impl TestApp {
        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> Response {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(body) => req
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };
            self.send(req).await
        }

        async fn send(&self, req: Request<Body>) -> Response {
            let response = self.router.clone().oneshot(req).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            Response {
                status,
                headers,
                body,
            }
        }

        /// Register and log in; returns `(user id, token)`.
        async fn sign_up(&self, first: &str, email: &str) -> (String, String) {
            let res = self
                .call(
                    Method::POST,
                    "/api/v1/user/register",
                    None,
                    Some(json!({
                        "firstName": first,
                        "lastName": "Tester",
                        "email": email,
                        "password": "secret-pass",
                    })),
                )
                .await;
            assert_eq!(res.status, StatusCode::CREATED);
            let res = self
                .call(
                    Method::POST,
                    "/api/v1/user/login",
                    None,
                    Some(json!({ "email": email, "password": "secret-pass" })),
                )
                .await;
            assert_eq!(res.status, StatusCode::OK);
            (
                res.body["user"]["id"].as_str().unwrap().to_string(),
                res.body["token"].as_str().unwrap().to_string(),
            )
        }

        async fn new_blog(&self, token: &str) -> String {
            let res = self
                .call(
                    Method::POST,
                    "/api/v1/blog/",
                    Some(token),
                    Some(json!({ "title": "Hello", "category": "tech" })),
                )
                .await;
            assert_eq!(res.status, StatusCode::CREATED);
            res.body["blog"]["id"].as_str().unwrap().to_string()
        }

        async fn new_comment(&self, token: &str, blog: &str, content: &str) -> String {
            let res = self
                .call(
                    Method::POST,
                    &format!("/api/v1/blog/{blog}/comment/create"),
                    Some(token),
                    Some(json!({ "content": content })),
                )
                .await;
            assert_eq!(res.status, StatusCode::CREATED);
            res.body["comment"]["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app();
        let res = app.call(Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["status"], "ok");
    }

    #[tokio::test]
    async fn login_sets_session_cookie_usable_for_auth() {
        let app = app();
        app.sign_up("Ada", "ada@example.com").await;
        let res = app
            .call(
                Method::POST,
                "/api/v1/user/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "secret-pass" })),
            )
            .await;
        let cookie = res.headers[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("token="));
        assert_eq!(res.body["message"], "Welcome back Ada");
        assert!(res.body["user"].get("credential").is_none());

        let pair = cookie.split(';').next().unwrap().to_string();
        let req = Request::builder()
            .uri("/api/v1/blog/get-own-blogs")
            .header(COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        let res = app.send(req).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["blogs"], json!([]));
    }

    #[tokio::test]
    async fn bad_login_and_duplicate_register() {
        let app = app();
        app.sign_up("Ada", "ada@example.com").await;

        let res = app
            .call(
                Method::POST,
                "/api/v1/user/login",
                None,
                Some(json!({ "email": "ada@example.com", "password": "wrong-pass" })),
            )
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["success"], false);

        let res = app
            .call(
                Method::POST,
                "/api/v1/user/register",
                None,
                Some(json!({
                    "firstName": "Ada",
                    "lastName": "Again",
                    "email": "ADA@example.com",
                    "password": "secret-pass",
                })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CONFLICT);
        assert_eq!(res.body["message"], "Email already exists");
    }

    #[tokio::test]
    async fn blog_like_scenario_over_http() {
        let app = app();
        let (_, author) = app.sign_up("Ann", "a@example.com").await;
        let (x_id, x) = app.sign_up("Xavier", "x@example.com").await;
        let blog = app.new_blog(&author).await;

        let like = format!("/api/v1/blog/{blog}/like");
        let res = app.call(Method::GET, &like, Some(&x), None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["blog"]["likes"], json!([x_id]));

        let res = app.call(Method::GET, &like, Some(&x), None).await;
        assert_eq!(res.body["blog"]["likes"], json!([]));

        let res = app
            .call(Method::GET, &format!("/api/v1/blog/{blog}/dislike"), Some(&x), None)
            .await;
        assert_eq!(res.body["blog"]["dislikes"], json!([x_id]));

        let res = app
            .call(Method::GET, "/api/v1/blog/my-blogs/dislikes", Some(&author), None)
            .await;
        assert_eq!(res.body["totalDislikes"], 1);
        assert_eq!(res.body["totalBlogs"], 1);
    }

    #[tokio::test]
    async fn comment_reaction_scenario_over_http() {
        let app = app();
        let (_, author) = app.sign_up("Ann", "a@example.com").await;
        let (_, y) = app.sign_up("Yuki", "y@example.com").await;
        let (z_id, z) = app.sign_up("Zoe", "z@example.com").await;
        let blog = app.new_blog(&author).await;
        let comment = app.new_comment(&y, &blog, "nice post").await;

        let res = app
            .call(Method::GET, &format!("/api/v1/comment/{comment}/like"), Some(&z), None)
            .await;
        assert_eq!(res.body["updatedComment"]["numberOfLikes"], 1);
        assert_eq!(res.body["updatedComment"]["likes"], json!([z_id]));

        let res = app
            .call(Method::GET, &format!("/api/v1/comment/{comment}/dislike"), Some(&z), None)
            .await;
        assert_eq!(res.body["updatedComment"]["numberOfLikes"], 0);
        assert_eq!(res.body["updatedComment"]["numberOfDislikes"], 1);

        let res = app
            .call(
                Method::POST,
                &format!("/api/v1/comment/{comment}/react"),
                Some(&z),
                Some(json!({ "emoji": "🎉" })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["active"], true);
        assert_eq!(res.body["updatedComment"]["reactions"]["🎉"], json!([z_id]));

        let res = app
            .call(
                Method::POST,
                &format!("/api/v1/comment/{comment}/react"),
                Some(&z),
                Some(json!({})),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unauthenticated_comment_delete_is_rejected() {
        let app = app();
        let (_, author) = app.sign_up("Ann", "a@example.com").await;
        let blog = app.new_blog(&author).await;
        let comment = app.new_comment(&author, &blog, "keep me").await;

        let res = app
            .call(Method::DELETE, &format!("/api/v1/comment/{comment}/delete"), None, None)
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["success"], false);

        let id: CommentId = comment.parse().unwrap();
        let stored = app.store.comment(id).await.unwrap().unwrap();
        assert_eq!(stored.content, "keep me");
    }

    #[tokio::test]
    async fn ownership_and_lookup_errors() {
        let app = app();
        let (_, author) = app.sign_up("Ann", "a@example.com").await;
        let (_, other) = app.sign_up("Otto", "o@example.com").await;
        let blog = app.new_blog(&author).await;
        let comment = app.new_comment(&author, &blog, "mine").await;

        let res = app
            .call(Method::DELETE, &format!("/api/v1/comment/{comment}/delete"), Some(&other), None)
            .await;
        assert_eq!(res.status, StatusCode::FORBIDDEN);

        let res = app
            .call(Method::DELETE, &format!("/api/v1/blog/delete/{blog}"), Some(&other), None)
            .await;
        assert_eq!(res.status, StatusCode::FORBIDDEN);

        let res = app
            .call(Method::GET, "/api/v1/blog/not-an-id/like", Some(&other), None)
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);

        let missing = quill_types::BlogId::new();
        let res = app
            .call(Method::GET, &format!("/api/v1/blog/{missing}/comment/all"), None, None)
            .await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body["message"], "Blog not found");
    }

    #[tokio::test]
    async fn publish_edit_and_cascade_delete() {
        let app = app();
        let (_, author) = app.sign_up("Ann", "a@example.com").await;
        let blog = app.new_blog(&author).await;
        let c1 = app.new_comment(&author, &blog, "first").await;
        app.new_comment(&author, &blog, "second").await;

        let res = app
            .call(Method::PATCH, &format!("/api/v1/blog/{blog}"), Some(&author), None)
            .await;
        assert_eq!(res.body["blog"]["isPublished"], true);
        let res = app.call(Method::GET, "/api/v1/blog/get-published-blogs", None, None).await;
        assert_eq!(res.body["blogs"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["blogs"][0]["authorProfile"]["firstName"], "Ann");

        let res = app
            .call(
                Method::PUT,
                &format!("/api/v1/comment/{c1}/edit"),
                Some(&author),
                Some(json!({ "content": "first, edited" })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body["comment"]["editedAt"].is_string());

        let res = app
            .call(Method::GET, &format!("/api/v1/blog/{blog}/comment/all"), None, None)
            .await;
        assert_eq!(res.body["comments"].as_array().unwrap().len(), 2);

        let res = app
            .call(Method::DELETE, &format!("/api/v1/blog/delete/{blog}"), Some(&author), None)
            .await;
        assert_eq!(res.status, StatusCode::OK);
        let id: CommentId = c1.parse().unwrap();
        assert!(app.store.comment(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_body_uses_error_envelope() {
        let app = app();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/user/register")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.send(req).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["success"], false);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let app = app();
        let res = app.call(Method::GET, "/api/v1/user/logout", None, None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.headers[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn event_stream_opens() {
        let app = app();
        let req = Request::builder()
            .uri("/api/v1/events?kinds=newComment")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");

        let req = Request::builder()
            .uri("/api/v1/events?kinds=bogus")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
