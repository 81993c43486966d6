use axum::extract::State;
use serde::Deserialize;

use quill_engine::{Registration, Session};
use quill_types::ProfileUpdate;

use crate::auth::{cleared_cookie, session_cookie, Authenticated};
use crate::error::ApiResult;
use crate::reply::{Payload, Reply};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FederatedLoginRequest {
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Payload(input): Payload<Registration>,
) -> ApiResult<Reply> {
    let user = state.platform.users.register(input).await?;
    Reply::created("Account created successfully").with("user", user)
}

pub async fn login(
    State(state): State<AppState>,
    Payload(input): Payload<LoginRequest>,
) -> ApiResult<Reply> {
    let session = state.platform.users.login(&input.email, &input.password).await?;
    let message = format!("Welcome back {}", session.user.first_name);
    session_reply(&state, session, message)
}

pub async fn federated_login(
    State(state): State<AppState>,
    Payload(input): Payload<FederatedLoginRequest>,
) -> ApiResult<Reply> {
    let session = state.platform.users.federated_login(&input.token).await?;
    let message = format!("Welcome {}", session.user.first_name);
    session_reply(&state, session, message)
}

pub async fn logout() -> Reply {
    Reply::ok("Logged out successfully.").set_cookie(cleared_cookie())
}

pub async fn update_profile(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Payload(update): Payload<ProfileUpdate>,
) -> ApiResult<Reply> {
    let user = state.platform.users.update_profile(who, update).await?;
    Reply::ok("Profile updated successfully").with("user", user)
}

pub async fn all_users(State(state): State<AppState>) -> ApiResult<Reply> {
    let users = state.platform.users.list().await?;
    Reply::ok("User list fetched successfully")
        .with("total", users.len())?
        .with("users", users)
}

fn session_reply(state: &AppState, session: Session, message: String) -> ApiResult<Reply> {
    let cookie = session_cookie(&session.token, state.cookies);
    Ok(Reply::ok(message)
        .with("token", &session.token)?
        .with("expiresIn", session.expires_in)?
        .with("user", session.user)?
        .set_cookie(cookie))
}
