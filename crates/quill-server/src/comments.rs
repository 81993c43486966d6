use axum::extract::{Path, State};
use serde::Deserialize;

use quill_types::{BlogId, CommentId, NewComment};

use crate::auth::Authenticated;
use crate::blogs::ReactRequest;
use crate::error::ApiResult;
use crate::reply::{parse_id, Payload, Reply};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditRequest {
    pub content: String,
}

pub async fn create(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(blog): Path<String>,
    Payload(input): Payload<NewComment>,
) -> ApiResult<Reply> {
    let blog: BlogId = parse_id(&blog)?;
    let comment = state.platform.comments.create(who, blog, input).await?;
    Reply::created("Comment added").with("comment", comment)
}

pub async fn edit(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
    Payload(input): Payload<EditRequest>,
) -> ApiResult<Reply> {
    let id: CommentId = parse_id(&id)?;
    let comment = state.platform.comments.edit(who, id, input.content).await?;
    Reply::ok("Comment edited successfully").with("comment", comment)
}

pub async fn delete(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Reply> {
    let removed = state.platform.comments.delete(who, parse_id(&id)?).await?;
    Reply::ok("Comment deleted successfully").with("deleted", removed)
}

pub async fn for_blog(
    State(state): State<AppState>,
    Path(blog): Path<String>,
) -> ApiResult<Reply> {
    let comments = state.platform.comments.list_for_blog(parse_id(&blog)?).await?;
    Reply::ok("Comments fetched successfully").with("comments", comments)
}

pub async fn on_my_blogs(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
) -> ApiResult<Reply> {
    let comments = state.platform.comments.on_my_blogs(who).await?;
    Reply::ok("Comments fetched successfully")
        .with("total", comments.len())?
        .with("comments", comments)
}

pub async fn like(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Reply> {
    let id: CommentId = parse_id(&id)?;
    let toggled = state.platform.reactions.toggle_like(id, who.user_id).await?;
    let message = if toggled.active() {
        "Comment liked"
    } else {
        "Comment like removed"
    };
    Reply::ok(message).with("updatedComment", toggled.entity)
}

pub async fn dislike(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Reply> {
    let id: CommentId = parse_id(&id)?;
    let toggled = state.platform.reactions.toggle_dislike(id, who.user_id).await?;
    let message = if toggled.active() {
        "Comment disliked"
    } else {
        "Comment dislike removed"
    };
    Reply::ok(message).with("updatedComment", toggled.entity)
}

pub async fn react(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
    Payload(input): Payload<ReactRequest>,
) -> ApiResult<Reply> {
    let id: CommentId = parse_id(&id)?;
    let toggled = state
        .platform
        .reactions
        .toggle_emoji(id, who.user_id, &input.emoji)
        .await?;
    Reply::ok("Reaction updated")
        .with("active", toggled.active())?
        .with("updatedComment", toggled.entity)
}
