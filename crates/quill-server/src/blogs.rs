use axum::extract::{Path, State};
use serde::Deserialize;

use quill_types::{BlogId, BlogUpdate, NewBlog};

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::reply::{parse_id, Payload, Reply};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReactRequest {
    pub emoji: String,
}

pub async fn create(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Payload(input): Payload<NewBlog>,
) -> ApiResult<Reply> {
    let blog = state.platform.blogs.create(who, input).await?;
    Reply::created("Blog created successfully").with("blog", blog)
}

pub async fn update(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
    Payload(update): Payload<BlogUpdate>,
) -> ApiResult<Reply> {
    let id: BlogId = parse_id(&id)?;
    let blog = state.platform.blogs.update(who, id, update).await?;
    Reply::ok("Blog updated successfully").with("blog", blog)
}

pub async fn all(State(state): State<AppState>) -> ApiResult<Reply> {
    let blogs = state.platform.blogs.all().await?;
    Reply::ok("Blogs fetched successfully").with("blogs", blogs)
}

pub async fn published(State(state): State<AppState>) -> ApiResult<Reply> {
    let blogs = state.platform.blogs.published().await?;
    Reply::ok("Published blogs fetched successfully").with("blogs", blogs)
}

pub async fn own(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
) -> ApiResult<Reply> {
    let blogs = state.platform.blogs.own(who).await?;
    Reply::ok("Your blogs fetched successfully").with("blogs", blogs)
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Reply> {
    let blog = state.platform.blogs.toggle_publish(who, parse_id(&id)?).await?;
    let message = if blog.is_published {
        "Blog published"
    } else {
        "Blog unpublished"
    };
    Reply::ok(message).with("blog", blog)
}

pub async fn delete(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Reply> {
    state.platform.blogs.delete(who, parse_id(&id)?).await?;
    Ok(Reply::ok("Blog deleted successfully"))
}

pub async fn like(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Reply> {
    let id: BlogId = parse_id(&id)?;
    let toggled = state.platform.reactions.toggle_like(id, who.user_id).await?;
    let message = if toggled.active() {
        "Blog liked"
    } else {
        "Blog like removed"
    };
    Reply::ok(message).with("blog", toggled.entity)
}

pub async fn dislike(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Reply> {
    let id: BlogId = parse_id(&id)?;
    let toggled = state.platform.reactions.toggle_dislike(id, who.user_id).await?;
    let message = if toggled.active() {
        "Blog disliked"
    } else {
        "Blog dislike removed"
    };
    Reply::ok(message).with("blog", toggled.entity)
}

pub async fn react(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
    Payload(input): Payload<ReactRequest>,
) -> ApiResult<Reply> {
    let id: BlogId = parse_id(&id)?;
    let toggled = state
        .platform
        .reactions
        .toggle_emoji(id, who.user_id, &input.emoji)
        .await?;
    Reply::ok("Reaction updated")
        .with("active", toggled.active())?
        .with("blog", toggled.entity)
}

pub async fn my_likes(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
) -> ApiResult<Reply> {
    let totals = state.platform.blogs.reaction_totals(who).await?;
    Reply::ok("Total likes fetched")
        .with("totalBlogs", totals.total_blogs)?
        .with("totalLikes", totals.total_likes)
}

pub async fn my_dislikes(
    State(state): State<AppState>,
    Authenticated(who): Authenticated,
) -> ApiResult<Reply> {
    let totals = state.platform.blogs.reaction_totals(who).await?;
    Reply::ok("Total dislikes fetched")
        .with("totalBlogs", totals.total_blogs)?
        .with("totalDislikes", totals.total_dislikes)
}
