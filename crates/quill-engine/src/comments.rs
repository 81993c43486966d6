use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use quill_auth::AuthenticatedIdentity;
use quill_fabric::EventHub;
use quill_store::{BlogStore, CommentStore, Store, UserStore};
use quill_types::{AuthorSummary, BlogId, Comment, CommentId, NewComment, UserId};

use crate::error::{EngineError, EngineResult};

/// A comment with its author's public profile.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<AuthorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_title: Option<String>,
}

/// Threaded comments on blog posts.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
    hub: Arc<EventHub>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>, hub: Arc<EventHub>) -> Self {
        Self { store, hub }
    }

    /// Post a comment (or a reply, when `parent_id` is set) on `blog`.
    pub async fn create(
        &self,
        who: AuthenticatedIdentity,
        blog: BlogId,
        input: NewComment,
    ) -> EngineResult<Comment> {
        if self.store.blog(blog).await?.is_none() {
            return Err(EngineError::not_found("blog"));
        }
        if let Some(parent) = input.parent_id {
            match self.store.comment(parent).await? {
                Some(p) if p.post_id == blog => {}
                Some(_) => {
                    return Err(EngineError::InvalidArgument(
                        "parent comment belongs to another blog".into(),
                    ))
                }
                None => return Err(EngineError::not_found("comment")),
            }
        }

        let comment = Comment::new(who.user_id, blog, input)?;
        self.store.insert_comment(comment.clone()).await?;
        if let Err(e) = self.store.attach_comment(blog, comment.id).await {
            // The blog went away after the check; roll back the insert.
            if let Err(undo) = self.store.delete_comment(comment.id).await {
                warn!(comment = %comment.id, error = %undo, "unattached comment left behind");
            }
            return Err(e.into());
        }

        let observers = self.hub.new_comment(&comment);
        info!(comment = %comment.id, blog = %blog, observers, "comment created");
        Ok(comment)
    }

    /// Replace the content of a comment. Only the author may edit.
    pub async fn edit(
        &self,
        who: AuthenticatedIdentity,
        id: CommentId,
        content: String,
    ) -> EngineResult<Comment> {
        self.owned(who, id, "edit").await?;
        let comment = self
            .store
            .modify_comment(id, Box::new(move |c| c.edit(&content)))
            .await?;
        let observers = self.hub.update_comment(&comment);
        info!(comment = %id, observers, "comment edited");
        Ok(comment)
    }

    /// Delete a comment and every reply beneath it. Returns the removed ids,
    /// the addressed comment first.
    pub async fn delete(
        &self,
        who: AuthenticatedIdentity,
        id: CommentId,
    ) -> EngineResult<Vec<CommentId>> {
        let root = self.owned(who, id, "delete").await?;
        let blog = root.post_id;

        let mut removed = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            for reply in self.store.replies_to(next).await? {
                queue.push_back(reply.id);
            }
            if self.store.delete_comment(next).await?.is_some() {
                removed.push(next);
            }
        }

        match self.store.detach_comments(blog, removed.clone()).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!(blog = %blog, "parent blog already gone"),
            Err(e) => return Err(e.into()),
        }

        let observers = self.hub.delete_comment(blog, removed.clone());
        info!(comment = %id, removed = removed.len(), observers, "comment deleted");
        Ok(removed)
    }

    /// Comments on `blog`, newest first.
    pub async fn list_for_blog(&self, blog: BlogId) -> EngineResult<Vec<CommentView>> {
        if self.store.blog(blog).await?.is_none() {
            return Err(EngineError::not_found("blog"));
        }
        let comments = self.store.comments_for_blog(blog).await?;
        self.with_authors(comments, &HashMap::new()).await
    }

    /// Comments left on any blog the caller wrote, newest first.
    pub async fn on_my_blogs(&self, who: AuthenticatedIdentity) -> EngineResult<Vec<CommentView>> {
        let blogs = self.store.blogs_by_author(who.user_id).await?;
        let titles: HashMap<BlogId, String> =
            blogs.iter().map(|b| (b.id, b.title.clone())).collect();
        let ids: Vec<BlogId> = blogs.iter().map(|b| b.id).collect();
        let comments = self.store.comments_for_blogs(&ids).await?;
        self.with_authors(comments, &titles).await
    }

    async fn owned(
        &self,
        who: AuthenticatedIdentity,
        id: CommentId,
        action: &str,
    ) -> EngineResult<Comment> {
        let comment = self
            .store
            .comment(id)
            .await?
            .ok_or(EngineError::not_found("comment"))?;
        if !comment.is_owned_by(who.user_id) {
            return Err(EngineError::forbidden(action, "comment"));
        }
        Ok(comment)
    }

    async fn with_authors(
        &self,
        comments: Vec<Comment>,
        titles: &HashMap<BlogId, String>,
    ) -> EngineResult<Vec<CommentView>> {
        let mut authors: HashMap<UserId, Option<AuthorSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            if !authors.contains_key(&comment.user_id) {
                let summary = self.store.user(comment.user_id).await?.map(|u| u.summary());
                authors.insert(comment.user_id, summary);
            }
            views.push(CommentView {
                author: authors.get(&comment.user_id).cloned().flatten(),
                blog_title: titles.get(&comment.post_id).cloned(),
                comment,
            });
        }
        Ok(views)
    }
}
