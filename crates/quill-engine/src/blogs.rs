use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use quill_auth::AuthenticatedIdentity;
use quill_store::{BlogStore, CommentStore, Store, UserStore};
use quill_types::{AuthorSummary, Blog, BlogId, BlogUpdate, NewBlog, Reactable, UserId};

use crate::error::{EngineError, EngineResult};

/// A blog with its author's public profile.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    #[serde(flatten)]
    pub blog: Blog,
    pub author_profile: Option<AuthorSummary>,
}

/// Reaction totals across every blog a user wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionTotals {
    pub total_blogs: u64,
    pub total_likes: u64,
    pub total_dislikes: u64,
}

/// Blog lifecycle: create, edit, publish, list, delete.
#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn Store>,
}

impl BlogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, who: AuthenticatedIdentity, input: NewBlog) -> EngineResult<Blog> {
        let blog = Blog::new(who.user_id, input)?;
        self.store.insert_blog(blog.clone()).await?;
        info!(blog = %blog.id, author = %who.user_id, "blog created");
        Ok(blog)
    }

    pub async fn get(&self, id: BlogId) -> EngineResult<Blog> {
        self.store
            .blog(id)
            .await?
            .ok_or(EngineError::not_found("blog"))
    }

    /// Update content fields. Only the author may edit.
    pub async fn update(
        &self,
        who: AuthenticatedIdentity,
        id: BlogId,
        update: BlogUpdate,
    ) -> EngineResult<Blog> {
        self.owned(who, id, "update").await?;
        let blog = self
            .store
            .modify_blog(id, Box::new(move |b| b.apply_update(update)))
            .await?;
        info!(blog = %id, "blog updated");
        Ok(blog)
    }

    /// Flip the published flag. Only the author may publish.
    pub async fn toggle_publish(&self, who: AuthenticatedIdentity, id: BlogId) -> EngineResult<Blog> {
        self.owned(who, id, "publish").await?;
        let blog = self
            .store
            .modify_blog(
                id,
                Box::new(|b| {
                    b.toggle_published();
                    Ok(())
                }),
            )
            .await?;
        info!(blog = %id, published = blog.is_published, "publish state changed");
        Ok(blog)
    }

    /// Delete a blog and then its comments.
    ///
    /// The two deletes are separate store calls; a failure between them
    /// leaves orphaned comments behind.
    pub async fn delete(&self, who: AuthenticatedIdentity, id: BlogId) -> EngineResult<()> {
        self.owned(who, id, "delete").await?;
        self.store.delete_blog(id).await?;
        match self.store.delete_comments_for_blog(id).await {
            Ok(removed) => {
                info!(blog = %id, comments = removed.len(), "blog deleted");
                Ok(())
            }
            Err(e) => {
                warn!(blog = %id, error = %e, "blog deleted but comment cascade failed");
                Err(e.into())
            }
        }
    }

    /// Every blog, newest first.
    pub async fn all(&self) -> EngineResult<Vec<BlogView>> {
        let blogs = self.store.blogs().await?;
        self.with_authors(blogs).await
    }

    /// Published blogs, newest first.
    pub async fn published(&self) -> EngineResult<Vec<BlogView>> {
        let blogs = self
            .store
            .blogs()
            .await?
            .into_iter()
            .filter(|b| b.is_published)
            .collect();
        self.with_authors(blogs).await
    }

    /// The caller's own blogs, newest first.
    pub async fn own(&self, who: AuthenticatedIdentity) -> EngineResult<Vec<BlogView>> {
        let blogs = self.store.blogs_by_author(who.user_id).await?;
        self.with_authors(blogs).await
    }

    /// Like and dislike totals over the caller's blogs.
    pub async fn reaction_totals(&self, who: AuthenticatedIdentity) -> EngineResult<ReactionTotals> {
        let blogs = self.store.blogs_by_author(who.user_id).await?;
        Ok(blogs.iter().fold(ReactionTotals::default(), |mut acc, b| {
            acc.total_blogs += 1;
            acc.total_likes += b.reactions().like_count();
            acc.total_dislikes += b.reactions().dislike_count();
            acc
        }))
    }

    async fn owned(&self, who: AuthenticatedIdentity, id: BlogId, action: &str) -> EngineResult<Blog> {
        let blog = self.get(id).await?;
        if !blog.is_owned_by(who.user_id) {
            return Err(EngineError::forbidden(action, "blog"));
        }
        Ok(blog)
    }

    async fn with_authors(&self, blogs: Vec<Blog>) -> EngineResult<Vec<BlogView>> {
        let mut authors: HashMap<UserId, Option<AuthorSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(blogs.len());
        for blog in blogs {
            if !authors.contains_key(&blog.author) {
                let summary = self.store.user(blog.author).await?.map(|u| u.summary());
                authors.insert(blog.author, summary);
            }
            let author_profile = authors.get(&blog.author).cloned().flatten();
            views.push(BlogView {
                blog,
                author_profile,
            });
        }
        Ok(views)
    }
}
