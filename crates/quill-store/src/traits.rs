use async_trait::async_trait;
use quill_types::{
    Blog, BlogId, Comment, CommentId, ReactionKind, ToggleOutcome, TypeError, User, UserId,
};

use crate::error::StoreResult;

/// A content change applied to the current version of a record.
pub type UserMutation = Box<dyn FnOnce(&mut User) -> Result<(), TypeError> + Send>;
pub type BlogMutation = Box<dyn FnOnce(&mut Blog) -> Result<(), TypeError> + Send>;
pub type CommentMutation = Box<dyn FnOnce(&mut Comment) -> Result<(), TypeError> + Send>;

/// Storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `Duplicate` if the email is taken.
    async fn insert_user(&self, user: User) -> StoreResult<()>;

    async fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Look up by normalized email.
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Look up by federated identity.
    async fn user_by_federated(&self, provider: &str, subject: &str) -> StoreResult<Option<User>>;

    /// Apply `mutation` to the stored user and return the result.
    ///
    /// If the mutation fails the stored record is left unchanged.
    async fn modify_user(&self, id: UserId, mutation: UserMutation) -> StoreResult<User>;

    async fn users(&self) -> StoreResult<Vec<User>>;
}

/// Storage for blog posts.
#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn insert_blog(&self, blog: Blog) -> StoreResult<()>;

    async fn blog(&self, id: BlogId) -> StoreResult<Option<Blog>>;

    /// Every blog, newest first.
    async fn blogs(&self) -> StoreResult<Vec<Blog>>;

    /// Blogs written by `author`, newest first.
    async fn blogs_by_author(&self, author: UserId) -> StoreResult<Vec<Blog>>;

    /// Apply `mutation` to the stored blog and return the result.
    async fn modify_blog(&self, id: BlogId, mutation: BlogMutation) -> StoreResult<Blog>;

    /// Remove a blog. Returns the removed record, if it existed.
    async fn delete_blog(&self, id: BlogId) -> StoreResult<Option<Blog>>;

    /// Toggle `user`'s membership in `kind` as one atomic update.
    async fn toggle_blog_reaction(
        &self,
        id: BlogId,
        user: UserId,
        kind: &ReactionKind,
    ) -> StoreResult<(Blog, ToggleOutcome)>;

    /// Append a comment id to the blog's comment list.
    async fn attach_comment(&self, blog: BlogId, comment: CommentId) -> StoreResult<()> {
        self.modify_blog(
            blog,
            Box::new(move |b| {
                b.attach_comment(comment);
                Ok(())
            }),
        )
        .await
        .map(|_| ())
    }

    /// Remove comment ids from the blog's comment list.
    async fn detach_comments(&self, blog: BlogId, comments: Vec<CommentId>) -> StoreResult<()> {
        self.modify_blog(
            blog,
            Box::new(move |b| {
                b.detach_comments(&comments);
                Ok(())
            }),
        )
        .await
        .map(|_| ())
    }
}

/// Storage for comments.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()>;

    async fn comment(&self, id: CommentId) -> StoreResult<Option<Comment>>;

    /// Comments on `blog`, newest first.
    async fn comments_for_blog(&self, blog: BlogId) -> StoreResult<Vec<Comment>>;

    /// Comments on any of `blogs`, newest first.
    async fn comments_for_blogs(&self, blogs: &[BlogId]) -> StoreResult<Vec<Comment>>;

    /// Direct replies to `parent`.
    async fn replies_to(&self, parent: CommentId) -> StoreResult<Vec<Comment>>;

    async fn modify_comment(&self, id: CommentId, mutation: CommentMutation) -> StoreResult<Comment>;

    async fn delete_comment(&self, id: CommentId) -> StoreResult<Option<Comment>>;

    /// Remove every comment on `blog`; returns the removed ids.
    async fn delete_comments_for_blog(&self, blog: BlogId) -> StoreResult<Vec<CommentId>>;

    /// Toggle `user`'s membership in `kind` as one atomic update.
    async fn toggle_comment_reaction(
        &self,
        id: CommentId,
        user: UserId,
        kind: &ReactionKind,
    ) -> StoreResult<(Comment, ToggleOutcome)>;
}

/// A complete persistence backend.
pub trait Store: UserStore + BlogStore + CommentStore {}

impl<T: UserStore + BlogStore + CommentStore> Store for T {}
