//! In-memory store for tests and single-process deployments.
//!
//! [`InMemoryStore`] keeps each record kind in a `HashMap` behind its own
//! `RwLock`. Every mutation (including reaction toggles) runs inside a single
//! write-lock critical section, so concurrent toggles never lose updates.
//! Data is lost when the store is dropped.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use async_trait::async_trait;
use quill_types::{
    Blog, BlogId, Comment, CommentId, Credential, Reactable, ReactionKind, ToggleOutcome, TypeError,
    User, UserId,
};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlogMutation, BlogStore, CommentMutation, CommentStore, UserMutation, UserStore};

/// One lock-protected record map.
#[derive(Debug)]
struct Table<K, V> {
    entity: &'static str,
    rows: RwLock<HashMap<K, V>>,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Copy + ToString,
    V: Clone,
{
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned(&self) -> StoreError {
        StoreError::Backend(format!("{} table lock poisoned", self.entity))
    }

    fn get(&self, id: &K) -> StoreResult<Option<V>> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.get(id).cloned())
    }

    fn find(&self, pred: impl Fn(&V) -> bool) -> StoreResult<Vec<V>> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.values().filter(|v| pred(v)).cloned().collect())
    }

    fn insert(&self, id: K, value: V) -> StoreResult<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        rows.insert(id, value);
        Ok(())
    }

    /// Run `f` on a copy of the record and commit it only if `f` succeeds.
    fn update<R>(
        &self,
        id: &K,
        f: impl FnOnce(&mut V) -> Result<R, TypeError>,
    ) -> StoreResult<(V, R)> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        let row = rows
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(self.entity, id.to_string()))?;
        let mut draft = row.clone();
        let result = f(&mut draft)?;
        *row = draft.clone();
        Ok((draft, result))
    }

    fn remove(&self, id: &K) -> StoreResult<Option<V>> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        Ok(rows.remove(id))
    }

    fn remove_where(&self, pred: impl Fn(&V) -> bool) -> StoreResult<Vec<(K, V)>> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        let doomed: Vec<K> = rows
            .iter()
            .filter(|(_, v)| pred(v))
            .map(|(k, _)| *k)
            .collect();
        Ok(doomed
            .into_iter()
            .filter_map(|k| rows.remove(&k).map(|v| (k, v)))
            .collect())
    }
}

/// An in-memory implementation of every store trait.
#[derive(Debug)]
pub struct InMemoryStore {
    users: Table<UserId, User>,
    blogs: Table<BlogId, Blog>,
    comments: Table<CommentId, Comment>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Table::new("user"),
            blogs: Table::new("blog"),
            comments: Table::new("comment"),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first_blogs(mut blogs: Vec<Blog>) -> Vec<Blog> {
    blogs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    blogs
}

fn newest_first_comments(mut comments: Vec<Comment>) -> Vec<Comment> {
    comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    comments
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut rows = self.users.rows.write().map_err(|_| self.users.poisoned())?;
        if rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate {
                field: "email",
                value: user.email,
            });
        }
        debug!(user = %user.id, "user inserted");
        rows.insert(user.id, user);
        Ok(())
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.users.get(&id)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find(|u| u.email == email)?.into_iter().next())
    }

    async fn user_by_federated(&self, provider: &str, subject: &str) -> StoreResult<Option<User>> {
        let found = self.users.find(|u| match &u.credential {
            Credential::Federated {
                provider: p,
                subject: s,
            } => p == provider && s == subject,
            Credential::Password { .. } => false,
        })?;
        Ok(found.into_iter().next())
    }

    async fn modify_user(&self, id: UserId, mutation: UserMutation) -> StoreResult<User> {
        self.users.update(&id, mutation).map(|(user, ())| user)
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        let mut users = self.users.find(|_| true)?;
        users.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(users)
    }
}

#[async_trait]
impl BlogStore for InMemoryStore {
    async fn insert_blog(&self, blog: Blog) -> StoreResult<()> {
        debug!(blog = %blog.id, author = %blog.author, "blog inserted");
        self.blogs.insert(blog.id, blog)
    }

    async fn blog(&self, id: BlogId) -> StoreResult<Option<Blog>> {
        self.blogs.get(&id)
    }

    async fn blogs(&self) -> StoreResult<Vec<Blog>> {
        Ok(newest_first_blogs(self.blogs.find(|_| true)?))
    }

    async fn blogs_by_author(&self, author: UserId) -> StoreResult<Vec<Blog>> {
        Ok(newest_first_blogs(self.blogs.find(|b| b.author == author)?))
    }

    async fn modify_blog(&self, id: BlogId, mutation: BlogMutation) -> StoreResult<Blog> {
        self.blogs.update(&id, mutation).map(|(blog, ())| blog)
    }

    async fn delete_blog(&self, id: BlogId) -> StoreResult<Option<Blog>> {
        self.blogs.remove(&id)
    }

    async fn toggle_blog_reaction(
        &self,
        id: BlogId,
        user: UserId,
        kind: &ReactionKind,
    ) -> StoreResult<(Blog, ToggleOutcome)> {
        self.blogs
            .update(&id, |blog| Ok(blog.apply_reaction(user, kind)))
    }
}

#[async_trait]
impl CommentStore for InMemoryStore {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        debug!(comment = %comment.id, blog = %comment.post_id, "comment inserted");
        self.comments.insert(comment.id, comment)
    }

    async fn comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        self.comments.get(&id)
    }

    async fn comments_for_blog(&self, blog: BlogId) -> StoreResult<Vec<Comment>> {
        Ok(newest_first_comments(self.comments.find(|c| c.post_id == blog)?))
    }

    async fn comments_for_blogs(&self, blogs: &[BlogId]) -> StoreResult<Vec<Comment>> {
        Ok(newest_first_comments(
            self.comments.find(|c| blogs.contains(&c.post_id))?,
        ))
    }

    async fn replies_to(&self, parent: CommentId) -> StoreResult<Vec<Comment>> {
        self.comments.find(|c| c.parent_id == Some(parent))
    }

    async fn modify_comment(&self, id: CommentId, mutation: CommentMutation) -> StoreResult<Comment> {
        self.comments.update(&id, mutation).map(|(comment, ())| comment)
    }

    async fn delete_comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        self.comments.remove(&id)
    }

    async fn delete_comments_for_blog(&self, blog: BlogId) -> StoreResult<Vec<CommentId>> {
        let removed = self.comments.remove_where(|c| c.post_id == blog)?;
        Ok(removed.into_iter().map(|(id, _)| id).collect())
    }

    async fn toggle_comment_reaction(
        &self,
        id: CommentId,
        user: UserId,
        kind: &ReactionKind,
    ) -> StoreResult<(Comment, ToggleOutcome)> {
        self.comments
            .update(&id, |comment| Ok(comment.apply_reaction(user, kind)))
    }
}
