//! The reaction engine.
//!
//! One engine serves every reactable entity. A [`ReactionTarget`] names the
//! entity (a [`BlogId`] or a [`CommentId`]), tells the engine how to apply an
//! atomic toggle through the store, and how to announce the new state on the
//! broadcast channel.
//!
//! The toggle itself happens inside the store's conditional update, so two
//! concurrent requests never overwrite each other's set changes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use quill_fabric::EventHub;
use quill_store::{BlogStore, CommentStore, Store, StoreResult};
use quill_types::{Blog, BlogId, Comment, CommentId, ReactionKind, ToggleOutcome, UserId};

use crate::error::EngineResult;

/// The state after a toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toggled<T> {
    /// Full snapshot of the updated entity.
    pub entity: T,
    pub outcome: ToggleOutcome,
}

impl<T> Toggled<T> {
    /// Whether the user holds the toggled kind afterwards.
    pub fn active(&self) -> bool {
        self.outcome.active
    }
}

/// An entity id the engine can toggle reactions on.
#[async_trait]
pub trait ReactionTarget: Copy + Send + Sync + std::fmt::Display {
    type Entity: Send;

    /// Apply the toggle through the store's atomic primitive.
    async fn toggle_in(
        self,
        store: &dyn Store,
        user: UserId,
        kind: &ReactionKind,
    ) -> StoreResult<(Self::Entity, ToggleOutcome)>;

    /// Publish the updated entity to observers.
    fn announce(hub: &EventHub, entity: &Self::Entity) -> usize;
}

#[async_trait]
impl ReactionTarget for BlogId {
    type Entity = Blog;

    async fn toggle_in(
        self,
        store: &dyn Store,
        user: UserId,
        kind: &ReactionKind,
    ) -> StoreResult<(Blog, ToggleOutcome)> {
        store.toggle_blog_reaction(self, user, kind).await
    }

    fn announce(hub: &EventHub, blog: &Blog) -> usize {
        hub.reaction_update(blog)
    }
}

#[async_trait]
impl ReactionTarget for CommentId {
    type Entity = Comment;

    async fn toggle_in(
        self,
        store: &dyn Store,
        user: UserId,
        kind: &ReactionKind,
    ) -> StoreResult<(Comment, ToggleOutcome)> {
        store.toggle_comment_reaction(self, user, kind).await
    }

    fn announce(hub: &EventHub, comment: &Comment) -> usize {
        hub.update_comment(comment)
    }
}

/// Applies reaction toggles and fans out the results.
#[derive(Clone)]
pub struct ReactionEngine {
    store: Arc<dyn Store>,
    hub: Arc<EventHub>,
}

impl ReactionEngine {
    pub fn new(store: Arc<dyn Store>, hub: Arc<EventHub>) -> Self {
        Self { store, hub }
    }

    /// Like if not liked (leaving any dislike), otherwise un-like.
    pub async fn toggle_like<T: ReactionTarget>(
        &self,
        target: T,
        user: UserId,
    ) -> EngineResult<Toggled<T::Entity>> {
        self.toggle(target, user, ReactionKind::Like).await
    }

    /// Dislike if not disliked (leaving any like), otherwise un-dislike.
    pub async fn toggle_dislike<T: ReactionTarget>(
        &self,
        target: T,
        user: UserId,
    ) -> EngineResult<Toggled<T::Entity>> {
        self.toggle(target, user, ReactionKind::Dislike).await
    }

    /// Flip the user's reaction with `emoji`. Other emoji and the
    /// like/dislike state are untouched.
    pub async fn toggle_emoji<T: ReactionTarget>(
        &self,
        target: T,
        user: UserId,
        emoji: &str,
    ) -> EngineResult<Toggled<T::Entity>> {
        let kind = ReactionKind::emoji(emoji)?;
        self.toggle(target, user, kind).await
    }

    #[instrument(skip_all, fields(target = %target, user = %user, kind = %kind))]
    pub async fn toggle<T: ReactionTarget>(
        &self,
        target: T,
        user: UserId,
        kind: ReactionKind,
    ) -> EngineResult<Toggled<T::Entity>> {
        let (entity, outcome) = target.toggle_in(self.store.as_ref(), user, &kind).await?;
        let observers = T::announce(&self.hub, &entity);
        debug!(active = outcome.active, displaced = ?outcome.displaced, observers, "reaction toggled");
        Ok(Toggled { entity, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_fabric::{EventFilter, EventKind, EventPayload};
    use quill_store::InMemoryStore;
    use quill_types::{NewBlog, NewComment, Reactable};

    use crate::error::EngineError;

    struct Fixture {
        engine: ReactionEngine,
        store: Arc<InMemoryStore>,
        hub: Arc<EventHub>,
        blog: BlogId,
        comment: CommentId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let hub = Arc::new(EventHub::default());
        let author = UserId::new();
        let blog = Blog::new(
            author,
            NewBlog {
                title: "Hello".into(),
                category: "tech".into(),
            },
        )
        .unwrap();
        let comment = Comment::new(
            UserId::new(),
            blog.id,
            NewComment {
                content: "nice post".into(),
                parent_id: None,
            },
        )
        .unwrap();
        let (blog_id, comment_id) = (blog.id, comment.id);
        store.insert_blog(blog).await.unwrap();
        store.insert_comment(comment).await.unwrap();

        let engine = ReactionEngine::new(store.clone(), hub.clone());
        Fixture {
            engine,
            store,
            hub,
            blog: blog_id,
            comment: comment_id,
        }
    }

    #[tokio::test]
    async fn blog_like_round_trip() {
        let f = fixture().await;
        let x = UserId::new();

        let liked = f.engine.toggle_like(f.blog, x).await.unwrap();
        assert!(liked.active());
        assert_eq!(liked.entity.reactions().likes(), &[x]);

        let unliked = f.engine.toggle_like(f.blog, x).await.unwrap();
        assert!(!unliked.active());
        assert!(unliked.entity.reactions().likes().is_empty());
    }

    #[tokio::test]
    async fn like_then_dislike_is_exclusive() {
        let f = fixture().await;
        let u = UserId::new();

        f.engine.toggle_like(f.blog, u).await.unwrap();
        let t = f.engine.toggle_dislike(f.blog, u).await.unwrap();

        assert!(!t.entity.reactions().likes().contains(&u));
        assert!(t.entity.reactions().dislikes().contains(&u));
        assert_eq!(t.outcome.displaced, Some(ReactionKind::Like));
    }

    #[tokio::test]
    async fn comment_scenario_counts() {
        let f = fixture().await;
        let z = UserId::new();

        let t = f.engine.toggle_like(f.comment, z).await.unwrap();
        assert_eq!(t.entity.number_of_likes(), 1);
        assert_eq!(t.entity.reactions().likes(), &[z]);

        let t = f.engine.toggle_dislike(f.comment, z).await.unwrap();
        assert_eq!(t.entity.number_of_likes(), 0);
        assert_eq!(t.entity.number_of_dislikes(), 1);

        let stored = f.store.comment(f.comment).await.unwrap().unwrap();
        assert!(stored.counts_consistent());
    }

    #[tokio::test]
    async fn emoji_independent_across_keys() {
        let f = fixture().await;
        let u = UserId::new();

        f.engine.toggle_emoji(f.comment, u, "🎉").await.unwrap();
        f.engine.toggle_emoji(f.comment, u, "👍").await.unwrap();
        let t = f.engine.toggle_emoji(f.comment, u, "👍").await.unwrap();

        assert!(!t.active());
        let party = ReactionKind::emoji("🎉").unwrap();
        assert!(t.entity.reactions().contains(u, &party));
        assert_eq!(t.entity.number_of_likes(), 0);
    }

    #[tokio::test]
    async fn empty_emoji_is_invalid() {
        let f = fixture().await;
        let err = f
            .engine
            .toggle_emoji(f.comment, UserId::new(), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn missing_entity_is_not_found() {
        let f = fixture().await;
        let err = f
            .engine
            .toggle_like(BlogId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::not_found("blog"));

        let err = f
            .engine
            .toggle_dislike(CommentId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::not_found("comment"));
    }

    #[tokio::test]
    async fn blog_toggle_broadcasts_reaction_update() {
        let f = fixture().await;
        let mut stream = f.hub.subscribe(EventFilter::default());
        let x = UserId::new();

        f.engine.toggle_like(f.blog, x).await.unwrap();

        let event = stream.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::ReactionUpdate);
        match event.payload {
            EventPayload::BlogReactions(summary) => {
                assert_eq!(summary.blog_id, f.blog);
                assert_eq!(summary.likes, vec![x]);
                assert!(summary.dislikes.is_empty());
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn blog_emoji_toggle_carries_emoji_state() {
        let f = fixture().await;
        let mut stream = f.hub.subscribe(EventFilter::default());
        let x = UserId::new();

        f.engine.toggle_emoji(f.blog, x, "🔥").await.unwrap();

        let event = stream.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::ReactionUpdate);
        match event.payload {
            EventPayload::BlogReactions(summary) => {
                assert_eq!(summary.reactions.get("🔥"), Some(&vec![x]));
                assert!(summary.likes.is_empty());
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn comment_toggle_broadcasts_update_comment() {
        let f = fixture().await;
        let mut stream = f.hub.subscribe(EventFilter::default());

        f.engine.toggle_dislike(f.comment, UserId::new()).await.unwrap();

        let event = stream.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::UpdateComment);
        assert_eq!(event.blog_id, f.blog);
    }

    #[tokio::test]
    async fn failed_toggle_broadcasts_nothing() {
        let f = fixture().await;
        let mut stream = f.hub.subscribe(EventFilter::default());
        let _ = f.engine.toggle_like(CommentId::new(), UserId::new()).await;
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_users_converge() {
        let f = fixture().await;
        let mut handles = Vec::new();
        for _ in 0..50 {
            let engine = f.engine.clone();
            let blog = f.blog;
            handles.push(tokio::spawn(async move {
                engine.toggle_like(blog, UserId::new()).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let blog = f.store.blog(f.blog).await.unwrap().unwrap();
        assert_eq!(blog.reactions().like_count(), 50);
    }
}
