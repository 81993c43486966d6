use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use quill_types::{Blog, BlogId, Comment, CommentId};

use crate::event::{BlogReactions, EventKind, EventPayload, PlatformEvent};

/// Filter for subscribing to a subset of platform events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<EventKind>>,
    /// If set, only events about this blog are delivered.
    pub blog: Option<BlogId>,
}

impl EventFilter {
    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &PlatformEvent) -> bool {
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        if let Some(blog) = self.blog {
            if event.blog_id != blog {
                return false;
            }
        }
        true
    }
}

/// A broadcast channel receiver for platform events.
pub type EventStream = broadcast::Receiver<PlatformEvent>;

struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<PlatformEvent>,
}

/// Configuration for the [`EventHub`].
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Capacity of each subscriber's channel. A subscriber that falls this
    /// far behind loses the oldest events.
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Fan-out hub delivering events to matching subscribers.
///
/// Shared by reference (`Arc<EventHub>`) between the engine, which
/// publishes, and the transport layer, which subscribes on behalf of
/// connected observers.
pub struct EventHub {
    subscribers: RwLock<Vec<Subscriber>>,
    sequence: AtomicU64,
    config: HubConfig,
}

impl EventHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
            config,
        }
    }

    /// Register a new subscriber with the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        let (tx, rx) = broadcast::channel(self.config.channel_capacity.max(1));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber { filter, sender: tx });
        debug!(subscribers = self.subscriber_count(), "observer subscribed");
        rx
    }

    /// Publish an event to every matching subscriber.
    ///
    /// Fire-and-forget: returns the number of subscribers the event was
    /// handed to. Subscribers whose receivers are gone are pruned.
    pub fn publish(&self, kind: EventKind, blog_id: BlogId, payload: EventPayload) -> usize {
        let mut subs = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Sequence is taken under the lock so delivery order matches it.
        let event = PlatformEvent {
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            kind,
            blog_id,
            payload,
            emitted_at: Utc::now(),
        };

        let mut delivered = 0;
        subs.retain(|sub| {
            if sub.sender.receiver_count() == 0 {
                return false;
            }
            if sub.filter.matches(&event) && sub.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
            true
        });

        trace!(seq = event.sequence, kind = %event.kind, blog = %blog_id, delivered, "event published");
        delivered
    }

    pub fn new_comment(&self, comment: &Comment) -> usize {
        self.publish(
            EventKind::NewComment,
            comment.post_id,
            EventPayload::Comment(comment.clone()),
        )
    }

    pub fn update_comment(&self, comment: &Comment) -> usize {
        self.publish(
            EventKind::UpdateComment,
            comment.post_id,
            EventPayload::Comment(comment.clone()),
        )
    }

    pub fn delete_comment(&self, blog_id: BlogId, comment_ids: Vec<CommentId>) -> usize {
        self.publish(
            EventKind::DeleteComment,
            blog_id,
            EventPayload::CommentRemoved {
                comment_ids,
                blog_id,
            },
        )
    }

    pub fn reaction_update(&self, blog: &Blog) -> usize {
        self.publish(
            EventKind::ReactionUpdate,
            blog.id,
            EventPayload::BlogReactions(BlogReactions::from(blog)),
        )
    }

    /// Current number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::{NewBlog, NewComment, UserId};

    fn blog() -> Blog {
        Blog::new(
            UserId::new(),
            NewBlog {
                title: "Hello".into(),
                category: "tech".into(),
            },
        )
        .unwrap()
    }

    fn comment_on(blog: BlogId) -> Comment {
        Comment::new(
            UserId::new(),
            blog,
            NewComment {
                content: "nice post".into(),
                parent_id: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let hub = EventHub::default();
        assert_eq!(hub.reaction_update(&blog()), 0);
    }

    #[test]
    fn subscriber_receives_matching_kinds_only() {
        let hub = EventHub::default();
        let b = blog();
        let mut stream = hub.subscribe(EventFilter {
            kinds: Some(vec![EventKind::NewComment]),
            ..Default::default()
        });

        hub.reaction_update(&b);
        hub.new_comment(&comment_on(b.id));

        let received = stream.try_recv().unwrap();
        assert_eq!(received.kind, EventKind::NewComment);
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn blog_filter() {
        let hub = EventHub::default();
        let b1 = blog();
        let b2 = blog();
        let mut stream = hub.subscribe(EventFilter {
            blog: Some(b1.id),
            ..Default::default()
        });

        hub.reaction_update(&b2);
        hub.reaction_update(&b1);

        let received = stream.try_recv().unwrap();
        assert_eq!(received.blog_id, b1.id);
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn late_subscriber_gets_no_replay() {
        let hub = EventHub::default();
        let b = blog();
        hub.reaction_update(&b);

        let mut stream = hub.subscribe(EventFilter::default());
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = EventHub::default();
        let keep = hub.subscribe(EventFilter::default());
        let gone = hub.subscribe(EventFilter::default());
        assert_eq!(hub.subscriber_count(), 2);

        drop(gone);
        assert_eq!(hub.reaction_update(&blog()), 1);
        assert_eq!(hub.subscriber_count(), 1);
        drop(keep);
    }

    #[test]
    fn sequence_is_monotonic() {
        let hub = EventHub::default();
        let b = blog();
        let mut stream = hub.subscribe(EventFilter::default());
        hub.reaction_update(&b);
        hub.update_comment(&comment_on(b.id));
        hub.delete_comment(b.id, vec![CommentId::new()]);

        let first = stream.try_recv().unwrap();
        let second = stream.try_recv().unwrap();
        let third = stream.try_recv().unwrap();
        assert!(first.sequence < second.sequence);
        assert!(second.sequence < third.sequence);
        assert_eq!(third.kind, EventKind::DeleteComment);
    }

    #[test]
    fn slow_subscriber_lags_instead_of_blocking() {
        let hub = EventHub::new(HubConfig {
            channel_capacity: 2,
        });
        let b = blog();
        let mut stream = hub.subscribe(EventFilter::default());
        for _ in 0..5 {
            hub.reaction_update(&b);
        }
        assert!(matches!(
            stream.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
    }

    #[test]
    fn concurrent_publishers_deliver_in_sequence_order() {
        let hub = std::sync::Arc::new(EventHub::new(HubConfig {
            channel_capacity: 1024,
        }));
        let mut stream = hub.subscribe(EventFilter::default());

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let hub = std::sync::Arc::clone(&hub);
                let b = blog();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        hub.reaction_update(&b);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let mut last = 0;
        let mut received = 0;
        while let Ok(event) = stream.try_recv() {
            assert!(event.sequence > last, "{} after {}", event.sequence, last);
            last = event.sequence;
            received += 1;
        }
        assert_eq!(received, 400);
    }

    #[tokio::test]
    async fn async_receive() {
        let hub = std::sync::Arc::new(EventHub::default());
        let b = blog();
        let mut stream = hub.subscribe(EventFilter::default());

        let publisher = std::sync::Arc::clone(&hub);
        let blog_id = b.id;
        tokio::spawn(async move {
            publisher.reaction_update(&b);
        });

        let event = stream.recv().await.unwrap();
        assert_eq!(event.blog_id, blog_id);
        match event.payload {
            EventPayload::BlogReactions(summary) => assert!(summary.likes.is_empty()),
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
