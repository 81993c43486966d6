use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quill_types::{Blog, BlogId, Comment, CommentId, Reactable, UserId};

/// Classification of platform events. The wire name is the event name
/// observers subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A comment was created.
    NewComment,
    /// A comment's content or reactions changed.
    UpdateComment,
    /// A comment (and its replies) was removed.
    DeleteComment,
    /// A blog's like/dislike sets changed.
    ReactionUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        Self::NewComment,
        Self::UpdateComment,
        Self::DeleteComment,
        Self::ReactionUpdate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewComment => "newComment",
            Self::UpdateComment => "updateComment",
            Self::DeleteComment => "deleteComment",
            Self::ReactionUpdate => "reactionUpdate",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s.trim())
            .ok_or_else(|| format!("unknown event kind: {s}"))
    }
}

/// Blog reaction summary carried by `reactionUpdate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogReactions {
    pub blog_id: BlogId,
    pub likes: Vec<UserId>,
    pub dislikes: Vec<UserId>,
    /// Emoji reactions keyed by emoji.
    pub reactions: BTreeMap<String, Vec<UserId>>,
}

impl From<&Blog> for BlogReactions {
    fn from(blog: &Blog) -> Self {
        Self {
            blog_id: blog.id,
            likes: blog.reactions().likes().to_vec(),
            dislikes: blog.reactions().dislikes().to_vec(),
            reactions: blog.reactions().emoji().clone(),
        }
    }
}

/// Snapshot carried by an event. Always the full updated state, never a
/// delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Comment(Comment),
    BlogReactions(BlogReactions),
    #[serde(rename_all = "camelCase")]
    CommentRemoved {
        comment_ids: Vec<CommentId>,
        blog_id: BlogId,
    },
}

/// A single event flowing through the hub.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEvent {
    /// Hub-local publish order.
    pub sequence: u64,
    pub kind: EventKind,
    /// The blog the event concerns; used for filtering.
    pub blog_id: BlogId,
    pub payload: EventPayload,
    pub emitted_at: DateTime<Utc>,
}

impl PlatformEvent {
    /// The payload as JSON, as delivered to observers.
    pub fn payload_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.payload)
    }
}
