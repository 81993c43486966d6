use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{required, TypeError};
use crate::id::{BlogId, CommentId, UserId};
use crate::reaction::{Reactable, ReactionKind, ReactionSet, ToggleOutcome};

/// Input for creating a comment.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

/// A comment on a blog post, optionally replying to another comment.
///
/// `number_of_likes` and `number_of_dislikes` always equal the sizes of the
/// like and dislike sets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub user_id: UserId,
    pub post_id: BlogId,
    pub parent_id: Option<CommentId>,
    #[serde(flatten)]
    reactions: ReactionSet,
    number_of_likes: u64,
    number_of_dislikes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: UserId, post: BlogId, input: NewComment) -> Result<Self, TypeError> {
        let content = required("content", &input.content)?;
        let now = Utc::now();
        Ok(Self {
            id: CommentId::new(),
            content,
            user_id: author,
            post_id: post,
            parent_id: input.parent_id,
            reactions: ReactionSet::new(),
            number_of_likes: 0,
            number_of_dislikes: 0,
            edited_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }

    /// Replace the content and stamp the edit time.
    pub fn edit(&mut self, content: &str) -> Result<(), TypeError> {
        self.content = required("content", content)?;
        let now = Utc::now();
        self.edited_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn number_of_likes(&self) -> u64 {
        self.number_of_likes
    }

    pub fn number_of_dislikes(&self) -> u64 {
        self.number_of_dislikes
    }

    /// Returns `true` if the stored counts match the sets.
    pub fn counts_consistent(&self) -> bool {
        self.number_of_likes == self.reactions.like_count()
            && self.number_of_dislikes == self.reactions.dislike_count()
    }
}

impl Reactable for Comment {
    fn reactions(&self) -> &ReactionSet {
        &self.reactions
    }

    fn apply_reaction(&mut self, user: UserId, kind: &ReactionKind) -> ToggleOutcome {
        let outcome = self.reactions.toggle(user, kind);
        self.number_of_likes = self.reactions.like_count();
        self.number_of_dislikes = self.reactions.dislike_count();
        self.updated_at = Utc::now();
        outcome
    }
}
