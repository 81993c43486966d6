use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{required, TypeError};
use crate::id::{BlogId, CommentId, UserId};
use crate::reaction::{Reactable, ReactionKind, ReactionSet, ToggleOutcome};

/// Input for creating a blog post.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
}

/// A blog post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: BlogId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub author: UserId,
    pub category: String,
    #[serde(flatten)]
    reactions: ReactionSet,
    pub comments: Vec<CommentId>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    /// Validate input and build an unpublished post owned by `author`.
    pub fn new(author: UserId, input: NewBlog) -> Result<Self, TypeError> {
        let title = required("title", &input.title)?;
        let category = required("category", &input.category)?;
        let now = Utc::now();
        Ok(Self {
            id: BlogId::new(),
            title,
            subtitle: None,
            description: None,
            thumbnail: None,
            author,
            category,
            reactions: ReactionSet::new(),
            comments: Vec::new(),
            is_published: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.author == user
    }

    /// Apply a content update. `None` leaves a field untouched.
    pub fn apply_update(&mut self, update: BlogUpdate) -> Result<(), TypeError> {
        if let Some(title) = update.title {
            self.title = required("title", &title)?;
        }
        if let Some(category) = update.category {
            self.category = required("category", &category)?;
        }
        if update.subtitle.is_some() {
            self.subtitle = update.subtitle;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if update.thumbnail.is_some() {
            self.thumbnail = update.thumbnail;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Flip the published flag and return the new value.
    pub fn toggle_published(&mut self) -> bool {
        self.is_published = !self.is_published;
        self.updated_at = Utc::now();
        self.is_published
    }

    pub fn attach_comment(&mut self, comment: CommentId) {
        if !self.comments.contains(&comment) {
            self.comments.push(comment);
        }
    }

    /// Remove `ids` from the comment list; returns how many were present.
    pub fn detach_comments(&mut self, ids: &[CommentId]) -> usize {
        let before = self.comments.len();
        self.comments.retain(|c| !ids.contains(c));
        before - self.comments.len()
    }
}

impl Reactable for Blog {
    fn reactions(&self) -> &ReactionSet {
        &self.reactions
    }

    fn apply_reaction(&mut self, user: UserId, kind: &ReactionKind) -> ToggleOutcome {
        let outcome = self.reactions.toggle(user, kind);
        self.updated_at = Utc::now();
        outcome
    }
}

/// Partial content update for a blog post.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogUpdate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
}
