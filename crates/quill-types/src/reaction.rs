//! The reaction model shared by blogs and comments.
//!
//! A reaction is a user's membership in a named set. `Like` and `Dislike`
//! form one mutually exclusive group: joining one leaves the other. Every
//! emoji is an independent kind with no coupling to any other kind, so a user
//! may hold several emoji reactions at once alongside a like or a dislike.
//!
//! All operations here are pure; persistence and fan-out live in the store
//! and engine crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::UserId;

/// Longest emoji key accepted, in bytes. Covers multi-codepoint ZWJ
/// sequences and skin-tone modifiers.
pub const MAX_EMOJI_LEN: usize = 32;

/// A named reaction a user can toggle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum ReactionKind {
    Like,
    Dislike,
    Emoji(String),
}

impl ReactionKind {
    /// Build an emoji reaction kind, trimming surrounding whitespace.
    pub fn emoji(raw: &str) -> Result<Self, TypeError> {
        let emoji = raw.trim();
        if emoji.is_empty() {
            return Err(TypeError::MissingField { field: "emoji" });
        }
        if emoji.len() > MAX_EMOJI_LEN {
            return Err(TypeError::invalid(
                "emoji",
                format!("at most {MAX_EMOJI_LEN} bytes"),
            ));
        }
        Ok(Self::Emoji(emoji.to_string()))
    }

    /// The kind this one excludes, if it belongs to an exclusive group.
    pub fn opposite(&self) -> Option<ReactionKind> {
        match self {
            Self::Like => Some(Self::Dislike),
            Self::Dislike => Some(Self::Like),
            Self::Emoji(_) => None,
        }
    }

    /// Returns `true` for the like/dislike group.
    pub fn is_exclusive(&self) -> bool {
        self.opposite().is_some()
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Like => write!(f, "like"),
            Self::Dislike => write!(f, "dislike"),
            Self::Emoji(e) => write!(f, "emoji:{e}"),
        }
    }
}

/// Result of a single toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// The kind that was toggled.
    pub kind: ReactionKind,
    /// Membership of the user in `kind` after the toggle.
    pub active: bool,
    /// The opposing kind the user was removed from, if any.
    pub displaced: Option<ReactionKind>,
}

/// Reaction membership for one entity.
///
/// Sets keep insertion order so clients see reactors in the order they
/// arrived. Empty emoji sets are dropped from the map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSet {
    #[serde(default)]
    likes: Vec<UserId>,
    #[serde(default)]
    dislikes: Vec<UserId>,
    #[serde(default)]
    reactions: BTreeMap<String, Vec<UserId>>,
}

impl ReactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `user`'s membership in `kind`.
    ///
    /// Joining an exclusive kind removes the user from its opposite.
    pub fn toggle(&mut self, user: UserId, kind: &ReactionKind) -> ToggleOutcome {
        let was_member = self.contains(user, kind);
        let mut displaced = None;

        if was_member {
            self.remove(user, kind);
        } else {
            if let Some(opposite) = kind.opposite() {
                if self.remove(user, &opposite) {
                    displaced = Some(opposite);
                }
            }
            self.insert(user, kind);
        }

        ToggleOutcome {
            kind: kind.clone(),
            active: !was_member,
            displaced,
        }
    }

    /// Returns `true` if `user` currently holds `kind`.
    pub fn contains(&self, user: UserId, kind: &ReactionKind) -> bool {
        self.members(kind).contains(&user)
    }

    /// Users holding `kind`, in arrival order.
    pub fn members(&self, kind: &ReactionKind) -> &[UserId] {
        match kind {
            ReactionKind::Like => &self.likes,
            ReactionKind::Dislike => &self.dislikes,
            ReactionKind::Emoji(e) => self.reactions.get(e).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    pub fn likes(&self) -> &[UserId] {
        &self.likes
    }

    pub fn dislikes(&self) -> &[UserId] {
        &self.dislikes
    }

    /// Emoji reactions keyed by emoji.
    pub fn emoji(&self) -> &BTreeMap<String, Vec<UserId>> {
        &self.reactions
    }

    pub fn like_count(&self) -> u64 {
        self.likes.len() as u64
    }

    pub fn dislike_count(&self) -> u64 {
        self.dislikes.len() as u64
    }

    /// Every kind `user` currently holds.
    pub fn kinds_of(&self, user: UserId) -> Vec<ReactionKind> {
        let mut kinds = Vec::new();
        if self.likes.contains(&user) {
            kinds.push(ReactionKind::Like);
        }
        if self.dislikes.contains(&user) {
            kinds.push(ReactionKind::Dislike);
        }
        for (emoji, users) in &self.reactions {
            if users.contains(&user) {
                kinds.push(ReactionKind::Emoji(emoji.clone()));
            }
        }
        kinds
    }

    /// Check the set-level invariants: no duplicate reactor in any set, and
    /// no user in both likes and dislikes.
    pub fn is_consistent(&self) -> bool {
        fn unique(users: &[UserId]) -> bool {
            users
                .iter()
                .enumerate()
                .all(|(i, u)| !users[i + 1..].contains(u))
        }

        unique(&self.likes)
            && unique(&self.dislikes)
            && self.reactions.values().all(|u| !u.is_empty() && unique(u))
            && self.likes.iter().all(|u| !self.dislikes.contains(u))
    }

    fn insert(&mut self, user: UserId, kind: &ReactionKind) {
        let set = match kind {
            ReactionKind::Like => &mut self.likes,
            ReactionKind::Dislike => &mut self.dislikes,
            ReactionKind::Emoji(e) => self.reactions.entry(e.clone()).or_default(),
        };
        if !set.contains(&user) {
            set.push(user);
        }
    }

    fn remove(&mut self, user: UserId, kind: &ReactionKind) -> bool {
        match kind {
            ReactionKind::Like => remove_from(&mut self.likes, user),
            ReactionKind::Dislike => remove_from(&mut self.dislikes, user),
            ReactionKind::Emoji(e) => {
                let Some(set) = self.reactions.get_mut(e) else {
                    return false;
                };
                let removed = remove_from(set, user);
                if set.is_empty() {
                    self.reactions.remove(e);
                }
                removed
            }
        }
    }
}

fn remove_from(set: &mut Vec<UserId>, user: UserId) -> bool {
    let before = set.len();
    set.retain(|u| *u != user);
    set.len() != before
}

/// An entity carrying a [`ReactionSet`].
///
/// `apply_reaction` is the only way reaction state changes; implementors
/// keep any derived fields in step with the set.
pub trait Reactable {
    fn reactions(&self) -> &ReactionSet;

    fn apply_reaction(&mut self, user: UserId, kind: &ReactionKind) -> ToggleOutcome;
}
