//! Persistence store for Quill.
//!
//! The store is the only shared mutable resource in the system. Backends
//! implement [`UserStore`], [`BlogStore`], and [`CommentStore`]; anything
//! implementing all three is a [`Store`].
//!
//! # Design Rules
//!
//! 1. Reaction toggles are applied by the backend as one conditional update
//!    (`toggle_blog_reaction`, `toggle_comment_reaction`). Callers never read
//!    a reaction set, change it, and write it back.
//! 2. Content changes go through `modify_*`, which runs the mutation against
//!    the current record inside the backend's critical section.
//! 3. No operation spans more than one record atomically. A blog delete and
//!    the delete of its comments are two separate calls.
//! 4. Listings are returned newest first.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::{BlogMutation, BlogStore, CommentMutation, CommentStore, Store, UserMutation, UserStore};
