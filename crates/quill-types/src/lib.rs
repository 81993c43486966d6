//! Foundation types for the Quill blogging backend.
//!
//! Every other Quill crate depends on `quill-types`. The crate holds no I/O:
//! it defines the records the store persists and the pure reaction algebra the
//! engine applies to them.
//!
//! # Key Types
//!
//! - [`UserId`], [`BlogId`], [`CommentId`] — UUID v7 identifiers
//! - [`User`] with its [`Credential`] (local password or federated identity)
//! - [`Blog`] and [`Comment`] — the reactable entities
//! - [`ReactionKind`] and [`ReactionSet`] — like/dislike/emoji membership
//!   with mutual exclusion between like and dislike

pub mod blog;
pub mod comment;
pub mod error;
pub mod id;
pub mod reaction;
pub mod user;

pub use blog::{Blog, BlogUpdate, NewBlog};
pub use comment::{Comment, NewComment};
pub use error::TypeError;
pub use id::{BlogId, CommentId, UserId};
pub use reaction::{Reactable, ReactionKind, ReactionSet, ToggleOutcome, MAX_EMOJI_LEN};
pub use user::{normalize_email, AuthorSummary, Credential, NewUser, ProfileUpdate, User, MAX_BIO_LEN};
