//! Realtime broadcast channel for Quill.
//!
//! The [`EventHub`] fans platform events out to every connected observer
//! whose [`EventFilter`] matches. Delivery is best effort: nothing is
//! persisted, there is no replay for late subscribers, and no observer ever
//! acknowledges an event. A slow observer lags and loses the oldest events
//! instead of slowing publishers down.

pub mod event;
pub mod hub;

pub use event::{BlogReactions, EventKind, EventPayload, PlatformEvent};
pub use hub::{EventFilter, EventHub, EventStream, HubConfig};
