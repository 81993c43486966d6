//! Server-Sent Events transport for the broadcast channel.
//!
//! Each connection subscribes to the hub with its own filter. Events are
//! sent with the event kind as the SSE event name and the payload snapshot
//! as data. An observer that falls behind gets a `lagged` event carrying
//! the number of skipped events and keeps receiving from there.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use quill_fabric::{EventFilter, EventKind, EventStream, PlatformEvent};
use quill_types::BlogId;

use crate::error::{ApiError, ApiResult};
use crate::reply::parse_id;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventQuery {
    pub blog_id: Option<String>,
    /// Comma-separated event names.
    pub kinds: Option<String>,
}

impl EventQuery {
    pub fn filter(&self) -> ApiResult<EventFilter> {
        let blog = self
            .blog_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_id::<BlogId>)
            .transpose()?;
        let kinds = self
            .kinds
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|list| {
                list.split(',')
                    .map(|k| k.parse::<EventKind>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(ApiError::Malformed)?;
        Ok(EventFilter { kinds, blog })
    }
}

/// What an observer receives next.
#[derive(Clone, Debug, PartialEq)]
pub enum Delivery {
    Event(PlatformEvent),
    Lagged(u64),
}

/// Turn a hub subscription into a stream that ends when the hub goes away.
pub fn deliveries(rx: EventStream) -> impl Stream<Item = Delivery> {
    stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(event) => Some((Delivery::Event(event), rx)),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event observer lagging");
                Some((Delivery::Lagged(skipped), rx))
            }
            Err(RecvError::Closed) => None,
        }
    })
}

fn to_sse(delivery: Delivery) -> Event {
    match delivery {
        Delivery::Event(event) => {
            let data = event.payload_json().unwrap_or_else(|e| {
                warn!(error = %e, seq = event.sequence, "event payload encoding failed");
                "null".to_string()
            });
            Event::default()
                .event(event.kind.name())
                .id(event.sequence.to_string())
                .data(data)
        }
        Delivery::Lagged(skipped) => Event::default().event("lagged").data(skipped.to_string()),
    }
}

pub async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let filter = query.filter()?;
    debug!(?filter, "event observer connected");
    let rx = state.hub.subscribe(filter);
    let events = deliveries(rx).map(|d| Ok::<_, Infallible>(to_sse(d)));
    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
