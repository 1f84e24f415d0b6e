//! # livelist
//!
//! A live-list reconciliation client for admin-console views: keep an
//! in-memory ordered list of entities synchronized with server-side state
//! using an initial REST snapshot plus an incremental WebSocket push
//! channel, tolerating channel drops with fixed-delay reconnects.
//!
//! The moving parts:
//!
//! - [`kind::ListKind`] — per-kind configuration (resource path, payload
//!   field, identity-key fields), injected explicitly.
//! - [`snapshot::SnapshotSource`] / [`channel::ChannelFactory`] — the two
//!   external collaborators: full-list fetch and push channel.
//! - [`state::ListState`] — merge-by-key reconciliation with an observer
//!   contract (`tokio::sync::watch`).
//! - [`client::LiveListClient`] — ties them together: initialize, connect,
//!   reconnect on loss, refresh wholesale on completion events, disconnect
//!   on teardown.
//!
//! ```rust,ignore
//! let mut client = LiveListClient::builder(
//!         ListKind::documents(),
//!         HttpSnapshotSource::new("http://localhost:8080"),
//!         WsChannelFactory::new("http://localhost:8080"),
//!     )
//!     .scope(ScopeFilter::field_equals("project", "alpha"))
//!     .build();
//! client.initialize().await?;
//! client.connect();
//! let mut views = client.subscribe();
//! while views.changed().await.is_ok() {
//!     redraw(&views.borrow());
//! }
//! ```

pub mod channel;
pub mod cli;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod kind;
pub mod snapshot;
pub mod state;

pub use channel::{ChannelEvent, ChannelFactory, ListChannel, WsChannelFactory};
pub use client::{LiveListClient, LiveListClientBuilder};
pub use entity::{Entity, ListKey};
pub use error::LiveListError;
pub use event::{EventError, ListEvent};
pub use kind::{ListKind, ScopeFilter};
pub use snapshot::{HttpSnapshotSource, SnapshotPage, SnapshotQuery, SnapshotSource, SortOrder};
pub use state::{ListState, ListView, UpsertOutcome};
