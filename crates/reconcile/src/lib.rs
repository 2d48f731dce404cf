//! # Reconcile
//!
//! Resource reconciliation between local files and a Grafana-compatible
//! server.
//!
//! The crate computes set differences between a local inventory of resources
//! and the live inventory on the server, and applies them with bounded
//! concurrency, optional stop-on-error and dry-run.
//!
//! ## Core Concepts
//!
//! - **Object** / **Resources**: opaque documents keyed by kind and name
//! - **Descriptor** / **Registry**: the kinds a server exposes, plus synthetic
//!   kinds (alert rules) that are served by a dedicated API
//! - **Filters**: which kinds and names an operation covers
//! - **Puller**, **Pusher**, **Deleter**: remote inventory operations
//! - **sync_delete**: remove remote objects that no longer exist locally
//!
//! Alert rules are split off at the selector layer with
//! [`split_alert_selectors`] and handled by [`alerts`], which mirrors the
//! generic operations with the same [`Summary`] / [`Aborted`] result.
//!
//! ## Example
//!
//! ```
//! use reconcile::backend::MockBackend;
//! use reconcile::{Registry, Resources, SyncRequest, append_synthetic_descriptors, sync_delete};
//!
//! let mock = MockBackend::new();
//! let registry = Registry::new(append_synthetic_descriptors(&[]));
//! let local = Resources::new();
//!
//! let summary = sync_delete(&SyncRequest::default(), &local, &registry, &mock).unwrap();
//! assert_eq!(summary.total(), 0);
//! ```
//!
//! ## Provider Traits
//!
//! - [`backend::ObjectApi`], [`backend::AlertRuleApi`], [`backend::DiscoveryApi`]:
//!   the server, either over HTTP or in memory
//! - [`ProgressCallback`]: receives progress updates from bulk operations
//!
//! This keeps the crate free of any terminal UI dependency.

pub mod alerts;
pub mod backend;
pub mod cancel;
pub mod codec;
pub mod context;
pub mod deleter;
pub mod descriptor;
pub mod error;
mod executor;
pub mod filter;
pub mod identity;
pub mod local;
pub mod object;
pub mod puller;
pub mod pusher;
pub mod resources;
pub mod selector;
pub mod sync;
pub mod types;

#[cfg(test)]
mod testutil;

// Re-export main types at crate root
pub use cancel::CancelToken;
pub use codec::Format;
pub use context::{LogProgress, NoProgress, ProgressCallback};
pub use deleter::{DeleteRequest, Deleter};
pub use descriptor::{
    Descriptor, Descriptors, Registry, SYNTHETIC_DESCRIPTORS, append_synthetic_descriptors,
};
pub use error::{Aborted, Error, ErrorCategory, Result};
pub use filter::{Filter, FilterType, Filters};
pub use identity::{KindId, ObjectId};
pub use local::{FsReader, FsWriter};
pub use object::{MANAGED_BY_ANNOTATION, MANAGER_ID, Object};
pub use puller::{PullRequest, Puller};
pub use pusher::{PushRequest, Pusher};
pub use resources::Resources;
pub use selector::{AlertSelection, split_alert_selectors};
pub use sync::{SyncRequest, sync_delete, sync_kinds};
pub use types::{DEFAULT_MAX_CONCURRENCY, ExecuteOptions, Summary};
