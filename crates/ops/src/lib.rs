//! Applies server-sent DOM operation batches to an [`html::Document`].
//!
//! A batch maps operation names to descriptor arrays. The [`Engine`] walks it
//! in order, resolves each descriptor's target, and runs the matching
//! handler between a cancelable `before-<kind>` and an `after-<kind>` event.
//! Failures stay local to their entry and come back as [`Diagnostic`]s.
//!
//! ```
//! use html::Document;
//! use ops::{BatchOptions, Engine, OperationBatch};
//!
//! let mut engine = Engine::in_memory(Document::parse(r#"<div id="x"></div>"#));
//! let batch = OperationBatch::from_json(
//!     r##"{"setAttribute":[{"selector":"#x","name":"data-state","value":"open"}]}"##,
//! )
//! .unwrap();
//! let report = engine.perform(&batch, BatchOptions::default());
//! assert!(report.is_clean());
//! assert_eq!(
//!     engine.document().outer_html(engine.document().element_by_id("x").unwrap()),
//!     r#"<div id="x" data-state="open"></div>"#
//! );
//! ```

mod batch;
mod catalog;
mod config;
mod driver;
mod env;
mod error;
mod events;
mod hooks;
mod kind;
mod reconcile;
mod resolve;

pub use batch::{Descriptor, OperationBatch, OperationGroup};
pub use config::{BatchOptions, DEFAULT_PERMANENT_ATTRIBUTE, EngineConfig};
pub use driver::{BatchReport, Engine};
pub use env::{
    Console, ConsoleLevel, Cookie, CookieJar, Environment, HistoryEntry, LogConsole, MemoryEnvironment,
    MemoryNotifications, MemoryStorage, Notifications, PendingNotification, Permission, Storage,
    StorageKind,
};
pub use error::{BatchDecodeError, ConfigError, Diagnostic, OperationError, PerformError, Severity};
pub use events::{Event, EventBus, EventPayload, ListenerId};
pub use hooks::{HookId, HookRegistry, MergeContext, OnUpdated, ShouldUpdate, skip_equal_nodes, skip_permanent};
pub use kind::{OperationKind, UnknownKind};
pub use resolve::{ResolveError, describe_node, resolve, try_resolve};
