//! Bridge core between the synchronous SCORM runtime contract and the
//! asynchronous LMS persistence service.
//!
//! Embedded content expects blocking get/set calls that return immediately;
//! the record of that data lives behind asynchronous network calls. This
//! crate reconciles the two with a session-scoped value cache, a per-read
//! resolver, and an ordered write queue that batches pending writes through
//! at most one in-flight exchange. Concrete browser transport and DOM wiring
//! live in `lms_bridge_web`; everything here is runtime-agnostic and tested
//! natively.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod bootstrap;
pub mod cache;
pub mod display;
pub mod queue;
pub mod resolver;
pub mod service;

pub use api::RuntimeApi;
pub use bootstrap::{bootstrap_session, SessionBridge};
pub use cache::{UncachedKeySet, ValueCache};
pub use display::{
    FullscreenPresenter, MemoryFullscreenPresenter, MemoryStatusSink, NoopFullscreenPresenter,
    NoopStatusSink, StatusSink,
};
pub use queue::{LocalPoolTaskSpawner, QueueTask, TaskSpawner, WriteQueue};
pub use resolver::ReadResolver;
pub use service::{LmsService, LmsServiceFuture, MemoryLmsService, NoopLmsService};
