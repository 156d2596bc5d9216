//! Curated RSS/Atom registry for blockchain projects.
//!
//! The registry declares, per protocol, where its publications live. The
//! crate resolves those declarations into concrete feed URLs, probes them
//! for liveness, reconciles them against a persisted OPML store, and looks
//! for feeds the registry does not know about yet.

pub mod config;
pub mod discovery;
pub mod feed;
pub mod reconcile;
pub mod registry;
pub mod report;
pub mod util;
