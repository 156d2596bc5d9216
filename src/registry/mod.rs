//! Declarative protocol registry and its expansion into concrete feeds.
//!
//! - [`model`] - protocol, source and resolved-feed types
//! - [`protocols`] - the built-in registry table
//! - [`resolver`] - pure `(Protocol, Source) -> ResolvedFeed` mapping

mod model;
mod protocols;
mod resolver;

pub use model::{Category, Protocol, ResolvedFeed, Source, SourceType};
pub use protocols::{find, PROTOCOLS};
pub use resolver::{derive_html_url, find_unresolved, resolve, resolve_all};
