//! Client-side navigation engine.
//!
//! Turns a content reference into displayed page state and keeps that
//! state, the address-bar fragment and the history stack in step:
//!
//! - [`normalize`] canonicalizes gateway URLs, bare `/ipfs/` paths and
//!   scheme URLs into `ipfs://<id>`.
//! - [`rewrite`] finds embedded references in rendered text and turns them
//!   into link elements; [`bind`] maps those links (and view controls) to
//!   the navigation payloads they trigger.
//! - [`render`] classifies resolved content and builds the page tree.
//! - [`history`] is the session history the controller writes to.
//! - [`controller`] ties it together in the [`NavigationController`].

pub mod bind;
pub mod controller;
pub mod history;
pub mod markup;
pub mod normalize;
pub mod render;
pub mod rewrite;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use bind::{BoundLink, LinkTable, ViewAction};
pub use controller::{NavOutcome, NavState, NavigationController};
pub use history::{History, HistoryEntry, SessionHistory};
pub use markup::Node;
pub use normalize::normalize;
pub use rewrite::{DiscoveredLink, Rewritten, rewrite_links};
