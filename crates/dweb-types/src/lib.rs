//! Foundation types for dweb-nav.
//!
//! Shared by every crate in the workspace: the canonical
//! [`ContentReference`], the [`PageState`] snapshot stored in navigation
//! history, TOML configuration, the resolver seam, and the error type.

pub mod backend;
pub mod config;
pub mod error;
pub mod page;
pub mod reference;

pub use backend::{Resolved, Resolver};
pub use config::{BrowserSettings, DwebConfig, NodeSettings};
pub use error::{DwebError, ErrorKind, Result};
pub use page::PageState;
pub use reference::{ContentReference, Scheme};
