//! Page snapshots stored in navigation history.

use serde::{Deserialize, Serialize};

use crate::reference::ContentReference;

/// Snapshot of a successfully displayed page.
///
/// Written into history on every committed load and never mutated
/// afterwards; a later load produces a new `PageState`. `reference` is
/// the key needed to re-resolve the page, `rendered_markup` is the cached
/// result used when re-resolving is not wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ContentReference>,
    pub rendered_markup: String,
    pub content_type: String,
}

impl PageState {
    pub fn new(reference: ContentReference, rendered_markup: String, content_type: &str) -> Self {
        Self {
            reference: Some(reference),
            rendered_markup,
            content_type: content_type.to_string(),
        }
    }

    /// A markup-only snapshot with nothing to re-resolve.
    pub fn markup_only(rendered_markup: String, content_type: &str) -> Self {
        Self {
            reference: None,
            rendered_markup,
            content_type: content_type.to_string(),
        }
    }
}
