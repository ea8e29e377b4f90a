//! Backend trait for resolving references into content.
//!
//! The navigation engine never talks to the network directly. Anything
//! that can turn a [`ContentReference`] into bytes plus a declared content
//! type implements [`Resolver`]: the HTTP gateway in `dweb-node`, or a
//! scripted fake in tests.

use async_trait::async_trait;

use crate::error::{DwebError, Result};
use crate::reference::ContentReference;

/// Raw result of a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// HTTP-style status code (200 on success).
    pub status: u16,
    /// Declared `content-type`, if the collaborator reported one.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Resolved {
    /// A 200 response with the given content type and body.
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type without parameters, lowercased (`text/html; charset=utf-8`
    /// becomes `text/html`). Empty when none was declared.
    pub fn media_type(&self) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|mt| mt.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.body).map_err(|e| DwebError::Decode(e.to_string()))
    }
}

/// The resolution collaborator.
///
/// Single-threaded: futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait Resolver {
    async fn resolve(&self, reference: &ContentReference) -> Result<Resolved>;
}
