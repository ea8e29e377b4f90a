//! Canonical content references.
//!
//! A [`ContentReference`] is always `scheme://identifier`. Immutable content
//! lives under `ipfs://`, mutable names under `ipns://`. Gateway URLs and
//! bare `/ipfs/...` paths are turned into this form by the normalizer in
//! `dweb-browser`; this module only validates the canonical form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DwebError, Result};

/// Reference scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Immutable, content-addressed data.
    Content,
    /// Mutable name pointing at the latest content.
    Name,
}

impl Scheme {
    /// Scheme prefix including the `://` separator.
    pub fn prefix(self) -> &'static str {
        match self {
            Scheme::Content => "ipfs://",
            Scheme::Name => "ipns://",
        }
    }

    /// Root-relative path prefix (`/ipfs/` or `/ipns/`).
    pub fn path_prefix(self) -> &'static str {
        match self {
            Scheme::Content => "/ipfs/",
            Scheme::Name => "/ipns/",
        }
    }
}

/// A validated `scheme://identifier` reference.
///
/// The identifier may carry a sub-path (`ipfs://Qm.../docs/index.html`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentReference {
    scheme: Scheme,
    id: String,
}

impl ContentReference {
    /// Parse a canonical reference.
    ///
    /// Anything without a recognized scheme prefix, with an empty
    /// identifier, or with whitespace in the identifier is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let (scheme, id) = if let Some(rest) = text.strip_prefix(Scheme::Content.prefix()) {
            (Scheme::Content, rest)
        } else if let Some(rest) = text.strip_prefix(Scheme::Name.prefix()) {
            (Scheme::Name, rest)
        } else {
            return Err(DwebError::InvalidReference(format!(
                "unrecognized scheme in {text:?}"
            )));
        };

        if id.is_empty() || id.starts_with('/') {
            return Err(DwebError::InvalidReference(format!(
                "missing identifier in {text:?}"
            )));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(DwebError::InvalidReference(format!(
                "whitespace in identifier {id:?}"
            )));
        }

        Ok(Self {
            scheme,
            id: id.to_string(),
        })
    }

    /// Build a reference from an address-bar fragment such as
    /// `#/ipfs/<id>` (the leading `#` is optional).
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let path = fragment.strip_prefix('#').unwrap_or(fragment);
        [Scheme::Content, Scheme::Name].into_iter().find_map(|scheme| {
            let id = path.strip_prefix(scheme.path_prefix())?;
            Self::parse(&format!("{}{id}", scheme.prefix())).ok()
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Identifier (and optional sub-path) after the scheme prefix.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Root-relative path form, e.g. `/ipfs/<id>`.
    pub fn to_path(&self) -> String {
        format!("{}{}", self.scheme.path_prefix(), self.id)
    }

    /// Address-bar fragment form, e.g. `#/ipfs/<id>`.
    pub fn to_fragment(&self) -> String {
        format!("#{}", self.to_path())
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scheme.prefix(), self.id)
    }
}

impl FromStr for ContentReference {
    type Err = DwebError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentReference {
    type Error = DwebError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentReference> for String {
    fn from(value: ContentReference) -> Self {
        value.to_string()
    }
}
