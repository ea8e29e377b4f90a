//! Shared test utilities for the navigation engine.
//!
//! Provides a [`FakeResolver`] that serves scripted content, records every
//! resolution call, and can hold a resolution open until the test releases
//! it.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use dweb_types::backend::{Resolved, Resolver};
use dweb_types::error::{DwebError, Result};
use dweb_types::reference::ContentReference;
use futures::channel::oneshot;

/// A scripted resolver keyed by canonical reference string.
///
/// Unknown references resolve to a 404.
#[derive(Default)]
pub struct FakeResolver {
    pages: HashMap<String, Resolved>,
    failures: HashMap<String, String>,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    calls: RefCell<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, reference: &str, content_type: &str, body: &str) -> Self {
        self.pages
            .insert(reference.to_string(), Resolved::ok(content_type, body));
        self
    }

    pub fn with_response(mut self, reference: &str, resolved: Resolved) -> Self {
        self.pages.insert(reference.to_string(), resolved);
        self
    }

    pub fn with_failure(mut self, reference: &str, message: &str) -> Self {
        self.failures
            .insert(reference.to_string(), message.to_string());
        self
    }

    /// Hold the next resolution of `reference` until the returned sender
    /// fires (or is dropped).
    pub fn gate(&self, reference: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(reference.to_string(), rx);
        tx
    }

    /// References resolved so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Resolver for FakeResolver {
    async fn resolve(&self, reference: &ContentReference) -> Result<Resolved> {
        let key = reference.to_string();
        self.calls.borrow_mut().push(key.clone());

        let gate = self.gates.borrow_mut().remove(&key);
        if let Some(gate) = gate {
            // A dropped sender releases the gate too.
            let _ = gate.await;
        }

        if let Some(message) = self.failures.get(&key) {
            return Err(DwebError::Resolution(message.clone()));
        }
        Ok(self.pages.get(&key).cloned().unwrap_or(Resolved {
            status: 404,
            content_type: Some("text/plain".to_string()),
            body: b"not found".to_vec(),
        }))
    }
}
