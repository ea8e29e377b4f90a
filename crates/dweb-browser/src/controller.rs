//! Navigation controller.
//!
//! Owns the displayed page and the session history. A navigation goes
//! validate, show the loading view, update the fragment, resolve, classify
//! and render, rewrite links, then commit the [`PageState`] to history.
//!
//! Navigations may overlap: each one takes a generation number when it
//! starts, and a result that arrives after a newer navigation began is
//! dropped without touching the view or the history.

use std::cell::{Cell, Ref, RefCell};

use dweb_types::backend::Resolver;
use dweb_types::config::BrowserSettings;
use dweb_types::error::{DwebError, ErrorKind};
use dweb_types::page::PageState;
use dweb_types::reference::ContentReference;

use crate::bind::{LinkTable, ViewAction, bind_actions, bind_links};
use crate::history::{History, HistoryEntry, SessionHistory};
use crate::markup::Node;
use crate::normalize::normalize;
use crate::render::{error_view, loading_view, page_root, render_content, restore_root};
use crate::rewrite::rewrite_links;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Uninitialized,
    Loading(ContentReference),
    Displaying(PageState),
    /// The error view is shown; holds the message.
    Error(String),
}

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Displayed(PageState),
    Failed { kind: ErrorKind, message: String },
    /// A newer navigation started first; nothing was committed.
    Superseded,
}

impl NavOutcome {
    pub fn page(&self) -> Option<&PageState> {
        match self {
            NavOutcome::Displayed(page) => Some(page),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            NavOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// The displayed tree with its bound links and controls.
struct View {
    root: Node,
    links: LinkTable,
    actions: Vec<ViewAction>,
}

impl View {
    fn new(root: Node) -> Self {
        Self {
            links: bind_links(&root),
            actions: bind_actions(&root),
            root,
        }
    }
}

/// Drives resolution, rendering and history for one document.
///
/// Single-threaded: state lives behind `Cell`/`RefCell`, and no borrow is
/// held across a resolution.
pub struct NavigationController<R: Resolver, H: History = SessionHistory> {
    resolver: R,
    history: RefCell<H>,
    settings: BrowserSettings,
    view: RefCell<View>,
    home: RefCell<Option<PageState>>,
    state: RefCell<NavState>,
    generation: Cell<u64>,
    initialized: Cell<bool>,
}

impl<R: Resolver, H: History> NavigationController<R, H> {
    pub fn new(resolver: R, history: H, settings: BrowserSettings) -> Self {
        Self {
            resolver,
            history: RefCell::new(history),
            settings,
            view: RefCell::new(View::new(page_root(Vec::new()))),
            home: RefCell::new(None),
            state: RefCell::new(NavState::Uninitialized),
            generation: Cell::new(0),
            initialized: Cell::new(false),
        }
    }

    // -------------------------------------------------------------------
    // Entry points
    // -------------------------------------------------------------------

    /// Initial load. Opens the reference in the address-bar fragment if
    /// there is one, otherwise the default content (cached as home).
    ///
    /// Runs once; later calls return `None`.
    pub async fn bootstrap(&self) -> Option<NavOutcome> {
        if self.initialized.replace(true) {
            log::debug!("Bootstrap already ran");
            return None;
        }
        let deep_link = self
            .history
            .borrow()
            .fragment()
            .and_then(ContentReference::from_fragment);
        let outcome = match deep_link {
            Some(reference) => {
                log::info!("Opening deep link {reference}");
                self.navigate(&reference.to_string(), false).await
            },
            None => self.load_default().await,
        };
        Some(outcome)
    }

    /// Navigate to a canonical reference, pushing a history entry or
    /// replacing the current one.
    ///
    /// An unparsable reference shows the error view without resolving.
    pub async fn navigate(&self, reference: &str, push: bool) -> NavOutcome {
        let generation = self.next_generation();
        match ContentReference::parse(reference) {
            Ok(reference) => self.load(reference, push, generation).await,
            Err(e) => self.fail(e),
        }
    }

    /// Normalize raw text (a link payload or typed input) and navigate to
    /// it with a new history entry.
    pub async fn navigate_raw(&self, text: &str) -> NavOutcome {
        let reference = normalize(text);
        self.navigate(&reference, true).await
    }

    /// Activate the link at `index` in the displayed page.
    pub async fn activate_link(&self, index: usize) -> Option<NavOutcome> {
        let payload = self.view.borrow().links.get(index)?.reference.clone();
        Some(self.navigate_raw(&payload).await)
    }

    /// Handle a history event carrying the state of the entry that became
    /// current.
    ///
    /// A stored reference is re-resolved; a markup-only snapshot is shown
    /// as is; no state falls back to the cached home page, then to the
    /// default content.
    pub async fn on_history_event(&self, state: Option<PageState>) -> NavOutcome {
        match state {
            Some(PageState {
                reference: Some(reference),
                ..
            }) => self.navigate(&reference.to_string(), false).await,
            Some(page) => self.restore(page),
            None => {
                let home = self.home.borrow().clone();
                match home {
                    Some(page) => self.restore(page),
                    None => self.load_default().await,
                }
            },
        }
    }

    /// Show a stored snapshot without resolving anything.
    pub fn restore(&self, page: PageState) -> NavOutcome {
        self.next_generation();
        self.show(restore_root(&page.rendered_markup));
        match &page.reference {
            Some(reference) => {
                self.history.borrow_mut().set_fragment(&reference.to_fragment());
                log::info!("Restored {reference} from history");
            },
            None => log::info!("Restored cached page ({})", page.content_type),
        }
        *self.state.borrow_mut() = NavState::Displaying(page.clone());
        NavOutcome::Displayed(page)
    }

    /// History back. `None` when there is nothing to go back to.
    pub async fn back(&self) -> Option<NavOutcome> {
        let entry = self.history.borrow_mut().go_back()?;
        Some(self.on_history_event(entry.state).await)
    }

    /// History forward. `None` when there is nothing to go forward to.
    pub async fn forward(&self) -> Option<NavOutcome> {
        let entry = self.history.borrow_mut().go_forward()?;
        Some(self.on_history_event(entry.state).await)
    }

    /// Push a clean entry and load the default content into it.
    pub async fn go_home(&self) -> NavOutcome {
        self.history.borrow_mut().push(HistoryEntry::clean());
        self.load_default().await
    }

    /// Load the default content into the current entry and cache it as
    /// home.
    pub async fn load_default(&self) -> NavOutcome {
        let reference = normalize(&self.settings.default_reference);
        let outcome = self.navigate(&reference, false).await;
        if let NavOutcome::Displayed(page) = &outcome {
            *self.home.borrow_mut() = Some(page.clone());
        }
        outcome
    }

    /// Run a view control.
    pub async fn dispatch(&self, action: ViewAction) -> Option<NavOutcome> {
        match action {
            ViewAction::Back => self.back().await,
            ViewAction::Home => Some(self.go_home().await),
        }
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    pub fn state(&self) -> NavState {
        self.state.borrow().clone()
    }

    /// Serialized markup of the displayed tree.
    pub fn markup(&self) -> String {
        self.view.borrow().root.to_markup()
    }

    pub fn visible_text(&self) -> String {
        self.view.borrow().root.visible_text()
    }

    pub fn links(&self) -> LinkTable {
        self.view.borrow().links.clone()
    }

    /// Controls offered by the displayed view.
    pub fn actions(&self) -> Vec<ViewAction> {
        self.view.borrow().actions.clone()
    }

    pub fn history(&self) -> Ref<'_, H> {
        self.history.borrow()
    }

    /// Cached default page, once it has loaded.
    pub fn home(&self) -> Option<PageState> {
        self.home.borrow().clone()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn next_generation(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    async fn load(&self, reference: ContentReference, push: bool, generation: u64) -> NavOutcome {
        let fragment = reference.to_fragment();
        *self.state.borrow_mut() = NavState::Loading(reference.clone());
        self.show(loading_view(&reference));
        self.history.borrow_mut().set_fragment(&fragment);

        let result = self.resolver.resolve(&reference).await;
        if !self.is_current(generation) {
            log::debug!("Discarding superseded result for {reference}");
            return NavOutcome::Superseded;
        }

        let resolved = match result {
            Ok(resolved) if resolved.is_success() => resolved,
            Ok(resolved) => {
                return self.fail(DwebError::Resolution(format!(
                    "{reference} returned status {}",
                    resolved.status
                )));
            },
            Err(e @ DwebError::Resolution(_)) => return self.fail(e),
            Err(e) => return self.fail(DwebError::Resolution(format!("{reference}: {e}"))),
        };

        let rendered = render_content(&resolved);
        let rewritten = rewrite_links(&rendered.root);
        let page = PageState::new(
            reference.clone(),
            rewritten.root.to_markup(),
            &rendered.content_type,
        );
        self.show(rewritten.root);

        let entry = HistoryEntry::page(page.clone(), Some(fragment));
        {
            let mut history = self.history.borrow_mut();
            if push {
                history.push(entry);
            } else {
                history.replace(entry);
            }
        }

        log::info!(
            "Displaying {reference} as {:?} ({} links)",
            rendered.kind,
            rewritten.links.len()
        );
        *self.state.borrow_mut() = NavState::Displaying(page.clone());
        NavOutcome::Displayed(page)
    }

    fn fail(&self, error: DwebError) -> NavOutcome {
        let kind = error.kind();
        let message = error.to_string();
        log::warn!("Navigation failed: {message}");
        self.show(error_view(&error));
        *self.state.borrow_mut() = NavState::Error(message.clone());
        NavOutcome::Failed { kind, message }
    }

    fn show(&self, root: Node) {
        *self.view.borrow_mut() = View::new(root);
    }
}
