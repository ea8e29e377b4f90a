//! Session history: back stack, current entry, forward stack, and the
//! address-bar fragment.

use dweb_types::page::PageState;

/// A single entry in the session history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Page snapshot stored on a successful load.
    pub state: Option<PageState>,
    /// Fragment the address bar showed when the entry was written.
    pub fragment: Option<String>,
}

impl HistoryEntry {
    /// Entry for a committed page.
    pub fn page(state: PageState, fragment: Option<String>) -> Self {
        Self {
            state: Some(state),
            fragment,
        }
    }

    /// An entry with no state and no fragment.
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.state.is_none() && self.fragment.is_none()
    }
}

/// History surface the navigation controller writes to.
///
/// `go_back`/`go_forward` return the entry that became current, which is
/// what a history event delivers to the controller.
pub trait History {
    /// Append an entry after the current one, discarding forward entries.
    fn push(&mut self, entry: HistoryEntry);

    /// Swap the current entry in place.
    fn replace(&mut self, entry: HistoryEntry);

    /// Update the address-bar fragment without touching any entry.
    fn set_fragment(&mut self, fragment: &str);

    /// Current address-bar fragment, if any.
    fn fragment(&self) -> Option<&str>;

    fn go_back(&mut self) -> Option<HistoryEntry>;

    fn go_forward(&mut self) -> Option<HistoryEntry>;

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;
}

/// In-memory session history.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    back_stack: Vec<HistoryEntry>,
    forward_stack: Vec<HistoryEntry>,
    current: HistoryEntry,
    fragment: Option<String>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history whose initial entry was opened at `fragment` (a deep link).
    pub fn with_fragment(fragment: &str) -> Self {
        let fragment = Some(fragment.to_string());
        Self {
            current: HistoryEntry {
                state: None,
                fragment: fragment.clone(),
            },
            fragment,
            ..Self::default()
        }
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.current
    }

    /// Entries most recent first: the current entry followed by the back
    /// stack in reverse chronological order.
    pub fn entries(&self) -> Vec<&HistoryEntry> {
        let mut entries = vec![&self.current];
        entries.extend(self.back_stack.iter().rev());
        entries
    }

    /// Total number of entries, forward entries included.
    pub fn len(&self) -> usize {
        self.back_stack.len() + 1 + self.forward_stack.len()
    }

    /// Always false: a session has at least its initial entry.
    pub fn is_empty(&self) -> bool {
        false
    }

    fn make_current(&mut self, entry: HistoryEntry) {
        self.fragment = entry.fragment.clone();
        self.current = entry;
    }
}

impl History for SessionHistory {
    fn push(&mut self, entry: HistoryEntry) {
        let previous = std::mem::take(&mut self.current);
        self.back_stack.push(previous);
        self.forward_stack.clear();
        self.make_current(entry);
    }

    fn replace(&mut self, entry: HistoryEntry) {
        self.make_current(entry);
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.fragment = Some(fragment.to_string());
    }

    fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    fn go_back(&mut self) -> Option<HistoryEntry> {
        let prev = self.back_stack.pop()?;
        let current = std::mem::take(&mut self.current);
        self.forward_stack.push(current);
        self.make_current(prev.clone());
        Some(prev)
    }

    fn go_forward(&mut self) -> Option<HistoryEntry> {
        let next = self.forward_stack.pop()?;
        let current = std::mem::take(&mut self.current);
        self.back_stack.push(current);
        self.make_current(next.clone());
        Some(next)
    }

    fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    fn can_go_forward(&self) -> bool {
        !self.forward_stack.is_empty()
    }
}
