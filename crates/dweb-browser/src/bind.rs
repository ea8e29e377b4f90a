//! Event binding for displayed trees.
//!
//! Generated markup carries no handler code. Links expose their payload
//! through `data-ref`, view controls through `data-action`; the binder
//! collects both into plain tables the controller dispatches from. The
//! same binder runs on freshly rendered pages and on markup restored from
//! history, so both paths end up with identical tables.

use crate::markup::Node;
use crate::rewrite::REF_ATTR;

/// Attribute naming a view control's action.
pub const ACTION_ATTR: &str = "data-action";

/// A link the user can activate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundLink {
    pub label: String,
    /// Raw payload handed to the navigation entry point.
    pub reference: String,
}

/// Links of the displayed page, indexed in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: Vec<BoundLink>,
}

impl LinkTable {
    pub fn get(&self, index: usize) -> Option<&BoundLink> {
        self.links.get(index)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundLink> {
        self.links.iter()
    }
}

/// Controls offered by non-page views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    /// Native history back-navigation.
    Back,
    /// Push a clean entry and load the default content.
    Home,
}

impl ViewAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewAction::Back => "back",
            ViewAction::Home => "home",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "back" => Some(ViewAction::Back),
            "home" => Some(ViewAction::Home),
            _ => None,
        }
    }
}

/// Collect every `a[data-ref]` under `root`.
pub fn bind_links(root: &Node) -> LinkTable {
    let mut links = Vec::new();
    walk(root, &mut |node| {
        if let Node::Element(el) = node
            && el.tag == "a"
            && let Some(reference) = el.attr(REF_ATTR)
        {
            links.push(BoundLink {
                label: node.visible_text(),
                reference: reference.to_string(),
            });
        }
    });
    LinkTable { links }
}

/// Collect every `[data-action]` control under `root`.
pub fn bind_actions(root: &Node) -> Vec<ViewAction> {
    let mut actions = Vec::new();
    walk(root, &mut |node| {
        if let Some(action) = node
            .as_element()
            .and_then(|el| el.attr(ACTION_ATTR))
            .and_then(ViewAction::from_attr)
        {
            actions.push(action);
        }
    });
    actions
}

fn walk(node: &Node, visit: &mut dyn FnMut(&Node)) {
    visit(node);
    for child in node.children() {
        walk(child, visit);
    }
}
