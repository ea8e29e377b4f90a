//! Owned markup tree.
//!
//! Rendered pages are plain trees of [`Node`]s. Transforms such as link
//! rewriting take a tree by reference and produce a new one, so nothing
//! ever walks a tree while it is being mutated.

pub mod entities;
pub mod parser;

pub use parser::parse_fragment;

use entities::{escape_attr, escape_text};

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text rather than markup.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    /// Attribute value by (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS.contains(&self.tag.as_str())
    }
}

/// A node in a markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Decoded text; escaped again on serialization.
    Text(String),
    Comment(String),
}

impl Node {
    /// A childless element.
    pub fn element(tag: &str) -> Self {
        Node::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Builder: add an attribute (no-op on non-elements).
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if let Node::Element(el) = &mut self {
            el.attributes.push(Attribute {
                name: name.to_ascii_lowercase(),
                value: value.into(),
            });
        }
        self
    }

    /// Builder: append a child (no-op on non-elements).
    pub fn with_child(mut self, child: Node) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.push(child);
        }
        self
    }

    /// Builder: append several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        if let Node::Element(el) = &mut self {
            el.children.extend(children);
        }
        self
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(el) => &el.children,
            _ => &[],
        }
    }

    /// Node at a child-index path below `self` (`[]` is `self`).
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &idx in path {
            node = match node {
                Node::Element(el) => el.children.get_mut(idx)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Serialize to markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out, false);
        out
    }

    fn write_markup(&self, out: &mut String, raw: bool) {
        match self {
            Node::Text(t) if raw => out.push_str(t),
            Node::Text(t) => out.push_str(&escape_text(t)),
            Node::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            },
            Node::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for attr in &el.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&attr.value));
                    out.push('"');
                }
                out.push('>');
                if el.is_void() {
                    return;
                }
                let raw = el.is_raw_text();
                for child in &el.children {
                    child.write_markup(out, raw);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            },
        }
    }

    /// Text a reader would see: all text leaves in document order,
    /// excluding comments and script/style content.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        self.collect_visible(&mut out);
        out
    }

    fn collect_visible(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Comment(_) => {},
            Node::Element(el) if el.is_raw_text() => {},
            Node::Element(el) => {
                for child in &el.children {
                    child.collect_visible(out);
                }
            },
        }
    }
}

/// Serialize a sequence of sibling nodes.
pub fn fragment_markup(nodes: &[Node]) -> String {
    nodes.iter().map(Node::to_markup).collect()
}
