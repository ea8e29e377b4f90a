//! Link discovery and rewriting.
//!
//! Scans the text leaves of a rendered tree for embedded references and
//! replaces each qualifying leaf with a `span.ipfs-links` container in
//! which every match has become an `a.ipfs-link` element. The rewrite is
//! a pure transform: leaves are collected from the input tree first, and
//! the replacements are applied to a copy, so generated links are never
//! rescanned.

use std::sync::LazyLock;

use dweb_types::reference::ContentReference;
use regex::Regex;

use crate::markup::Node;
use crate::normalize::{TRAILING_PUNCTUATION, normalize};

/// Substring a leaf must contain before it is scanned at all.
pub const TRIGGER: &str = "/ipfs/";

/// Class of the container that replaces a rewritten leaf.
pub const CONTAINER_CLASS: &str = "ipfs-links";

/// Class of generated link elements.
pub const LINK_CLASS: &str = "ipfs-link";

/// Attribute carrying the normalized reference on a link element.
pub const REF_ATTR: &str = "data-ref";

/// Alternatives in priority order: gateway URL, scheme URL, bare path.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>]+?/ipfs/[^\s"'<>]+|ipfs://[^\s"'<>]+|/ipfs/[^\s"'<>]+"#)
        .expect("link pattern is valid")
});

/// Elements whose text is never rewritten.
const SKIPPED_ELEMENTS: &[&str] = &["a", "script", "style"];

/// A reference found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// Matched text with trailing punctuation removed.
    pub label: String,
    /// Normalized form of the match. Not guaranteed to be a valid
    /// reference; activation validates it.
    pub reference: String,
}

/// Result of [`rewrite_links`].
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub root: Node,
    /// Every link produced, in document order.
    pub links: Vec<DiscoveredLink>,
}

/// A text leaf and where it sits below the root.
struct TextLeaf<'a> {
    path: Vec<usize>,
    text: &'a str,
}

/// Rewrite embedded references under `root` into link elements.
pub fn rewrite_links(root: &Node) -> Rewritten {
    let mut leaves = Vec::new();
    collect_text_leaves(root, &mut Vec::new(), &mut leaves);

    let mut out = root.clone();
    let mut links = Vec::new();
    for leaf in leaves.iter().filter(|l| l.text.contains(TRIGGER)) {
        let (container, found) = rewrite_text(leaf.text);
        if let Some(slot) = out.at_path_mut(&leaf.path) {
            *slot = container;
            links.extend(found);
        }
    }

    Rewritten { root: out, links }
}

/// Number of matches the link pattern finds in `text`.
pub fn count_matches(text: &str) -> usize {
    LINK_PATTERN.find_iter(text).count()
}

/// Depth-first pre-order collection of text leaves.
fn collect_text_leaves<'a>(node: &'a Node, path: &mut Vec<usize>, out: &mut Vec<TextLeaf<'a>>) {
    match node {
        Node::Text(text) => out.push(TextLeaf {
            path: path.clone(),
            text,
        }),
        Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.tag.as_str()) => {},
        Node::Element(el) => {
            for (idx, child) in el.children.iter().enumerate() {
                path.push(idx);
                collect_text_leaves(child, path, out);
                path.pop();
            }
        },
        Node::Comment(_) => {},
    }
}

/// Split one text leaf into plain text and link elements.
fn rewrite_text(text: &str) -> (Node, Vec<DiscoveredLink>) {
    let mut children = Vec::new();
    let mut links = Vec::new();
    let mut plain = String::new();
    let mut last = 0;

    for m in LINK_PATTERN.find_iter(text) {
        plain.push_str(&text[last..m.start()]);

        let matched = m.as_str();
        let label = matched.trim_end_matches(TRAILING_PUNCTUATION);
        let link = DiscoveredLink {
            label: label.to_string(),
            reference: normalize(label),
        };

        if !plain.is_empty() {
            children.push(Node::Text(std::mem::take(&mut plain)));
        }
        children.push(link_element(&link));
        // Punctuation trimmed off the label stays in the running text.
        plain.push_str(&matched[label.len()..]);

        links.push(link);
        last = m.end();
    }
    plain.push_str(&text[last..]);
    if !plain.is_empty() {
        children.push(Node::Text(plain));
    }

    let container = Node::element("span")
        .with_attr("class", CONTAINER_CLASS)
        .with_children(children);
    (container, links)
}

/// `<a class="ipfs-link" href="#/ipfs/<id>" data-ref="ipfs://<id>">label</a>`
fn link_element(link: &DiscoveredLink) -> Node {
    let href = ContentReference::parse(&link.reference)
        .map(|r| r.to_fragment())
        .unwrap_or_else(|_| "#".to_string());
    Node::element("a")
        .with_attr("class", LINK_CLASS)
        .with_attr("href", href)
        .with_attr(REF_ATTR, link.reference.clone())
        .with_child(Node::text(link.label.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;

    fn links_in(node: &Node) -> Vec<&crate::markup::Element> {
        let mut out = Vec::new();
        fn walk<'a>(n: &'a Node, out: &mut Vec<&'a crate::markup::Element>) {
            if let Node::Element(el) = n {
                if el.tag == "a" {
                    out.push(el);
                }
                for c in &el.children {
                    walk(c, out);
                }
            }
        }
        walk(node, &mut out);
        out
    }

    #[test]
    fn bare_path_in_sentence() {
        let root = Node::element("pre").with_child(Node::text("Check /ipfs/QmABC123 for data."));
        let rewritten = rewrite_links(&root);

        assert_eq!(
            rewritten.links,
            vec![DiscoveredLink {
                label: "/ipfs/QmABC123".into(),
                reference: "ipfs://QmABC123".into(),
            }]
        );
        let anchors = links_in(&rewritten.root);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].attr(REF_ATTR), Some("ipfs://QmABC123"));
        assert_eq!(anchors[0].attr("href"), Some("#/ipfs/QmABC123"));
        assert_eq!(rewritten.root.visible_text(), "Check /ipfs/QmABC123 for data.");
    }

    #[test]
    fn trailing_punctuation_stays_outside_label() {
        let root = Node::text("See /ipfs/QmEnd.");
        let rewritten = rewrite_links(&root);
        assert_eq!(rewritten.links[0].label, "/ipfs/QmEnd");
        assert_eq!(
            rewritten.root.to_markup(),
            "<span class=\"ipfs-links\">See <a class=\"ipfs-link\" href=\"#/ipfs/QmEnd\" \
             data-ref=\"ipfs://QmEnd\">/ipfs/QmEnd</a>.</span>"
        );
    }

    #[test]
    fn gateway_url_wins_over_inner_bare_path() {
        let root = Node::text("mirror: https://ipfs.io/ipfs/QmGw/index.html");
        let rewritten = rewrite_links(&root);
        assert_eq!(rewritten.links.len(), 1);
        assert_eq!(rewritten.links[0].label, "https://ipfs.io/ipfs/QmGw/index.html");
        assert_eq!(rewritten.links[0].reference, "ipfs://QmGw");
    }

    #[test]
    fn scheme_urls_rewritten_when_leaf_has_trigger() {
        let root = Node::text("ipfs://QmOne and /ipfs/QmTwo");
        let rewritten = rewrite_links(&root);
        let refs: Vec<_> = rewritten.links.iter().map(|l| l.reference.as_str()).collect();
        assert_eq!(refs, vec!["ipfs://QmOne", "ipfs://QmTwo"]);
    }

    #[test]
    fn scheme_url_alone_is_not_a_trigger() {
        let root = Node::element("p").with_child(Node::text("only ipfs://QmAlone here"));
        let rewritten = rewrite_links(&root);
        assert!(rewritten.links.is_empty());
        assert_eq!(rewritten.root, root);
    }

    #[test]
    fn leaves_rewritten_in_document_order() {
        let nodes = parse_fragment(
            "<div><p>first /ipfs/QmA</p><ul><li>second /ipfs/QmB</li></ul>third /ipfs/QmC</div>",
        );
        let rewritten = rewrite_links(&nodes[0]);
        let refs: Vec<_> = rewritten.links.iter().map(|l| l.reference.as_str()).collect();
        assert_eq!(refs, vec!["ipfs://QmA", "ipfs://QmB", "ipfs://QmC"]);
        assert_eq!(links_in(&rewritten.root).len(), 3);
    }

    #[test]
    fn existing_anchors_and_scripts_are_left_alone() {
        let nodes = parse_fragment(
            "<div><a href=\"/ipfs/QmX\">/ipfs/QmX</a><script>load('/ipfs/QmS')</script></div>",
        );
        let rewritten = rewrite_links(&nodes[0]);
        assert!(rewritten.links.is_empty());
        assert_eq!(rewritten.root, nodes[0]);
    }

    #[test]
    fn rewriting_twice_adds_nothing() {
        let root = Node::element("pre").with_child(Node::text("a /ipfs/Qm1 b /ipfs/Qm2"));
        let once = rewrite_links(&root);
        let twice = rewrite_links(&once.root);
        assert!(twice.links.is_empty());
        assert_eq!(twice.root, once.root);
    }

    #[test]
    fn non_normalizable_match_still_links() {
        let root = Node::text("broken /ipfs/. link");
        let rewritten = rewrite_links(&root);
        assert_eq!(rewritten.links.len(), 1);
        assert_eq!(rewritten.links[0].reference, "ipfs://");
        assert_eq!(links_in(&rewritten.root)[0].attr("href"), Some("#"));
        assert_eq!(rewritten.root.visible_text(), "broken /ipfs/. link");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_piece() -> impl Strategy<Value = String> {
            prop_oneof![
                "[a-z ,.]{0,12}",
                "[A-Za-z0-9]{1,12}".prop_map(|id| format!(" /ipfs/{id}")),
                "[A-Za-z0-9]{1,12}".prop_map(|id| format!(" ipfs://{id}.")),
                "[A-Za-z0-9]{1,12}".prop_map(|id| format!(" https://gw.io/ipfs/{id}/x,")),
            ]
        }

        fn arb_text() -> impl Strategy<Value = String> {
            proptest::collection::vec(arb_piece(), 0..8).prop_map(|v| v.concat())
        }

        proptest! {
            #[test]
            fn text_without_trigger_is_untouched(s in "[^/]{0,60}") {
                let root = Node::element("pre").with_child(Node::text(s.clone()));
                let rewritten = rewrite_links(&root);
                prop_assert!(rewritten.links.is_empty());
                prop_assert_eq!(rewritten.root.visible_text(), s);
                prop_assert_eq!(rewritten.root, root);
            }

            #[test]
            fn link_count_matches_pattern(s in arb_text()) {
                let root = Node::element("pre").with_child(Node::text(s.clone()));
                let rewritten = rewrite_links(&root);
                let expected = if s.contains(TRIGGER) { count_matches(&s) } else { 0 };
                prop_assert_eq!(rewritten.links.len(), expected);
                prop_assert_eq!(links_in(&rewritten.root).len(), expected);
            }

            #[test]
            fn visible_text_is_preserved(s in arb_text()) {
                let root = Node::element("pre").with_child(Node::text(s.clone()));
                prop_assert_eq!(rewrite_links(&root).root.visible_text(), s);
            }
        }
    }
}
