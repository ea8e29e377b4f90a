//! Content classification and page construction.
//!
//! Resolved content is rendered one of three ways, decided by the
//! declared content type and a structural sniff of the text:
//!
//! | declared / sniffed                      | rendering                   |
//! |-----------------------------------------|-----------------------------|
//! | `application/json`                      | pretty-printed in `<pre>`   |
//! | text starting with `<` containing `</`  | parsed as markup            |
//! | anything else                           | escaped text in `<pre>`     |
//!
//! JSON that fails to parse degrades to plain text.

use dweb_types::backend::Resolved;
use dweb_types::error::DwebError;
use dweb_types::reference::ContentReference;

use crate::bind::{ACTION_ATTR, ViewAction};
use crate::markup::{Node, parse_fragment};

/// Id of the element every view is rendered into.
pub const CONTENT_ID: &str = "content";

/// How resolved content is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Markup,
    PlainText,
}

/// A rendered page before link rewriting.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub root: Node,
    pub kind: ContentKind,
    /// Declared media type, recorded in history.
    pub content_type: String,
}

/// Pick a rendering for content.
pub fn classify(media_type: &str, text: &str) -> ContentKind {
    if media_type == "application/json" {
        ContentKind::Json
    } else if looks_like_markup(text) {
        ContentKind::Markup
    } else {
        ContentKind::PlainText
    }
}

fn looks_like_markup(text: &str) -> bool {
    text.trim_start().starts_with('<') && text.contains("</")
}

/// Render resolved content into a page tree.
pub fn render_content(resolved: &Resolved) -> Rendered {
    let content_type = resolved.media_type();
    let text = resolved.text();
    let kind = classify(&content_type, &text);

    let children = match kind {
        ContentKind::Json => match resolved.json().and_then(pretty_json) {
            Ok(pretty) => vec![preformatted(pretty)],
            Err(e) => {
                log::warn!("Declared JSON did not decode, showing as text: {e}");
                vec![preformatted(text)]
            },
        },
        ContentKind::Markup => parse_fragment(&text),
        ContentKind::PlainText => vec![preformatted(text)],
    };

    Rendered {
        root: page_root(children),
        kind,
        content_type,
    }
}

/// Two-space indented JSON.
fn pretty_json(value: serde_json::Value) -> dweb_types::Result<String> {
    serde_json::to_string_pretty(&value).map_err(|e| DwebError::Decode(e.to_string()))
}

fn preformatted(text: String) -> Node {
    Node::element("pre").with_child(Node::Text(text))
}

/// The `#content` container every view lives in.
pub fn page_root(children: Vec<Node>) -> Node {
    Node::element("div")
        .with_attr("id", CONTENT_ID)
        .with_children(children)
}

/// Re-wrap stored markup as a page tree.
pub fn restore_root(markup: &str) -> Node {
    let mut nodes = parse_fragment(markup);
    let is_page_root = |n: &Node| {
        n.as_element()
            .is_some_and(|el| el.tag == "div" && el.attr("id") == Some(CONTENT_ID))
    };
    if nodes.len() == 1 && is_page_root(&nodes[0]) {
        nodes.remove(0)
    } else {
        page_root(nodes)
    }
}

/// Transient placeholder shown while a reference resolves.
pub fn loading_view(reference: &ContentReference) -> Node {
    page_root(vec![
        Node::element("p")
            .with_attr("class", "loading")
            .with_child(Node::text(format!("Loading {reference}..."))),
    ])
}

/// Error view with the message and back/home controls.
pub fn error_view(error: &DwebError) -> Node {
    let control = |action: ViewAction, label: &str| {
        Node::element("button")
            .with_attr(ACTION_ATTR, action.as_str())
            .with_child(Node::text(label))
    };
    page_root(vec![
        Node::element("div")
            .with_attr("class", "error")
            .with_child(Node::element("h2").with_child(Node::text("Could not load page")))
            .with_child(
                Node::element("p")
                    .with_attr("class", "error-message")
                    .with_child(Node::text(error.to_string())),
            )
            .with_child(
                Node::element("p")
                    .with_child(control(ViewAction::Back, "Go Back"))
                    .with_child(Node::text(" "))
                    .with_child(control(ViewAction::Home, "Go Home")),
            ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::bind_actions;

    #[test]
    fn json_is_pretty_printed_with_two_spaces() {
        let rendered = render_content(&Resolved::ok("application/json", "{\"a\":1}"));
        assert_eq!(rendered.kind, ContentKind::Json);
        assert_eq!(
            rendered.root.to_markup(),
            "<div id=\"content\"><pre>{\n  \"a\": 1\n}</pre></div>"
        );
        assert_eq!(rendered.content_type, "application/json");
    }

    #[test]
    fn json_with_parameters_is_still_json() {
        let rendered = render_content(&Resolved::ok("application/json; charset=utf-8", "[1]"));
        assert_eq!(rendered.kind, ContentKind::Json);
        assert_eq!(rendered.root.visible_text(), "[\n  1\n]");
    }

    #[test]
    fn broken_json_degrades_to_text() {
        let rendered = render_content(&Resolved::ok("application/json", "{\"a\": <oops>"));
        assert_eq!(rendered.kind, ContentKind::Json);
        assert_eq!(
            rendered.root.to_markup(),
            "<div id=\"content\"><pre>{\"a\": &lt;oops&gt;</pre></div>"
        );
    }

    #[test]
    fn markup_is_sniffed_regardless_of_declared_type() {
        let rendered = render_content(&Resolved::ok("text/plain", "  <h1>Title</h1>"));
        assert_eq!(rendered.kind, ContentKind::Markup);
        assert_eq!(rendered.root.to_markup(), "<div id=\"content\"><h1>Title</h1></div>");
    }

    #[test]
    fn angle_bracket_without_closing_tag_is_text() {
        assert_eq!(classify("text/html", "<br>"), ContentKind::PlainText);
        assert_eq!(classify("", "a </b>"), ContentKind::PlainText);
        assert_eq!(classify("", "<p>x</p>"), ContentKind::Markup);
    }

    #[test]
    fn plain_text_is_escaped() {
        let rendered = render_content(&Resolved::ok("text/plain", "1 < 2 & 3"));
        assert_eq!(
            rendered.root.to_markup(),
            "<div id=\"content\"><pre>1 &lt; 2 &amp; 3</pre></div>"
        );
    }

    #[test]
    fn error_view_offers_back_and_home() {
        let view = error_view(&DwebError::Resolution("peer unreachable".into()));
        assert!(view.visible_text().contains("resolution failed: peer unreachable"));
        assert_eq!(bind_actions(&view), vec![ViewAction::Back, ViewAction::Home]);
    }

    #[test]
    fn restore_root_round_trips_page_markup() {
        let page = render_content(&Resolved::ok("text/plain", "hello")).root;
        assert_eq!(restore_root(&page.to_markup()), page);
    }

    #[test]
    fn restore_root_wraps_bare_fragments() {
        let root = restore_root("<p>a</p><p>b</p>");
        assert_eq!(root.to_markup(), "<div id=\"content\"><p>a</p><p>b</p></div>");
    }
}
