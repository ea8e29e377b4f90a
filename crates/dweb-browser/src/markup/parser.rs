//! Tolerant markup parser.
//!
//! Handles what resolved documents actually contain: start/end tags with
//! quoted, unquoted or bare attributes, void and self-closing elements,
//! comments, doctype/processing instructions (skipped), and raw-text
//! `script`/`style` bodies. Mismatched end tags close up to the nearest
//! matching open element or are ignored; unclosed elements are closed at
//! end of input. A full document is unwrapped to its `<body>` content the
//! way assigning it into an existing element would.

use super::entities::decode_entities;
use super::{Attribute, Element, Node};

/// Parse markup into a list of sibling nodes.
pub fn parse_fragment(input: &str) -> Vec<Node> {
    let mut parser = Parser {
        input,
        pos: 0,
        stack: Vec::new(),
        roots: Vec::new(),
    };
    parser.run();
    unwrap_document(parser.roots)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Open elements, innermost last.
    stack: Vec<Element>,
    roots: Vec<Node>,
}

impl Parser<'_> {
    fn run(&mut self) {
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            if rest.starts_with("<!--") {
                self.comment();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past('>');
            } else if rest.starts_with("</") && starts_tag_name(&rest[2..]) {
                self.end_tag();
            } else if rest.starts_with('<') && starts_tag_name(&rest[1..]) {
                self.start_tag();
            } else {
                self.text();
            }
        }
        while let Some(el) = self.stack.pop() {
            self.append(Node::Element(el));
        }
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn skip_past(&mut self, c: char) {
        match self.input[self.pos..].find(c) {
            Some(i) => self.pos += i + c.len_utf8(),
            None => self.pos = self.input.len(),
        }
    }

    fn comment(&mut self) {
        let body_start = self.pos + 4;
        let (body, next) = match self.input[body_start..].find("-->") {
            Some(i) => (&self.input[body_start..body_start + i], body_start + i + 3),
            None => (&self.input[body_start..], self.input.len()),
        };
        self.append(Node::Comment(body.to_string()));
        self.pos = next;
    }

    fn text(&mut self) {
        // Skip the current byte if it is a stray '<', then run to the
        // next candidate tag opener.
        let start = self.pos;
        let search_from = if self.input[start..].starts_with('<') {
            start + 1
        } else {
            start
        };
        let end = self.input[search_from..]
            .find('<')
            .map_or(self.input.len(), |i| search_from + i);
        self.pos = end;
        self.append(Node::Text(decode_entities(&self.input[start..end])));
        self.merge_trailing_text();
    }

    /// Merge adjacent text nodes produced by stray `<` characters.
    fn merge_trailing_text(&mut self) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        if !matches!(siblings.as_slice(), [.., Node::Text(_), Node::Text(_)]) {
            return;
        }
        if let Some(Node::Text(last)) = siblings.pop()
            && let Some(Node::Text(prev)) = siblings.last_mut()
        {
            prev.push_str(&last);
        }
    }

    fn end_tag(&mut self) {
        let name_start = self.pos + 2;
        let name = read_tag_name(&self.input[name_start..]);
        self.pos = name_start + name.len();
        self.skip_past('>');

        let tag = name.to_ascii_lowercase();
        let Some(depth) = self.stack.iter().rposition(|el| el.tag == tag) else {
            return;
        };
        while self.stack.len() > depth {
            if let Some(el) = self.stack.pop() {
                self.append(Node::Element(el));
            }
        }
    }

    fn start_tag(&mut self) {
        let name_start = self.pos + 1;
        let name = read_tag_name(&self.input[name_start..]);
        self.pos = name_start + name.len();

        let (attributes, self_closing) = self.attributes();
        let element = Element {
            tag: name.to_ascii_lowercase(),
            attributes,
            children: Vec::new(),
        };

        if element.is_void() || self_closing {
            self.append(Node::Element(element));
        } else if element.is_raw_text() {
            self.raw_text(element);
        } else {
            self.stack.push(element);
        }
    }

    /// Parse attributes up to and including the closing `>`.
    fn attributes(&mut self) -> (Vec<Attribute>, bool) {
        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = &self.input[self.pos..];
            if rest.is_empty() {
                return (attrs, false);
            }
            if let Some(after) = rest.strip_prefix("/>") {
                self.pos = self.input.len() - after.len();
                return (attrs, true);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return (attrs, false);
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name_len = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
                .unwrap_or(rest.len());
            let name = rest[..name_len].to_ascii_lowercase();
            self.pos += name_len;
            self.skip_whitespace();

            let value = if self.input[self.pos..].starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()
            } else {
                String::new()
            };

            if !name.is_empty() && !attrs.iter().any(|a: &Attribute| a.name == name) {
                attrs.push(Attribute { name, value });
            }
        }
    }

    fn attribute_value(&mut self) -> String {
        let rest = &self.input[self.pos..];
        let raw = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(q).unwrap_or(body.len());
                self.pos += 1 + end + usize::from(end < body.len());
                &body[..end]
            },
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                &rest[..end]
            },
        };
        decode_entities(raw)
    }

    fn raw_text(&mut self, mut element: Element) {
        let rest = &self.input[self.pos..];
        let closer = format!("</{}", element.tag);
        let end = find_ascii_case_insensitive(rest, &closer).unwrap_or(rest.len());
        if end > 0 {
            element.children.push(Node::Text(rest[..end].to_string()));
        }
        self.pos += end;
        if self.pos < self.input.len() {
            self.skip_past('>');
        }
        self.append(Node::Element(element));
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}

fn starts_tag_name(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic())
}

fn read_tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(s.len());
    &s[..end]
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Replace a full `<html>` document with the content of its `<body>`
/// (or everything but `<head>` when there is no body).
fn unwrap_document(roots: Vec<Node>) -> Vec<Node> {
    let has_html = roots
        .iter()
        .any(|n| n.as_element().is_some_and(|el| el.tag == "html"));
    if !has_html {
        return roots;
    }

    let mut out = Vec::new();
    for node in roots {
        match node {
            Node::Element(el) if el.tag == "html" => {
                for child in el.children {
                    match child {
                        Node::Element(inner) if inner.tag == "head" => {},
                        Node::Text(t) if t.trim().is_empty() => {},
                        Node::Element(inner) if inner.tag == "body" => out.extend(inner.children),
                        other => out.push(other),
                    }
                }
            },
            Node::Text(t) if t.trim().is_empty() => {},
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::fragment_markup;

    fn el<'a>(nodes: &'a [Node], idx: usize) -> &'a Element {
        nodes[idx].as_element().expect("element")
    }

    #[test]
    fn parse_text_and_elements() {
        let nodes = parse_fragment("<p>Hello <b>world</b>!</p>");
        assert_eq!(nodes.len(), 1);
        let p = el(&nodes, 0);
        assert_eq!(p.tag, "p");
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.children[0], Node::text("Hello "));
        assert_eq!(nodes[0].visible_text(), "Hello world!");
    }

    #[test]
    fn parse_attributes_in_all_forms() {
        let nodes = parse_fragment("<a HREF=\"/x?a=1&amp;b=2\" data-x='y' hidden rel=nofollow>t</a>");
        let a = el(&nodes, 0);
        assert_eq!(a.attr("href"), Some("/x?a=1&b=2"));
        assert_eq!(a.attr("data-x"), Some("y"));
        assert_eq!(a.attr("hidden"), Some(""));
        assert_eq!(a.attr("rel"), Some("nofollow"));
    }

    #[test]
    fn void_and_self_closing_elements() {
        let nodes = parse_fragment("<p>a<br>b<img src=x.png/><span/>c</p>");
        let p = el(&nodes, 0);
        let tags: Vec<_> = p
            .children
            .iter()
            .filter_map(|n| n.as_element().map(|e| e.tag.as_str()))
            .collect();
        assert_eq!(tags, vec!["br", "img", "span"]);
        assert_eq!(nodes[0].visible_text(), "abc");
    }

    #[test]
    fn comments_and_doctype() {
        let nodes = parse_fragment("<!DOCTYPE html><!-- note --><p>x</p>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], Node::Comment(" note ".into()));
    }

    #[test]
    fn raw_text_elements_keep_markup_characters() {
        let nodes = parse_fragment("<script>if (a < b) { x = '</p>'; }</SCRIPT><p>after</p>");
        let script = el(&nodes, 0);
        assert_eq!(
            script.children,
            vec![Node::text("if (a < b) { x = '</p>'; }")]
        );
        assert_eq!(el(&nodes, 1).tag, "p");
    }

    #[test]
    fn mismatched_end_tags_are_tolerated() {
        let nodes = parse_fragment("<div><p>one</div><p>two</span></p>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].visible_text(), "one");
        assert_eq!(nodes[1].visible_text(), "two");
    }

    #[test]
    fn unclosed_elements_closed_at_end() {
        let nodes = parse_fragment("<ul><li>a<li>b");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].visible_text(), "ab");
    }

    #[test]
    fn stray_angle_brackets_stay_text() {
        let nodes = parse_fragment("<p>1 < 2 and 3 <= 4</p>");
        assert_eq!(el(&nodes, 0).children, vec![Node::text("1 < 2 and 3 <= 4")]);
    }

    #[test]
    fn text_entities_decoded() {
        let nodes = parse_fragment("<p>Tom &amp; Jerry &mdash; &#169;</p>");
        assert_eq!(nodes[0].visible_text(), "Tom & Jerry \u{2014} \u{a9}");
    }

    #[test]
    fn full_document_unwrapped_to_body() {
        let nodes = parse_fragment(
            "<!doctype html>\n<html><head><title>T</title></head>\n\
             <body><h1>Hi</h1><p>there</p></body></html>\n",
        );
        assert_eq!(fragment_markup(&nodes), "<h1>Hi</h1><p>there</p>");
    }

    #[test]
    fn serialize_parse_serialize_is_stable() {
        let src = "<div id=\"c\"><p>a &amp; b</p><a href=\"#/ipfs/Qm\" data-ref=\"ipfs://Qm\">/ipfs/Qm</a></div>";
        let once = fragment_markup(&parse_fragment(src));
        assert_eq!(once, src);
        assert_eq!(fragment_markup(&parse_fragment(&once)), once);
    }
}
