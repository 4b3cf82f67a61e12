//! Owned HTML node tree produced by the markdown renderer.
//!
//! Pages are kept as a flat list of top-level nodes so that heading
//! extraction, directive stripping and inclusion can all work on sibling
//! positions rather than on serialized HTML.

use super::directive::Directive;

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &["img", "br", "hr", "input", "meta", "link"];

/// Deepest heading level HTML knows about
pub const MAX_HEADING_LEVEL: u8 = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Heading(Heading),
    Text(String),
    /// Raw HTML passed through untouched
    Raw(String),
    /// An HTML comment that is not an authoring directive
    Comment(String),
    Directive(Directive),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub id: String,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

impl Heading {
    /// Same heading moved `offset` levels deeper, clamped to the valid range
    pub fn shifted(&self, offset: i32) -> Heading {
        let level = (self.level as i32 + offset).clamp(1, MAX_HEADING_LEVEL as i32) as u8;
        Heading {
            level,
            id: self.id.clone(),
            children: self.children.clone(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                for (name, value) in &element.attrs {
                    out.push_str(&format!(r#" {}="{}""#, name, escape_attr(value)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                    return;
                }
                write_nodes(&element.children, out);
                out.push_str(&format!("</{}>", element.tag));
            }
            Node::Heading(heading) => {
                if heading.id.is_empty() {
                    out.push_str(&format!("<h{}>", heading.level));
                } else {
                    out.push_str(&format!(r#"<h{} id="{}">"#, heading.level, escape_attr(&heading.id)));
                }
                write_nodes(&heading.children, out);
                out.push_str(&format!("</h{}>", heading.level));
            }
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Raw(html) => out.push_str(html),
            Node::Comment(body) => out.push_str(&format!("<!--{}-->", body)),
            Node::Directive(directive) => out.push_str(&format!("<!--{}-->", directive)),
        }
    }

    /// Concatenated text content, ignoring markup
    pub fn text(&self) -> String {
        match self {
            Node::Element(element) => text_of(&element.children),
            Node::Heading(heading) => text_of(&heading.children),
            Node::Text(text) => text.clone(),
            Node::Raw(_) | Node::Comment(_) | Node::Directive(_) => String::new(),
        }
    }
}

/// Serialize a node list
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        node.write_html(out);
    }
}

pub fn text_of(nodes: &[Node]) -> String {
    nodes.iter().map(Node::text).collect()
}

pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_nested_elements() {
        let node: Node = Element::new("li")
            .with_attr("class", "entry")
            .with_child(Element::new("a").with_attr("href", "/a.html").with_child("A & B"))
            .into();

        assert_eq!(
            node.to_html(),
            r#"<li class="entry"><a href="/a.html">A &amp; B</a></li>"#
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let node: Node = Element::new("img").with_attr("src", "a.png").into();
        assert_eq!(node.to_html(), r#"<img src="a.png">"#);
    }

    #[test]
    fn test_heading_serialization() {
        let node = Node::Heading(Heading {
            level: 2,
            id: "usage".to_string(),
            children: vec!["Usage".into()],
        });
        assert_eq!(node.to_html(), r#"<h2 id="usage">Usage</h2>"#);
    }

    #[test]
    fn test_set_attr_replaces_existing_value() {
        let mut element = Element::new("a").with_attr("href", "old");
        element.set_attr("href", "new");
        assert_eq!(element.attrs.len(), 1);
        assert_eq!(element.attrs[0], ("href".to_string(), "new".to_string()));
    }

    #[test]
    fn test_shifted_heading_is_clamped() {
        let heading = Heading {
            level: 5,
            id: String::new(),
            children: Vec::new(),
        };
        assert_eq!(heading.shifted(1).level, 6);
        assert_eq!(heading.shifted(3).level, 6);
        assert_eq!(heading.shifted(-9).level, 1);
    }

    #[test]
    fn test_text_ignores_markup() {
        let nodes = vec![
            Node::Text("Hello ".to_string()),
            Element::new("em").with_child("world").into(),
            Node::Comment("hidden".to_string()),
        ];
        assert_eq!(text_of(&nodes), "Hello world");
    }
}
