//! Markdown to node tree conversion using pulldown-cmark.

use super::directive::{comment_body, Directive};
use super::dom::{text_of, Element, Heading, Node};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Stack frame for an element that is still open
enum Frame {
    Element(Element),
    Heading {
        level: u8,
        id: Option<String>,
        children: Vec<Node>,
    },
    /// HTML blocks: children are handed to the parent as-is
    Transparent(Vec<Node>),
}

impl Frame {
    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self {
            Frame::Element(element) => &mut element.children,
            Frame::Heading { children, .. } => children,
            Frame::Transparent(children) => children,
        }
    }
}

struct MarkdownConverter {
    stack: Vec<Frame>,
    root: Vec<Node>,
    in_table_head: bool,
    /// Slug usage counts, for unique heading ids
    slugs: HashMap<String, usize>,
}

/// Render markdown content to a flat list of top-level nodes
pub fn render_markdown(content: &str) -> Vec<Node> {
    // Normalize CRLF/CR to LF and drop BOMs before parsing
    let content = content
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{FEFF}', "");

    let mut converter = MarkdownConverter {
        stack: Vec::new(),
        root: Vec::new(),
        in_table_head: false,
        slugs: HashMap::new(),
    };
    for event in Parser::new_ext(&content, markdown_options()) {
        converter.handle_event(event);
    }
    converter.finish()
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

impl MarkdownConverter {
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_node(Node::Text(text.to_string())),
            Event::Code(code) => self.add_inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.add_html(&html),
            Event::FootnoteReference(name) => {
                let link = Element::new("a")
                    .with_attr("href", format!("#{}", name))
                    .with_child(name.to_string());
                self.add_node(
                    Element::new("sup")
                        .with_attr("class", "footnote-reference")
                        .with_child(link)
                        .into(),
                );
            }
            Event::SoftBreak => self.add_node(Node::Text("\n".to_string())),
            Event::HardBreak => self.add_node(Element::new("br").into()),
            Event::Rule => self.add_node(Element::new("hr").into()),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input.set_attr("checked", "");
                }
                self.add_node(input.into());
            }
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        let frame = match tag {
            Tag::Paragraph => Frame::Element(Element::new("p")),
            Tag::Heading { level, id, .. } => Frame::Heading {
                level: heading_level_to_num(level),
                id: id.map(|id| id.to_string()),
                children: Vec::new(),
            },
            Tag::BlockQuote => Frame::Element(Element::new("blockquote")),
            Tag::CodeBlock(kind) => {
                self.stack.push(Frame::Element(Element::new("pre")));
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(lang) = kind {
                    if let Some(lang) = lang.split_whitespace().next() {
                        code.set_attr("class", format!("language-{}", lang));
                    }
                }
                Frame::Element(code)
            }
            Tag::HtmlBlock => Frame::Transparent(Vec::new()),
            Tag::List(Some(start)) => {
                let mut list = Element::new("ol");
                if start != 1 {
                    list.set_attr("start", start.to_string());
                }
                Frame::Element(list)
            }
            Tag::List(None) => Frame::Element(Element::new("ul")),
            Tag::Item => Frame::Element(Element::new("li")),
            Tag::FootnoteDefinition(name) => Frame::Element(
                Element::new("div")
                    .with_attr("class", "footnote-definition")
                    .with_attr("id", name.to_string()),
            ),
            Tag::Table(_) => Frame::Element(Element::new("table").with_attr("class", "ls_grid_table")),
            Tag::TableHead => {
                self.in_table_head = true;
                self.stack.push(Frame::Element(Element::new("thead")));
                Frame::Element(Element::new("tr"))
            }
            Tag::TableRow => Frame::Element(Element::new("tr")),
            Tag::TableCell => Frame::Element(Element::new(if self.in_table_head { "th" } else { "td" })),
            Tag::Emphasis => Frame::Element(Element::new("em")),
            Tag::Strong => Frame::Element(Element::new("strong")),
            Tag::Strikethrough => Frame::Element(Element::new("del")),
            Tag::Link { dest_url, title, .. } => {
                let mut link = Element::new("a").with_attr("href", dest_url.to_string());
                if !title.is_empty() {
                    link.set_attr("title", title.to_string());
                }
                Frame::Element(link)
            }
            Tag::Image { dest_url, title, .. } => {
                let mut image = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    image.set_attr("title", title.to_string());
                }
                Frame::Element(image.with_attr("class", "ls_responsive_img"))
            }
            _ => Frame::Transparent(Vec::new()),
        };
        self.stack.push(frame);
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => {
                self.close();
                self.close();
            }
            TagEnd::TableHead => {
                self.close();
                self.close();
                self.in_table_head = false;
            }
            _ => self.close(),
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };

        match frame {
            Frame::Element(mut element) => {
                if element.tag == "img" {
                    // Alt text arrives as child text events
                    let alt = text_of(&element.children);
                    element.children.clear();
                    element.set_attr("alt", alt);
                }
                self.add_node(Node::Element(element));
            }
            Frame::Heading { level, id, children } => {
                let id = id.unwrap_or_else(|| self.unique_slug(&text_of(&children)));
                self.add_node(Node::Heading(Heading { level, id, children }));
            }
            Frame::Transparent(children) => {
                for child in children {
                    self.add_node(child);
                }
            }
        }
    }

    fn add_inline_code(&mut self, code: &str) {
        if hex_color_regex().is_match(code) {
            let swatch = Element::new("span").with_attr("style", format!("background-color: {};", code));
            self.add_node(
                Element::new("span")
                    .with_attr("class", "ls_color_ship")
                    .with_child(swatch)
                    .into(),
            );
        } else {
            self.add_node(Element::new("code").with_child(code.to_string()).into());
        }
    }

    fn add_html(&mut self, html: &str) {
        let node = if let Some(body) = comment_body(html) {
            match Directive::from_comment(body) {
                Ok(Some(directive)) => Node::Directive(directive),
                Ok(None) => Node::Comment(body.to_string()),
                Err(err) => {
                    tracing::warn!("ignoring malformed directive: {}", err);
                    Node::Comment(body.to_string())
                }
            }
        } else if filtered_tag_regex().is_match(html) {
            // Shown as text rather than interpreted
            Node::Text(html.to_string())
        } else {
            Node::Raw(html.to_string())
        };
        self.add_node(node);
    }

    /// Add a node to the innermost open element, or to the document root
    fn add_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => frame.children_mut().push(node),
            None => self.root.push(node),
        }
    }

    fn unique_slug(&mut self, text: &str) -> String {
        let slug = slugify(text);
        let count = self.slugs.entry(slug.clone()).or_insert(0);
        let id = if *count == 0 {
            slug
        } else {
            format!("{}-{}", slug, count)
        };
        *count += 1;
        id
    }

    fn finish(mut self) -> Vec<Node> {
        // Close anything left open by a truncated event stream
        while !self.stack.is_empty() {
            self.close();
        }
        self.root
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Generate a URL-safe slug from text (github-slugger style)
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else if c.is_whitespace() {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn hex_color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[a-fA-F\d]{3}(?:[a-fA-F\d]{5}|[a-fA-F\d]{3})?$").unwrap())
}

/// Raw HTML tags that are never passed through
fn filtered_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<\s*/?\s*(title|textarea|style|xmp|iframe|noembed|noframes|script|plaintext)\b").unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::to_html;

    fn headings(nodes: &[Node]) -> Vec<(u8, String)> {
        nodes
            .iter()
            .filter_map(|node| match node {
                Node::Heading(h) => Some((h.level, h.id.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_headings_are_top_level_siblings() {
        let nodes = render_markdown("# Title\n\nIntro.\n\n## Usage\n\nText.\n");
        assert_eq!(
            headings(&nodes),
            vec![(1, "title".to_string()), (2, "usage".to_string())]
        );
    }

    #[test]
    fn test_custom_heading_id() {
        let nodes = render_markdown("## Crafting {#recipe}\n");
        assert_eq!(headings(&nodes), vec![(2, "recipe".to_string())]);
    }

    #[test]
    fn test_duplicate_heading_slugs_are_suffixed() {
        let nodes = render_markdown("## Usage\n\n## Usage\n\n## Usage\n");
        let ids: Vec<String> = headings(&nodes).into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec!["usage", "usage-1", "usage-2"]);
    }

    #[test]
    fn test_block_comment_becomes_directive() {
        let nodes = render_markdown("# Page\n\n<!--description:About lanterns-->\n\nBody.\n");
        assert!(nodes.contains(&Node::Directive(Directive::Description(
            "About lanterns".to_string()
        ))));
    }

    #[test]
    fn test_plain_comment_is_kept() {
        let nodes = render_markdown("<!-- reviewer note -->\n");
        assert_eq!(nodes, vec![Node::Comment(" reviewer note ".to_string())]);
    }

    #[test]
    fn test_malformed_include_is_a_plain_comment() {
        let nodes = render_markdown("<!--include:x:./a.md-->\n");
        assert_eq!(nodes, vec![Node::Comment("include:x:./a.md".to_string())]);
    }

    #[test]
    fn test_image_alt_and_class() {
        let html = to_html(&render_markdown("![A lantern](lantern.png)\n"));
        assert_eq!(
            html,
            r#"<p><img src="lantern.png" class="ls_responsive_img" alt="A lantern"></p>"#
        );
    }

    #[test]
    fn test_hex_color_code_renders_swatch() {
        let html = to_html(&render_markdown("Color `#ff00aa` here\n"));
        assert!(html.contains(r#"<span class="ls_color_ship"><span style="background-color: #ff00aa;"></span></span>"#));
    }

    #[test]
    fn test_regular_inline_code() {
        let html = to_html(&render_markdown("Run `cargo build`\n"));
        assert_eq!(html, "<p>Run <code>cargo build</code></p>");
    }

    #[test]
    fn test_fenced_code_block() {
        let html = to_html(&render_markdown("```json\n{\"a\": 1}\n```\n"));
        assert_eq!(
            html,
            "<pre><code class=\"language-json\">{\"a\": 1}\n</code></pre>"
        );
    }

    #[test]
    fn test_table_has_grid_class_and_header_cells() {
        let html = to_html(&render_markdown("| A | B |\n|---|---|\n| 1 | 2 |\n"));
        assert!(html.starts_with(r#"<table class="ls_grid_table"><thead><tr><th>A</th><th>B</th></tr></thead>"#));
        assert!(html.contains("<tr><td>1</td><td>2</td></tr>"));
    }

    #[test]
    fn test_filtered_raw_html_is_escaped() {
        let html = to_html(&render_markdown("<script>alert(1)</script>\n"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_svg_raw_html_passes_through() {
        let html = to_html(&render_markdown("<svg width=\"1\"></svg>\n"));
        assert!(html.contains("<svg width=\"1\"></svg>"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Aurora's Decorations"), "auroras-decorations");
        assert_eq!(slugify("  Spaces  "), "spaces");
    }
}
