use super::outline::{page_outline, OutlineEntry};
use super::paths::{html_path, AssetRegistry, LinkRewriter};
use crate::parser::dom::{text_of, Node};
use crate::parser::{render_markdown, Directive, SiteConfig};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Source path of the page shown as the sidebar's home entry
pub const ROOT_PAGE: &str = "./index.md";

/// Loaded pages keyed by source path
pub type Pages = BTreeMap<String, Page>;

/// A rendered markdown page
#[derive(Debug, Clone)]
pub struct Page {
    /// e.g. `./guide/setup.md`, unique per build
    pub source_path: String,
    /// Site-relative path of the emitted HTML, e.g. `./guide/setup.html`
    pub html_path: String,
    pub title: String,
    /// Text of the first level-1 heading
    pub raw_title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub outline: Vec<OutlineEntry>,
    /// Top-level nodes of the page body
    pub content: Vec<Node>,
}

impl Page {
    /// Read and render the markdown file at `source_path`
    pub fn load(
        source_dir: &Path,
        source_path: &str,
        config: &SiteConfig,
        rewriter: &LinkRewriter,
        assets: &mut AssetRegistry,
    ) -> Result<Self> {
        let file = source_dir.join(source_path);
        let markdown = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        Ok(Self::from_markdown(source_path, &markdown, config, rewriter, assets))
    }

    pub fn from_markdown(
        source_path: &str,
        markdown: &str,
        config: &SiteConfig,
        rewriter: &LinkRewriter,
        assets: &mut AssetRegistry,
    ) -> Self {
        let mut content = render_markdown(markdown);

        // Metadata directives are consumed; the first of each kind counts
        let mut description = None;
        let mut thumbnail = None;
        content.retain(|node| match node {
            Node::Directive(Directive::Description(text)) => {
                description.get_or_insert_with(|| text.clone());
                false
            }
            Node::Directive(Directive::Thumbnail(path)) => {
                thumbnail.get_or_insert_with(|| path.clone());
                false
            }
            _ => true,
        });

        rewriter.rewrite_links(&mut content, assets);

        let raw_title = raw_title(&content).unwrap_or_else(|| config.site_name.clone());

        Page {
            source_path: source_path.to_string(),
            html_path: html_path(source_path),
            title: config.page_title(&raw_title),
            raw_title,
            description: description.unwrap_or_else(|| config.description.clone()),
            thumbnail,
            outline: page_outline(&content),
            content,
        }
    }
}

/// Text of the first top-level level-1 heading
fn raw_title(content: &[Node]) -> Option<String> {
    content.iter().find_map(|node| match node {
        Node::Heading(heading) if heading.level == 1 => Some(text_of(&heading.children).trim().to_string()),
        _ => None,
    })
}
