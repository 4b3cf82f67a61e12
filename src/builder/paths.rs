//! Source-tree to deployment-tree path mapping and in-page link rewriting.
//!
//! Site paths are plain strings relative to the source directory, in the
//! same form authors write links: `./guide/setup.md`, `../images/a.png`.

use crate::parser::dom::Node;
use crate::parser::SiteConfig;
use anyhow::Result;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Output subpath receiving referenced textures
pub const TEXTURE_ASSETS_DIR: &str = "images/assets";

/// Textures referenced by at least one page.
///
/// Keys are texture-relative paths (`block/lantern.png`), values the source
/// path the file is copied from.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    assets: BTreeMap<String, String>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, source_path: String) {
        self.assets.entry(key.to_string()).or_insert(source_path);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.assets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Map a source path to where it lands in the output tree
pub fn deploy_path(path: &str, config: &SiteConfig) -> String {
    let output = config.output_root();

    if let Some(rest) = strip_dir_prefix(path, &config.public_dir) {
        return format!("{}{}", output, rest);
    }
    if let Some(textures) = &config.textures_dir {
        if let Some(rest) = strip_dir_prefix(path, textures) {
            return format!("{}/{}{}", output, TEXTURE_ASSETS_DIR, rest);
        }
    }

    if let Some(rest) = path.strip_prefix("..") {
        format!("{}{}", output, rest)
    } else if let Some(rest) = path.strip_prefix('.') {
        format!("{}{}", output, rest)
    } else {
        format!("{}/{}", output, path)
    }
}

/// Whether `path` is `dir` itself or lies below it
pub fn is_within(path: &str, dir: &str) -> bool {
    strip_dir_prefix(path, dir).is_some()
}

/// `path` without the directory prefix `dir`, keeping the leading `/`
fn strip_dir_prefix<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let dir = dir.trim_end_matches('/');
    path.strip_prefix(dir)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Site path of the HTML page rendered from a markdown source
pub fn html_path(source_path: &str) -> String {
    match source_path.strip_suffix(".md") {
        Some(stem) => format!("{}.html", stem),
        None => source_path.to_string(),
    }
}

/// Relative prefix leading from a page back to the site root
pub fn relativize_from_root(path: &str) -> String {
    let depth = path.split('/').count().saturating_sub(2);
    if depth == 0 {
        "./".to_string()
    } else {
        "../".repeat(depth)
    }
}

/// Rewrites `href`/`src` values so they resolve inside the output tree
pub struct LinkRewriter {
    textures_dir: Option<String>,
    texture_pattern: Option<Regex>,
}

impl LinkRewriter {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let textures_dir = config
            .textures_dir
            .as_ref()
            .map(|dir| dir.trim_end_matches('/').to_string());
        let texture_pattern = match &textures_dir {
            Some(dir) => Some(Regex::new(&format!(
                r"{}/((?:[a-z_]+/)+[a-z_]+\.png)",
                regex::escape(dir)
            ))?),
            None => None,
        };

        Ok(Self {
            textures_dir,
            texture_pattern,
        })
    }

    /// Rewrite one attribute value.
    ///
    /// Rules are checked against the raw value, first match wins:
    /// texture reference, markdown page link, leading `../`.
    pub fn rewrite(&self, value: &str, assets: &mut AssetRegistry) -> String {
        if let (Some(pattern), Some(textures_dir)) = (&self.texture_pattern, &self.textures_dir) {
            if let Some(caps) = pattern.captures(value) {
                let key = &caps[1];
                assets.register(key, format!("{}/{}", textures_dir, key));
                return value.replacen(textures_dir.as_str(), TEXTURE_ASSETS_DIR, 1);
            }
        }

        if is_external(value) {
            return value.to_string();
        }

        if markdown_link_regex().is_match(value) {
            return markdown_link_regex().replace(value, ".html$1").into_owned();
        }

        match value.strip_prefix("../") {
            Some(rest) => rest.to_string(),
            None => value.to_string(),
        }
    }

    /// Rewrite every `href` and `src` attribute in a node tree, including
    /// the ones written as raw HTML
    pub fn rewrite_links(&self, nodes: &mut [Node], assets: &mut AssetRegistry) {
        for node in nodes {
            match node {
                Node::Element(element) => {
                    for (name, value) in element.attrs.iter_mut() {
                        if name == "href" || name == "src" {
                            *value = self.rewrite(value, assets);
                        }
                    }
                    self.rewrite_links(&mut element.children, assets);
                }
                Node::Heading(heading) => self.rewrite_links(&mut heading.children, assets),
                Node::Raw(html) => *html = self.rewrite_raw(html, assets),
                _ => {}
            }
        }
    }

    /// Rewrite quoted `href`/`src` attributes inside a raw HTML fragment
    pub fn rewrite_raw(&self, html: &str, assets: &mut AssetRegistry) -> String {
        raw_link_attr_regex()
            .replace_all(html, |caps: &Captures| {
                let (quote, value) = match (caps.get(3), caps.get(4)) {
                    (Some(value), _) => ('"', value.as_str()),
                    (None, Some(value)) => ('\'', value.as_str()),
                    (None, None) => return caps[0].to_string(),
                };
                format!("{}{}{}{}{}", &caps[1], &caps[2], quote, self.rewrite(value, assets), quote)
            })
            .into_owned()
    }
}

fn is_external(value: &str) -> bool {
    value.contains("://") || value.starts_with("mailto:") || value.starts_with("data:")
}

/// `href="..."` or `src='...'` in a raw tag
fn raw_link_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\b(href|src)(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap())
}

/// `.md` extension, possibly followed by a fragment or query
fn markdown_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.md($|[#?])").unwrap())
}
