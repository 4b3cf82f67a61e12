//! Site-wide navigation sidebar.
//!
//! The tree is built once per build from every loaded page and then
//! rendered for each page, which only changes the open/current markers.

use super::outline::OutlineEntry;
use super::page::{Page, ROOT_PAGE};
use crate::parser::dom::{Element, Node};
use regex::{Captures, Regex};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub struct Navigation<'a> {
    home: Option<&'a Page>,
    entries: Vec<NavEntry<'a>>,
    home_label: String,
    /// URL path prefix of every link, empty for root-relative links
    root: String,
}

#[derive(Debug)]
pub enum NavEntry<'a> {
    Page(&'a Page),
    Directory(Directory<'a>),
}

#[derive(Debug)]
pub struct Directory<'a> {
    pub title: String,
    /// Path segments from the site root, e.g. `[".", "blocks", "lights"]`
    pub full_path: Vec<String>,
    pub entries: Vec<NavEntry<'a>>,
}

/// Directory trie keyed by path segment
#[derive(Default)]
struct DirNode<'a> {
    dirs: BTreeMap<String, DirNode<'a>>,
    pages: Vec<&'a Page>,
}

impl<'a> DirNode<'a> {
    fn insert(&mut self, dirs: &[&str], page: &'a Page) {
        match dirs.split_first() {
            Some((segment, rest)) => self
                .dirs
                .entry(segment.to_string())
                .or_default()
                .insert(rest, page),
            None => self.pages.push(page),
        }
    }

    fn into_entries(self, path: &[String]) -> Vec<NavEntry<'a>> {
        let mut entries: Vec<NavEntry<'a>> = self.pages.into_iter().map(NavEntry::Page).collect();

        for (segment, node) in self.dirs {
            let mut full_path = path.to_vec();
            full_path.push(segment.clone());
            entries.push(NavEntry::Directory(Directory {
                title: directory_title(&segment),
                entries: node.into_entries(&full_path),
                full_path,
            }));
        }

        entries.sort_by(|a, b| compare_titles(a.title(), b.title()).then_with(|| a.key().cmp(&b.key())));
        entries
    }
}

impl<'a> NavEntry<'a> {
    /// Label the entry is sorted by
    pub fn title(&self) -> &str {
        match self {
            NavEntry::Page(page) => &page.raw_title,
            NavEntry::Directory(dir) => &dir.title,
        }
    }

    /// Identity, used to order entries with equal titles
    fn key(&self) -> String {
        match self {
            NavEntry::Page(page) => page.source_path.clone(),
            NavEntry::Directory(dir) => dir.full_path.join("/"),
        }
    }

    /// Number of pages and directories in this subtree, itself included
    pub fn count(&self) -> usize {
        match self {
            NavEntry::Page(_) => 1,
            NavEntry::Directory(dir) => 1 + dir.entries.iter().map(NavEntry::count).sum::<usize>(),
        }
    }
}

impl<'a> Navigation<'a> {
    pub fn build(pages: impl IntoIterator<Item = &'a Page>, home_label: &str, root: &str) -> Self {
        let mut home = None;
        let mut trie = DirNode::default();

        for page in pages {
            if page.source_path == ROOT_PAGE {
                home = Some(page);
                continue;
            }
            let mut segments: Vec<&str> = page.source_path.split('/').collect();
            segments.pop();
            let dirs = match segments.first() {
                Some(&".") => &segments[1..],
                _ => &segments[..],
            };
            trie.insert(dirs, page);
        }

        if home.is_none() {
            tracing::warn!("no {} page found, the sidebar has no home entry", ROOT_PAGE);
        }

        Self {
            home,
            entries: trie.into_entries(&[".".to_string()]),
            home_label: home_label.to_string(),
            root: root.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[NavEntry<'a>] {
        &self.entries
    }

    #[cfg(test)]
    pub fn home(&self) -> Option<&'a Page> {
        self.home
    }

    /// Pages and directories in the tree, home page included
    pub fn entry_count(&self) -> usize {
        self.home.iter().count() + self.entries.iter().map(NavEntry::count).sum::<usize>()
    }

    /// Sidebar markup as seen from `current`
    pub fn render(&self, current: &Page) -> Element {
        let current_segments: Vec<&str> = current.html_path.split('/').collect();
        let mut list = Element::new("ul");

        if let Some(home) = self.home {
            let mut item = home.outline.first().cloned().unwrap_or_else(|| OutlineEntry {
                level: 1,
                id: String::new(),
                content: Vec::new(),
                children: Vec::new(),
            });
            item.content = vec![Node::Text(self.home_label.clone())];
            list.children.push(self.page_tree(home, &item, true, current).into());
        }

        for entry in &self.entries {
            self.render_entry(&mut list, entry, &current_segments, current);
        }

        Element::new("nav").with_child(list)
    }

    fn render_entry(&self, list: &mut Element, entry: &NavEntry, current_segments: &[&str], current: &Page) {
        match entry {
            NavEntry::Directory(dir) => {
                let mut subtree = Element::new("ul");
                for child in &dir.entries {
                    self.render_entry(&mut subtree, child, current_segments, current);
                }

                let mut li = Element::new("li")
                    .with_attr("class", "wiki_nav_directory ls_nav_dir_entry")
                    .with_child(dir.title.as_str())
                    .with_child(subtree);
                if is_open(dir, current_segments) {
                    li.set_attr("open", "");
                }
                list.children.push(li.into());
            }
            NavEntry::Page(page) => {
                for item in &page.outline {
                    list.children.push(self.page_tree(page, item, true, current).into());
                }
            }
        }
    }

    /// Sidebar item for one heading of `page` and its sub-headings
    fn page_tree(&self, page: &Page, item: &OutlineEntry, first: bool, current: &Page) -> Element {
        let mut href = self.page_href(page);
        if !first {
            href.push('#');
            href.push_str(&item.id);
        }

        let link = Element::new("div").with_child(
            Element::new("a")
                .with_attr("href", href)
                .with_children(item.content.iter().cloned()),
        );
        let mut tree = Element::new("li").with_child(link);

        if !item.children.is_empty() {
            if first {
                tree.set_attr("class", "wiki_nav_directory ls_nav_dir_entry");
            }
            let subtree = Element::new("ul")
                .with_children(item.children.iter().map(|child| self.page_tree(page, child, false, current).into()));
            tree.children.push(subtree.into());
        }

        if first && page.html_path == current.html_path {
            tree.set_attr("style", "background-color: rgba(0, 0, 0, 0.1)");
            tree.set_attr("open", "");
        }

        tree
    }

    /// `<root>/guide/setup.html`, or `<root>/guide/` for index pages
    fn page_href(&self, page: &Page) -> String {
        let path = page.html_path.strip_prefix('.').unwrap_or(&page.html_path);
        let path = path.strip_suffix("index.html").unwrap_or(path);
        format!("{}{}", self.root, path)
    }
}

/// Whether the page at `current_segments` lives somewhere inside `dir`
fn is_open(dir: &Directory, current_segments: &[&str]) -> bool {
    dir.full_path
        .iter()
        .enumerate()
        .all(|(i, segment)| current_segments.get(i) == Some(&segment.as_str()))
}

/// `decorative_blocks` -> `Decorative Blocks`
pub fn directory_title(segment: &str) -> String {
    static FIRST: OnceLock<Regex> = OnceLock::new();
    static WORD: OnceLock<Regex> = OnceLock::new();
    let first = FIRST.get_or_init(|| Regex::new(r"\w").unwrap());
    let word = WORD.get_or_init(|| Regex::new(r"_(\w)").unwrap());

    let capitalized = first.replace(segment, |caps: &Captures| caps[0].to_uppercase());
    word.replace_all(&capitalized, |caps: &Captures| format!(" {}", caps[1].to_uppercase()))
        .into_owned()
}

/// Case-insensitive ordering, ties broken by exact text
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
