//! Expansion of `include:<offset>:<path>` directives.
//!
//! Only directives at the top level of a page body are expanded; a
//! directive nested inside a list or quote is emitted as a comment.
//! Included excerpts are taken from the target as loaded, so inclusion is
//! not transitive.

use super::page::{Page, Pages};
use super::paths::relativize_from_root;
use crate::parser::dom::{Element, Node};
use crate::parser::Directive;

/// Page body with every top-level include directive replaced
pub fn expand_includes(page: &Page, pages: &Pages) -> Vec<Node> {
    page.content
        .iter()
        .map(|node| match node {
            Node::Directive(Directive::Include { offset, path }) => include_block(page, path, *offset, pages),
            other => other.clone(),
        })
        .collect()
}

fn include_block(page: &Page, target: &str, offset: i32, pages: &Pages) -> Node {
    let Some(included) = pages.get(&page_key(target)) else {
        tracing::warn!("{}: cannot include missing page {}", page.source_path, target);
        return Element::new("p")
            .with_child(format!("Failed to include page \"{}\".", target))
            .into();
    };

    let href = format!(
        "{}{}",
        relativize_from_root(&page.html_path),
        included.html_path.trim_start_matches("./")
    );
    let summary = Element::new("summary")
        .with_child("Related information from the page ")
        .with_child(Element::new("a").with_attr("href", href).with_child(included.raw_title.clone()))
        .with_child(".");

    let excerpt = included.content.iter().map(|node| match node {
        Node::Heading(heading) => Node::Heading(heading.shifted(offset)),
        other => other.clone(),
    });

    Element::new("details")
        .with_child(summary)
        .with_children(excerpt)
        .into()
}

/// Registry key for an include target, accepting `foo.md` for `./foo.md`
fn page_key(target: &str) -> String {
    if target.starts_with("./") || target.starts_with("../") {
        target.to_string()
    } else {
        format!("./{}", target)
    }
}
