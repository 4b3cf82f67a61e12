use crate::parser::dom::Node;

/// One heading of a page with the headings nested under it
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub level: u8,
    pub id: String,
    /// Inline content of the heading
    pub content: Vec<Node>,
    pub children: Vec<OutlineEntry>,
}

/// Outline of a whole page, starting at level 1
pub fn page_outline(nodes: &[Node]) -> Vec<OutlineEntry> {
    build_outline(nodes, 0, 1)
}

/// Collect the headings of `level` found from `start` until a shallower
/// heading, each with its deeper headings as children.
///
/// If the first heading found is deeper than `level`, that deeper level is
/// used instead. Once entries exist, deeper headings that are not directly
/// below an entry are skipped.
pub fn build_outline(nodes: &[Node], start: usize, level: u8) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();

    for (i, node) in nodes.iter().enumerate().skip(start) {
        let Node::Heading(heading) = node else {
            continue;
        };

        if heading.level < level {
            break;
        } else if heading.level > level {
            if entries.is_empty() {
                entries = build_outline(nodes, i, heading.level);
            }
        } else {
            entries.push(OutlineEntry {
                level: heading.level,
                id: heading.id.clone(),
                content: heading.children.clone(),
                children: build_outline(nodes, i + 1, level + 1),
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::Heading;
    use crate::parser::render_markdown;

    fn heading(level: u8, id: &str) -> Node {
        Node::Heading(Heading {
            level,
            id: id.to_string(),
            children: vec![Node::Text(id.to_string())],
        })
    }

    fn ids(entries: &[OutlineEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_retargets_to_first_heading_level() {
        let nodes = vec![heading(2, "a"), heading(2, "b"), heading(3, "b1"), heading(2, "c")];
        let outline = build_outline(&nodes, 0, 1);

        assert_eq!(ids(&outline), vec!["a", "b", "c"]);
        assert!(outline[0].children.is_empty());
        assert_eq!(ids(&outline[1].children), vec!["b1"]);
        assert!(outline[2].children.is_empty());
    }

    #[test]
    fn test_nested_levels() {
        let nodes = vec![
            heading(1, "page"),
            heading(2, "usage"),
            heading(3, "crafting"),
            heading(3, "placing"),
            heading(2, "trivia"),
        ];
        let outline = page_outline(&nodes);

        assert_eq!(ids(&outline), vec!["page"]);
        assert_eq!(ids(&outline[0].children), vec!["usage", "trivia"]);
        assert_eq!(ids(&outline[0].children[0].children), vec!["crafting", "placing"]);
        assert_eq!(outline[0].children[0].level, 2);
    }

    #[test]
    fn test_multiple_top_level_headings() {
        let nodes = vec![heading(1, "one"), heading(2, "one-a"), heading(1, "two")];
        let outline = page_outline(&nodes);

        assert_eq!(ids(&outline), vec!["one", "two"]);
        assert_eq!(ids(&outline[0].children), vec!["one-a"]);
    }

    #[test]
    fn test_shallower_heading_after_deep_start_is_dropped() {
        let nodes = vec![heading(3, "deep"), heading(2, "shallower")];
        let outline = page_outline(&nodes);

        assert_eq!(ids(&outline), vec!["deep"]);
        assert!(outline[0].children.is_empty());
    }

    #[test]
    fn test_non_heading_nodes_are_skipped() {
        let nodes = render_markdown("# Lanterns\n\nSome text.\n\n## Crafting\n\n- item\n\n## Usage\n");
        let outline = page_outline(&nodes);

        assert_eq!(ids(&outline), vec!["lanterns"]);
        assert_eq!(ids(&outline[0].children), vec!["crafting", "usage"]);
        assert_eq!(outline[0].content, vec![Node::Text("Lanterns".to_string())]);
    }

    #[test]
    fn test_empty_page() {
        assert!(page_outline(&[]).is_empty());
    }
}
