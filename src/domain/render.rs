//! Tree rendering: pre-order, depth-indented text dump.

use std::io::{self, Write};

use generational_arena::Index;
use termtree::Tree;

use crate::domain::arena::LoaderTree;

/// Indentation added per tree level.
pub const INDENT_UNIT: &str = "  ";
/// Extra indentation of package lines relative to their node.
pub const PACKAGE_INDENT: &str = "     ";

/// Output layout of a rendered tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Style {
    /// One line per name, label and package, indented by depth
    #[default]
    Indented,
    /// Box-drawing tree
    Ascii,
}

/// Renders `tree` as lines in pre-order.
///
/// Per node: its name, an optional `Thread: <label>` line, then at most
/// `max_packages` package names taken from the front of its sorted list.
/// Sibling order follows the tree's child map and is unspecified.
pub fn render_lines(tree: &LoaderTree, max_packages: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (depth, _, node) in tree.iter() {
        let indent = INDENT_UNIT.repeat(depth);
        lines.push(format!("{}{}", indent, node.name()));
        if let Some(label) = node.label() {
            lines.push(format!("{}{}Thread: {}", indent, INDENT_UNIT, label));
        }
        for package in node.packages().iter().take(max_packages) {
            lines.push(format!("{}{}{}", indent, PACKAGE_INDENT, package));
        }
    }
    lines
}

/// Converts `tree` into a `termtree` tree with the same content as the
/// indented form.
pub fn to_termtree(tree: &LoaderTree, max_packages: usize) -> Tree<String> {
    build_termtree(tree, tree.root(), max_packages)
}

fn build_termtree(tree: &LoaderTree, idx: Index, max_packages: usize) -> Tree<String> {
    let Some(node) = tree.get(idx) else {
        return Tree::new(String::new());
    };

    let mut out = Tree::new(node.name().to_string());
    if let Some(label) = node.label() {
        out.push(Tree::new(format!("Thread: {}", label)));
    }
    for package in node.packages().iter().take(max_packages) {
        out.push(Tree::new(package.clone()));
    }
    for child in node.children() {
        out.push(build_termtree(tree, child, max_packages));
    }
    out
}

/// Writes `tree` to `out` in the requested style.
pub fn write_tree(
    tree: &LoaderTree,
    max_packages: usize,
    style: Style,
    out: &mut dyn Write,
) -> io::Result<()> {
    match style {
        Style::Indented => {
            for line in render_lines(tree, max_packages) {
                writeln!(out, "{}", line)?;
            }
        }
        Style::Ascii => write!(out, "{}", to_termtree(tree, max_packages))?,
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loader::{Loader, LoaderRef};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Fixed(&'static str, Vec<&'static str>);

    impl Loader for Fixed {
        fn name(&self) -> String {
            self.0.to_string()
        }
        fn defined_packages(&self) -> Vec<String> {
            self.1.iter().map(|s| s.to_string()).collect()
        }
        fn parent(&self) -> Option<LoaderRef> {
            None
        }
    }

    #[test]
    fn given_empty_tree_when_rendering_then_single_root_line() {
        let tree = LoaderTree::new("[root]");
        assert_eq!(render_lines(&tree, 5), vec!["[root]"]);
    }

    #[test]
    fn given_ascii_style_when_writing_then_contains_names() {
        let mut tree = LoaderTree::new("[root]");
        let app: LoaderRef = Arc::new(Fixed("app", vec!["com.example"]));
        crate::domain::builder::TreeBuilder::new().fold_chain(&mut tree, "main", &[app]);

        let mut out = Vec::new();
        write_tree(&tree, 5, Style::Ascii, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("[root]"));
        assert!(text.contains("app"));
        assert!(text.contains("Thread: main"));
        assert!(text.contains("com.example"));
    }
}
