//! Graphviz export of parse trees.
//!
//! Nodes are identified by their lazily assigned display names, so
//! exporting the same tree twice produces byte-identical output.

use crate::ast::AstNode;

/// Emit `root` as a `digraph`, one node statement per tree node and
/// one edge per parent-child pair, children in order.
pub fn to_dot(root: &AstNode) -> String {
    let mut out = String::from("digraph ast {\n");
    write_node(root, &mut out);
    out.push_str("}\n");
    out
}

fn write_node(node: &AstNode, out: &mut String) {
    let label = match &node.value {
        Some(value) => format!("{}\\n{}", node.kind, escape(value)),
        None => node.kind.to_string(),
    };
    out.push_str(&format!("  \"{}\" [label=\"{}\"]\n", node.display_name(), label));
    for child in &node.children {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\"\n",
            node.display_name(),
            child.display_name()
        ));
        write_node(child, out);
    }
}

// String-literal lexemes keep their quotes and escapes, both of which
// would otherwise terminate the DOT label.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstKind;

    #[test]
    fn test_to_dot_lists_every_node_and_edge() {
        let root = AstNode::valued(
            AstKind::JumpStatement,
            "return",
            vec![AstNode::leaf(AstKind::Constant, "0")],
        );
        let dot = to_dot(&root);

        assert!(dot.starts_with("digraph ast {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("[label=\"jump_statement\\nreturn\"]"));
        assert!(dot.contains("[label=\"constant\\n0\"]"));
        let edge = format!(
            "\"{}\" -> \"{}\"",
            root.display_name(),
            root.children[0].display_name()
        );
        assert!(dot.contains(&edge));
    }

    #[test]
    fn test_to_dot_is_stable_across_exports() {
        let root = AstNode::interior(
            AstKind::Expression,
            vec![
                AstNode::leaf(AstKind::Identifier, "a"),
                AstNode::leaf(AstKind::Identifier, "b"),
            ],
        );
        assert_eq!(to_dot(&root), to_dot(&root));
    }

    #[test]
    fn test_to_dot_escapes_quoted_lexemes() {
        let root = AstNode::leaf(AstKind::StringLiteral, "\"hi\"");
        let dot = to_dot(&root);
        assert!(dot.contains("string_literal\\n\\\"hi\\\""));
    }
}
