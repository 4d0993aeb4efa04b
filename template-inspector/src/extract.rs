//! Static dependency extraction over a [`Node`] tree.
//!
//! Only literal string targets are reported. Targets computed at render time
//! (variables, function calls, conditionals) are skipped without error, since
//! they cannot be known before the template is executed.

use crate::node::{Node, NodeKind, EXPR, NOT_USED, PARENT};

/// Collects the target of every node of `kind` under (and including) `node`.
///
/// The walk is depth-first and each node's children are collected before the
/// node itself, so nested references precede their enclosing reference.
pub fn walk_nodes(node: &Node, kind: NodeKind) -> Vec<String> {
    let mut names = Vec::new();
    collect_nodes(node, kind, &mut names);
    names
}

fn collect_nodes(node: &Node, kind: NodeKind, names: &mut Vec<String>) {
    for child in node.children() {
        collect_nodes(child, kind, names);
    }
    if !node.is(kind) {
        return;
    }
    let Some(name) = node.node(EXPR).and_then(static_name) else {
        tracing::debug!(
            "Skipping {kind:?} on line {} with a dynamic target",
            node.line()
        );
        return;
    };
    if name != NOT_USED {
        names.push(name.to_string());
    }
}

/// Parents declared by the templates embedded in `node`.
///
/// Embedded templates are only checked for their own parent. Includes nested
/// inside an embed body are not reported here.
pub fn walk_embeds(node: &Node) -> Vec<String> {
    node.embedded_templates()
        .iter()
        .flat_map(parents)
        .collect()
}

/// The statically known parent of `node`, if it declares one.
pub fn parents(node: &Node) -> Vec<String> {
    let Some(parent) = node.node(PARENT) else {
        return Vec::new();
    };
    match static_name(parent) {
        Some(name) => vec![name.to_string()],
        None => {
            tracing::debug!("Skipping parent on line {} with a dynamic target", parent.line());
            Vec::new()
        }
    }
}

/// Whether `node` or anything below it declares the block `name`.
pub fn defines_block(node: &Node, name: &str) -> bool {
    (node.is(NodeKind::Block) && node.name() == Some(name))
        || node.children().any(|child| defines_block(child, name))
}

fn static_name(expr: &Node) -> Option<&str> {
    expr.constant_value()?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Attribute, BODY, IGNORE_MISSING, NAME};
    use minijinja::Value;

    fn include(target: &str) -> Node {
        Node::include(Node::constant(target, 1), 1)
    }

    fn module(body: Vec<Node>, parent: Option<Node>, embedded: Vec<Node>) -> Node {
        Node::module("page.html", Node::body(body, 1), parent, embedded)
    }

    #[test]
    fn test_empty_module() {
        let root = module(vec![Node::new(NodeKind::Text, 1)], None, vec![]);
        assert!(walk_nodes(&root, NodeKind::Include).is_empty());
        assert!(walk_embeds(&root).is_empty());
        assert!(parents(&root).is_empty());
    }

    #[test]
    fn test_includes_in_traversal_order() {
        let root = module(vec![include("a.html"), include("b.html")], None, vec![]);
        assert_eq!(walk_nodes(&root, NodeKind::Include), vec!["a.html", "b.html"]);
    }

    #[test]
    fn test_nested_references_precede_their_parent_node() {
        // An include whose own sub-tree holds another include.
        let outer = include("outer.html")
            .with_node("variables", Node::body([include("inner.html")], 2));
        let root = module(vec![outer], None, vec![]);
        assert_eq!(
            walk_nodes(&root, NodeKind::Include),
            vec!["inner.html", "outer.html"]
        );
    }

    #[test]
    fn test_includes_inside_control_flow() {
        let branch = Node::new(NodeKind::If, 1)
            .with_node(BODY, Node::body([include("then.html")], 2))
            .with_node("else", Node::body([include("else.html")], 3));
        let root = module(vec![branch], None, vec![]);
        assert_eq!(
            walk_nodes(&root, NodeKind::Include),
            vec!["then.html", "else.html"]
        );
    }

    #[test]
    fn test_sentinel_is_filtered() {
        let root = module(vec![include("a.html"), include(NOT_USED)], None, vec![]);
        assert_eq!(walk_nodes(&root, NodeKind::Include), vec!["a.html"]);
    }

    #[test]
    fn test_dynamic_include_is_skipped() {
        let dynamic = Node::include(Node::expression(1), 1);
        let root = module(vec![dynamic, include("static.html")], None, vec![]);
        assert_eq!(walk_nodes(&root, NodeKind::Include), vec!["static.html"]);
    }

    #[test]
    fn test_non_string_constant_is_skipped() {
        let numeric = Node::include(Node::constant(42, 1), 1);
        let root = module(vec![numeric], None, vec![]);
        assert!(walk_nodes(&root, NodeKind::Include).is_empty());
    }

    #[test]
    fn test_include_without_expr_is_skipped() {
        let bare = Node::new(NodeKind::Include, 1)
            .with_attribute(IGNORE_MISSING, Attribute::Value(Value::from(true)));
        let root = module(vec![bare], None, vec![]);
        assert!(walk_nodes(&root, NodeKind::Include).is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let root = module(vec![include("a.html"), include("a.html")], None, vec![]);
        assert_eq!(walk_nodes(&root, NodeKind::Include), vec!["a.html", "a.html"]);
    }

    #[test]
    fn test_walk_for_extends_kind() {
        let root = module(
            vec![Node::extends(Node::constant("base.html", 1), 1), include("a.html")],
            None,
            vec![],
        );
        assert_eq!(walk_nodes(&root, NodeKind::Extends), vec!["base.html"]);
        assert_eq!(walk_nodes(&root, NodeKind::Include), vec!["a.html"]);
    }

    #[test]
    fn test_static_parent() {
        let root = module(vec![], Some(Node::constant("base.html", 1)), vec![]);
        assert_eq!(parents(&root), vec!["base.html"]);
    }

    #[test]
    fn test_dynamic_parent_is_skipped() {
        let root = module(vec![], Some(Node::expression(1)), vec![]);
        assert!(parents(&root).is_empty());
    }

    #[test]
    fn test_embed_parents() {
        let embedded = vec![
            module(vec![], Some(Node::constant("embed_base.html", 2)), vec![]),
            module(vec![], None, vec![]),
            module(vec![], Some(Node::expression(4)), vec![]),
        ];
        let root = module(vec![Node::embed(0, 2)], None, embedded);
        assert_eq!(walk_embeds(&root), vec!["embed_base.html"]);
        // The embed placeholder itself only carries the sentinel.
        assert!(walk_nodes(&root, NodeKind::Include).is_empty());
    }

    #[test]
    fn test_includes_inside_embeds_are_not_reported() {
        let embedded = vec![module(
            vec![include("nested.html")],
            Some(Node::constant("embed_base.html", 2)),
            vec![],
        )];
        let root = module(vec![Node::embed(0, 2)], None, embedded);
        assert_eq!(walk_embeds(&root), vec!["embed_base.html"]);
        assert!(walk_nodes(&root, NodeKind::Include).is_empty());
    }

    #[test]
    fn test_missing_embedded_templates_attribute() {
        let root = Node::new(NodeKind::Module, 1);
        assert!(walk_embeds(&root).is_empty());
    }

    #[test]
    fn test_defines_nested_block() {
        let block = |name: &str, body: Vec<Node>| {
            Node::new(NodeKind::Block, 1)
                .with_attribute(NAME, Attribute::Value(Value::from(name)))
                .with_node(BODY, Node::body(body, 1))
        };
        let root = module(
            vec![Node::new(NodeKind::If, 1).with_node(
                BODY,
                Node::body([block("content", vec![block("patterninfo", vec![])])], 1),
            )],
            None,
            vec![],
        );
        assert!(defines_block(&root, "content"));
        assert!(defines_block(&root, "patterninfo"));
        // The module itself is named, but it is not a block.
        assert!(!defines_block(&root, "page.html"));
        assert!(!defines_block(&root, "footer"));
    }
}
