//! Engine-independent syntax tree.
//!
//! Template engines lower their own AST into [`Node`] so that dependency
//! extraction never has to know which engine produced the tree. A node has a
//! [`NodeKind`], an ordered set of named sub-nodes and a set of named
//! attributes, which is all the extractor needs to find includes, embeds and
//! parents.

use indexmap::IndexMap;
use minijinja::Value;

/// Sub-node holding the target expression of an include, import or extends.
pub const EXPR: &str = "expr";
/// Sub-node of the module node holding the parent template expression.
pub const PARENT: &str = "parent";
/// Sub-node holding the statements of a module, block or control-flow node.
pub const BODY: &str = "body";
/// Attribute of a constant node holding its literal value.
pub const VALUE: &str = "value";
/// Attribute of a named node (blocks, macros, modules).
pub const NAME: &str = "name";
/// Attribute of the module node listing every embedded template in source order.
pub const EMBEDDED_TEMPLATES: &str = "embedded_templates";
/// Attribute of an include node set by `ignore missing`.
pub const IGNORE_MISSING: &str = "ignore_missing";
/// Attribute of an embed node pointing into [`EMBEDDED_TEMPLATES`].
pub const EMBED_INDEX: &str = "index";

/// Target value an embed node carries in its `expr` sub-node.
///
/// Twig-style engines model `{% embed %}` as an include whose real target is
/// resolved through the embedded template's parent, and fill the unused
/// include target with this string. It never names a real template.
pub const NOT_USED: &str = "not_used";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of a parsed template.
    Module,
    /// Ordered list of statements.
    Body,
    Text,
    Print,
    Include,
    /// An inline template; also answers to [`NodeKind::Include`].
    Embed,
    Extends,
    Import,
    Block,
    If,
    For,
    With,
    Set,
    Macro,
    Call,
    Filter,
    AutoEscape,
    /// A literal expression with a [`VALUE`] attribute.
    Constant,
    /// Any expression whose value is only known at render time.
    Expression,
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Value(Value),
    Templates(Vec<Node>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    kind: NodeKind,
    line: usize,
    nodes: IndexMap<String, Node>,
    attributes: IndexMap<String, Attribute>,
}

impl Node {
    pub fn new(kind: NodeKind, line: usize) -> Self {
        Self {
            kind,
            line,
            nodes: IndexMap::new(),
            attributes: IndexMap::new(),
        }
    }

    /// A literal expression node.
    pub fn constant(value: impl Into<Value>, line: usize) -> Self {
        Self::new(NodeKind::Constant, line).with_attribute(VALUE, Attribute::Value(value.into()))
    }

    /// An expression that can only be evaluated at render time.
    pub fn expression(line: usize) -> Self {
        Self::new(NodeKind::Expression, line)
    }

    /// A statement list; children are keyed by their position.
    pub fn body(children: impl IntoIterator<Item = Node>, line: usize) -> Self {
        let mut body = Self::new(NodeKind::Body, line);
        for (i, child) in children.into_iter().enumerate() {
            body.nodes.insert(i.to_string(), child);
        }
        body
    }

    pub fn include(expr: Node, line: usize) -> Self {
        Self::new(NodeKind::Include, line).with_node(EXPR, expr)
    }

    pub fn extends(expr: Node, line: usize) -> Self {
        Self::new(NodeKind::Extends, line).with_node(EXPR, expr)
    }

    /// The placeholder left in the body where embedded template `index` is used.
    pub fn embed(index: usize, line: usize) -> Self {
        Self::new(NodeKind::Embed, line)
            .with_node(EXPR, Self::constant(NOT_USED, line))
            .with_attribute(EMBED_INDEX, Attribute::Value(Value::from(index)))
    }

    /// The root node of a template named `name`.
    ///
    /// `embedded_templates` is always present, possibly empty.
    pub fn module(name: &str, body: Node, parent: Option<Node>, embedded: Vec<Node>) -> Self {
        let mut module = Self::new(NodeKind::Module, 1)
            .with_node(BODY, body)
            .with_attribute(NAME, Attribute::Value(Value::from(name)))
            .with_attribute(EMBEDDED_TEMPLATES, Attribute::Templates(embedded));
        if let Some(parent) = parent {
            module = module.with_node(PARENT, parent);
        }
        module
    }

    #[must_use]
    pub fn with_node(mut self, key: &str, node: Node) -> Self {
        self.nodes.insert(key.to_string(), node);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: &str, attribute: Attribute) -> Self {
        self.attributes.insert(key.to_string(), attribute);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether this node is of `kind`. Embeds count as includes.
    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind || (self.kind == NodeKind::Embed && kind == NodeKind::Include)
    }

    /// All sub-nodes in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    /// The literal value of a [`NodeKind::Constant`] node; `None` for anything else.
    pub fn constant_value(&self) -> Option<&Value> {
        if self.kind != NodeKind::Constant {
            return None;
        }
        match self.attribute(VALUE) {
            Some(Attribute::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Embedded templates attached to this node, if any.
    pub fn embedded_templates(&self) -> &[Node] {
        match self.attribute(EMBEDDED_TEMPLATES) {
            Some(Attribute::Templates(templates)) => templates,
            _ => &[],
        }
    }

    /// The `name` attribute as a string, for blocks, macros and modules.
    pub fn name(&self) -> Option<&str> {
        match self.attribute(NAME) {
            Some(Attribute::Value(value)) => value.as_str(),
            _ => None,
        }
    }
}
