//! [`TemplateEngine`] backed by MiniJinja.
//!
//! Parsing goes through MiniJinja's `unstable_machinery` API, which exposes
//! the raw AST. The AST is lowered into [`Node`] right away so nothing outside
//! this module depends on that unstable surface.
//!
//! MiniJinja has no `{% embed %}` statement, so modules produced here always
//! carry an empty `embedded_templates` attribute.

use std::collections::HashSet;

use minijinja::machinery::{ast, parse, Span, WhitespaceConfig};
use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, ErrorKind, UndefinedBehavior};

use crate::config::InspectorConfig;
use crate::engine::{CompiledTemplate, Source, TemplateEngine};
use crate::error::{Error, ErrorDetails};
use crate::extract::{defines_block, parents};
use crate::node::{Attribute, Node, NodeKind, BODY, EXPR, IGNORE_MISSING, NAME};

#[derive(Debug)]
pub struct MiniJinjaEngine<'env> {
    env: Environment<'env>,
}

impl MiniJinjaEngine<'_> {
    pub fn new(config: &InspectorConfig) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(if config.strict_undefined {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        });
        if let Some(path) = &config.template_dir {
            env.set_loader(minijinja::path_loader(path));
        }
        Self { env }
    }

    /// Registers an in-memory template, shadowing anything the loader would find.
    pub fn add_template(&mut self, source: &Source) -> Result<(), Error> {
        self.env
            .add_template_owned(source.name.clone(), source.code.clone())
            .map_err(|e| Error::new(ErrorDetails::template_parsing(&source.name, e)))
    }
}

impl TemplateEngine for MiniJinjaEngine<'_> {
    type Error = minijinja::Error;
    type Template<'a>
        = MiniJinjaTemplate<'a>
    where
        Self: 'a;

    fn parse(&self, source: &Source) -> Result<Node, minijinja::Error> {
        parse_template(&source.name, &source.code)
    }

    fn load(&self, name: &str) -> Result<MiniJinjaTemplate<'_>, minijinja::Error> {
        Ok(MiniJinjaTemplate {
            env: &self.env,
            template: self.env.get_template(name)?,
        })
    }
}

/// A loaded template. Blocks are looked up and rendered without running the
/// template body, so top-level code never affects block rendering.
pub struct MiniJinjaTemplate<'a> {
    env: &'a Environment<'a>,
    template: minijinja::Template<'a, 'a>,
}

impl<'a> MiniJinjaTemplate<'a> {
    /// Follows the static `extends` chain up to the first template declaring
    /// `block`. A dynamic parent ends the search.
    fn block_owner(
        &self,
        block: &str,
    ) -> Result<Option<minijinja::Template<'a, 'a>>, minijinja::Error> {
        let mut seen = HashSet::new();
        let mut current = self.env.get_template(self.template.name())?;
        while seen.insert(current.name().to_string()) {
            let root = parse_template(current.name(), current.source())?;
            if defines_block(&root, block) {
                return Ok(Some(current));
            }
            let Some(parent) = parents(&root).into_iter().next() else {
                break;
            };
            current = self.env.get_template(&parent)?;
        }
        Ok(None)
    }
}

impl CompiledTemplate for MiniJinjaTemplate<'_> {
    type Error = minijinja::Error;

    fn has_block(&self, block: &str) -> Result<bool, minijinja::Error> {
        Ok(self.block_owner(block)?.is_some())
    }

    fn render_block(&self, block: &str) -> Result<String, minijinja::Error> {
        let owner = self.block_owner(block)?.ok_or_else(|| {
            minijinja::Error::new(
                ErrorKind::UnknownBlock,
                format!("block '{block}' not found in {}", self.template.name()),
            )
        })?;
        let mut state = owner.new_state();
        state.render_block(block)
    }
}

fn parse_template(name: &str, code: &str) -> Result<Node, minijinja::Error> {
    let stmt = parse(code, name, SyntaxConfig::default(), WhitespaceConfig::default())?;
    Ok(lower_template(name, &stmt))
}

fn lower_template(name: &str, stmt: &ast::Stmt<'_>) -> Node {
    let ast::Stmt::Template(template) = stmt else {
        return Node::module(name, lower_body(std::slice::from_ref(stmt), 1), None, vec![]);
    };
    // Only a top-level `extends` makes a template a child template.
    let parent = template.children.iter().find_map(|child| match child {
        ast::Stmt::Extends(extends) => {
            Some(lower_expr(&extends.name, line_of(extends.span())))
        }
        _ => None,
    });
    Node::module(name, lower_body(&template.children, 1), parent, vec![])
}

fn lower_body(stmts: &[ast::Stmt<'_>], line: usize) -> Node {
    Node::body(stmts.iter().map(|stmt| lower_stmt(stmt, line)), line)
}

/// Lowers one statement. `outer_line` is used for statements that carry no
/// span of their own in the lowered tree.
fn lower_stmt(stmt: &ast::Stmt<'_>, outer_line: usize) -> Node {
    match stmt {
        ast::Stmt::Template(template) => {
            lower_body(&template.children, line_of(template.span()))
        }
        ast::Stmt::EmitRaw(raw) => Node::new(NodeKind::Text, line_of(raw.span())),
        ast::Stmt::EmitExpr(emit) => {
            let line = line_of(emit.span());
            Node::new(NodeKind::Print, line).with_node(EXPR, lower_expr(&emit.expr, line))
        }
        ast::Stmt::Include(include) => {
            let line = line_of(include.span());
            Node::include(lower_expr(&include.name, line), line).with_attribute(
                IGNORE_MISSING,
                Attribute::Value(include.ignore_missing.into()),
            )
        }
        ast::Stmt::Extends(extends) => {
            let line = line_of(extends.span());
            Node::extends(lower_expr(&extends.name, line), line)
        }
        ast::Stmt::Import(import) => {
            let line = line_of(import.span());
            Node::new(NodeKind::Import, line).with_node(EXPR, lower_expr(&import.expr, line))
        }
        ast::Stmt::FromImport(import) => {
            let line = line_of(import.span());
            Node::new(NodeKind::Import, line).with_node(EXPR, lower_expr(&import.expr, line))
        }
        ast::Stmt::Block(block) => {
            let line = line_of(block.span());
            Node::new(NodeKind::Block, line)
                .with_attribute(NAME, Attribute::Value(block.name.into()))
                .with_node(BODY, lower_body(&block.body, line))
        }
        ast::Stmt::IfCond(cond) => {
            let line = line_of(cond.span());
            Node::new(NodeKind::If, line)
                .with_node(EXPR, lower_expr(&cond.expr, line))
                .with_node(BODY, lower_body(&cond.true_body, line))
                .with_node("else", lower_body(&cond.false_body, line))
        }
        ast::Stmt::ForLoop(for_loop) => {
            let line = line_of(for_loop.span());
            Node::new(NodeKind::For, line)
                .with_node(EXPR, lower_expr(&for_loop.iter, line))
                .with_node(BODY, lower_body(&for_loop.body, line))
                .with_node("else", lower_body(&for_loop.else_body, line))
        }
        ast::Stmt::WithBlock(with) => {
            let line = line_of(with.span());
            Node::new(NodeKind::With, line).with_node(BODY, lower_body(&with.body, line))
        }
        ast::Stmt::Set(set) => Node::new(NodeKind::Set, line_of(set.span())),
        ast::Stmt::SetBlock(set) => {
            let line = line_of(set.span());
            Node::new(NodeKind::Set, line).with_node(BODY, lower_body(&set.body, line))
        }
        ast::Stmt::AutoEscape(auto_escape) => {
            let line = line_of(auto_escape.span());
            Node::new(NodeKind::AutoEscape, line)
                .with_node(BODY, lower_body(&auto_escape.body, line))
        }
        ast::Stmt::FilterBlock(filter) => {
            let line = line_of(filter.span());
            Node::new(NodeKind::Filter, line).with_node(BODY, lower_body(&filter.body, line))
        }
        ast::Stmt::Macro(macro_decl) => {
            let line = line_of(macro_decl.span());
            Node::new(NodeKind::Macro, line)
                .with_attribute(NAME, Attribute::Value(macro_decl.name.into()))
                .with_node(BODY, lower_body(&macro_decl.body, line))
        }
        ast::Stmt::CallBlock(call) => {
            let line = line_of(call.span());
            Node::new(NodeKind::Call, line)
                .with_node(BODY, lower_body(&call.macro_decl.body, line))
        }
        _ => Node::new(NodeKind::Other, outer_line),
    }
}

fn lower_expr(expr: &ast::Expr<'_>, line: usize) -> Node {
    match expr {
        ast::Expr::Const(constant) => Node::constant(constant.value.clone(), line),
        _ => Node::expression(line),
    }
}

fn line_of(span: Span) -> usize {
    span.start_line as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PARENT;
    use minijinja::Value;

    fn parse_source(code: &str) -> Node {
        let engine = MiniJinjaEngine::new(&InspectorConfig::default());
        engine.parse(&Source::new("page.html", code)).unwrap()
    }

    fn body_kinds(root: &Node) -> Vec<NodeKind> {
        root.node(BODY).unwrap().children().map(Node::kind).collect()
    }

    #[test]
    fn test_plain_text() {
        let root = parse_source("Hello");
        assert_eq!(root.kind(), NodeKind::Module);
        assert_eq!(root.name(), Some("page.html"));
        assert_eq!(body_kinds(&root), vec![NodeKind::Text]);
        assert!(!root.has_node(PARENT));
        assert!(root.embedded_templates().is_empty());
    }

    #[test]
    fn test_include_lowering() {
        let root = parse_source("{% include 'a.html' ignore missing %}");
        let include = root.node(BODY).unwrap().node("0").unwrap();
        assert_eq!(include.kind(), NodeKind::Include);
        assert_eq!(
            include.node(EXPR).unwrap().constant_value(),
            Some(&Value::from("a.html"))
        );
        assert_eq!(
            include.attribute(IGNORE_MISSING),
            Some(&Attribute::Value(Value::from(true)))
        );
    }

    #[test]
    fn test_dynamic_include_lowers_to_expression() {
        let root = parse_source("{% include template_name %}");
        let include = root.node(BODY).unwrap().node("0").unwrap();
        assert_eq!(include.node(EXPR).unwrap().kind(), NodeKind::Expression);
    }

    #[test]
    fn test_extends_sets_module_parent() {
        let root = parse_source("{% extends 'base.html' %}{% block content %}x{% endblock %}");
        assert_eq!(
            root.node(PARENT).unwrap().constant_value(),
            Some(&Value::from("base.html"))
        );
        assert_eq!(body_kinds(&root), vec![NodeKind::Extends, NodeKind::Block]);
        let block = root.node(BODY).unwrap().node("1").unwrap();
        assert_eq!(block.name(), Some("content"));
    }

    #[test]
    fn test_control_flow_keeps_bodies() {
        let root = parse_source(
            "{% if x %}{% include 'a.html' %}{% else %}{% include 'b.html' %}{% endif %}\
             {% for i in items %}{% include 'c.html' %}{% endfor %}",
        );
        assert_eq!(body_kinds(&root), vec![NodeKind::If, NodeKind::For]);
        let cond = root.node(BODY).unwrap().node("0").unwrap();
        assert!(cond.node(BODY).unwrap().has_node("0"));
        assert!(cond.node("else").unwrap().has_node("0"));
    }

    #[test]
    fn test_imports_and_macros() {
        let root = parse_source(
            "{% import 'macros.html' as m %}{% from 'forms.html' import field %}\
             {% macro card() %}{% include 'card.html' %}{% endmacro %}",
        );
        assert_eq!(
            body_kinds(&root),
            vec![NodeKind::Import, NodeKind::Import, NodeKind::Macro]
        );
    }

    #[test]
    fn test_syntax_error() {
        let engine = MiniJinjaEngine::new(&InspectorConfig::default());
        let err = engine
            .parse(&Source::new("broken.html", "{% if x %}unterminated"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_render_block() {
        let mut engine = MiniJinjaEngine::new(&InspectorConfig::default());
        engine
            .add_template(&Source::new(
                "card.html",
                "{% block patterninfo %}name: Card{% endblock %}body",
            ))
            .unwrap();
        let template = engine.load("card.html").unwrap();
        assert!(template.has_block("patterninfo").unwrap());
        assert!(!template.has_block("missing").unwrap());
        assert_eq!(template.render_block("patterninfo").unwrap(), "name: Card");
    }

    #[test]
    fn test_block_lookup_skips_template_body() {
        let mut engine = MiniJinjaEngine::new(&InspectorConfig::default());
        engine
            .add_template(&Source::new(
                "card.html",
                "{% include 'header.html' %}<p>{{ user.name }}</p>\
                 {% if x %}{% block patterninfo %}name: Card{% endblock %}{% endif %}",
            ))
            .unwrap();
        let template = engine.load("card.html").unwrap();
        assert!(template.has_block("patterninfo").unwrap());
        assert!(!template.has_block("missing").unwrap());
        assert_eq!(template.render_block("patterninfo").unwrap(), "name: Card");
    }

    #[test]
    fn test_block_lookup_follows_parents() {
        let mut engine = MiniJinjaEngine::new(&InspectorConfig::default());
        engine
            .add_template(&Source::new(
                "base.html",
                "{{ page.title }}{% block patterninfo %}base{% endblock %}",
            ))
            .unwrap();
        engine
            .add_template(&Source::new("middle.html", "{% extends 'base.html' %}"))
            .unwrap();
        engine
            .add_template(&Source::new(
                "child.html",
                "{% extends 'middle.html' %}{% block other %}{% endblock %}",
            ))
            .unwrap();
        let template = engine.load("child.html").unwrap();
        assert!(template.has_block("patterninfo").unwrap());
        assert_eq!(template.render_block("patterninfo").unwrap(), "base");
    }

    #[test]
    fn test_overridden_block_wins() {
        let mut engine = MiniJinjaEngine::new(&InspectorConfig::default());
        engine
            .add_template(&Source::new(
                "base.html",
                "{% block patterninfo %}base{% endblock %}",
            ))
            .unwrap();
        engine
            .add_template(&Source::new(
                "child.html",
                "{% extends 'base.html' %}{% block patterninfo %}child{% endblock %}",
            ))
            .unwrap();
        let template = engine.load("child.html").unwrap();
        assert_eq!(template.render_block("patterninfo").unwrap(), "child");
    }

    #[test]
    fn test_render_unknown_block() {
        let mut engine = MiniJinjaEngine::new(&InspectorConfig::default());
        engine
            .add_template(&Source::new("plain.html", "plain"))
            .unwrap();
        let template = engine.load("plain.html").unwrap();
        let err = template.render_block("patterninfo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownBlock);
    }

    #[test]
    fn test_load_missing_template() {
        let engine = MiniJinjaEngine::new(&InspectorConfig::default());
        let err = engine.load("nope.html").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
    }
}
