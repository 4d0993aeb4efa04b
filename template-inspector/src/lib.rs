//! Static dependency inspection for templates.
//!
//! This crate finds which other templates a template depends on (includes,
//! embeds and extends) by walking its parsed syntax tree, without rendering it.
//! It is meant for pattern-library tooling that needs a dependency graph of its
//! templates.
//!
//! ## Core Concept
//!
//! Only **static** references are reported, meaning targets that are string
//! literals at parse time:
//!
//! - `{% include 'header.html' %}` ✓
//! - `{% extends 'base.html' %}` ✓
//! - `{% include template_var %}` ✗ (skipped, not an error)
//! - `{% include ['a.html', 'b.html'] %}` ✗ (skipped, not an error)
//!
//! The parsed tree is engine independent ([`Node`]). Engines implement
//! [`TemplateEngine`] to produce it; [`MiniJinjaEngine`] is the bundled one.
//!
//! ## Example
//!
//! ```rust
//! use template_inspector::{
//!     Inspector, InspectorConfig, MiniJinjaEngine, Source, TemplateInspector,
//! };
//!
//! let config = InspectorConfig::default();
//! let inspector = Inspector::new(MiniJinjaEngine::new(&config), &config);
//!
//! let source = Source::new(
//!     "page.html",
//!     "{% extends 'base.html' %}{% block content %}{% include 'card.html' %}{% endblock %}",
//! );
//! let linked = inspector.inspect_linked(&source).unwrap();
//! assert_eq!(linked, vec!["card.html", "base.html"]);
//! ```
//!
//! ## Limitations
//!
//! Embedded templates are only checked for the parent they extend. Includes
//! inside an embed body are not reported.

mod config;
mod engine;
mod error;
pub mod extract;
mod inspector;
mod minijinja_engine;
pub mod node;

pub use config::{InspectorConfig, DEFAULT_METADATA_BLOCK};
pub use engine::{CompiledTemplate, Source, TemplateEngine};
pub use error::{display_chain, EngineError, Error, ErrorDetails};
pub use inspector::{Inspector, TemplateInspector};
pub use minijinja_engine::{MiniJinjaEngine, MiniJinjaTemplate};
pub use node::{Attribute, Node, NodeKind, NOT_USED};
