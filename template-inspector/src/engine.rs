//! The template engine seam.
//!
//! The inspector never parses or renders on its own. It asks a
//! [`TemplateEngine`] for a [`Node`] tree, or for a compiled template when a
//! block has to be rendered.

use std::path::PathBuf;

use crate::error::EngineError;
use crate::node::Node;

/// A raw template: its logical name and source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub code: String,
    /// Where the source was read from, when it came from disk.
    pub path: Option<PathBuf>,
}

impl Source {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            path: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

pub trait TemplateEngine {
    type Error: EngineError;
    type Template<'a>: CompiledTemplate<Error = Self::Error>
    where
        Self: 'a;

    /// Tokenizes and parses `source` into a syntax tree without executing it.
    fn parse(&self, source: &Source) -> Result<Node, Self::Error>;

    /// Loads and compiles the template registered under `name`.
    fn load(&self, name: &str) -> Result<Self::Template<'_>, Self::Error>;
}

pub trait CompiledTemplate {
    type Error: EngineError;

    /// Whether the template defines `block`, directly or through its parents.
    fn has_block(&self, block: &str) -> Result<bool, Self::Error>;

    /// Renders only `block`, with an empty context.
    fn render_block(&self, block: &str) -> Result<String, Self::Error>;
}
