use tracing::instrument;

use crate::config::InspectorConfig;
use crate::engine::{CompiledTemplate, Source, TemplateEngine};
use crate::error::{Error, ErrorDetails};
use crate::extract::{parents, walk_embeds, walk_nodes};
use crate::node::NodeKind;

/// Discovers what a template links to and what metadata it declares.
pub trait TemplateInspector {
    /// Names of the templates `source` includes, embeds or extends.
    ///
    /// Includes come first, then the parents of embedded templates, then the
    /// template's own parent. Duplicates are kept.
    fn inspect_linked(&self, source: &Source) -> Result<Vec<String>, Error>;

    /// The rendered metadata block of `source`, or `None` when it has none.
    fn inspect_pattern_data(&self, source: &Source) -> Result<Option<String>, Error>;
}

#[derive(Debug)]
pub struct Inspector<E> {
    engine: E,
    metadata_block: String,
}

impl<E: TemplateEngine> Inspector<E> {
    pub fn new(engine: E, config: &InspectorConfig) -> Self {
        Self {
            engine,
            metadata_block: config.metadata_block.clone(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn metadata_block(&self) -> &str {
        &self.metadata_block
    }

    fn render_metadata(&self, name: &str) -> Result<Option<String>, E::Error> {
        let template = self.engine.load(name)?;
        if !template.has_block(&self.metadata_block)? {
            return Ok(None);
        }
        template.render_block(&self.metadata_block).map(Some)
    }
}

impl<E: TemplateEngine> TemplateInspector for Inspector<E> {
    #[instrument(skip_all, fields(template_name = %source.name))]
    fn inspect_linked(&self, source: &Source) -> Result<Vec<String>, Error> {
        let root = self
            .engine
            .parse(source)
            .map_err(|e| Error::new(ErrorDetails::template_parsing(&source.name, e)))?;

        let mut linked = walk_nodes(&root, NodeKind::Include);
        linked.extend(walk_embeds(&root));
        linked.extend(parents(&root));
        tracing::debug!("Found {} linked template(s)", linked.len());
        Ok(linked)
    }

    #[instrument(skip_all, fields(template_name = %source.name, block = %self.metadata_block))]
    fn inspect_pattern_data(&self, source: &Source) -> Result<Option<String>, Error> {
        let data = self
            .render_metadata(&source.name)
            .map_err(|e| Error::new(ErrorDetails::template_parsing(&source.name, e)))?;
        if data.is_none() {
            tracing::debug!("No metadata block found");
        }
        Ok(data)
    }
}
