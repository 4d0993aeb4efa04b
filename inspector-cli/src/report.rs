use std::collections::BTreeMap;

use serde::Serialize;
use template_inspector::{display_chain, Source, TemplateInspector};

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TemplateReport {
    Ok {
        linked: Vec<String>,
        pattern_data: Option<String>,
    },
    /// `linked` is kept when only the metadata block failed.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        linked: Option<Vec<String>>,
    },
}

impl TemplateReport {
    pub fn is_error(&self) -> bool {
        matches!(self, TemplateReport::Error { .. })
    }
}

/// Inspects every source, keyed by template name.
///
/// A template that fails to inspect is recorded with its error and does not
/// stop the remaining templates from being inspected.
pub fn build_report<I: TemplateInspector + ?Sized>(
    inspector: &I,
    sources: &[Source],
) -> BTreeMap<String, TemplateReport> {
    sources
        .iter()
        .map(|source| (source.name.clone(), inspect_one(inspector, source)))
        .collect()
}

fn inspect_one<I: TemplateInspector + ?Sized>(inspector: &I, source: &Source) -> TemplateReport {
    let linked = match inspector.inspect_linked(source) {
        Ok(linked) => linked,
        Err(err) => {
            return TemplateReport::Error {
                message: display_chain(&err),
                linked: None,
            };
        }
    };
    match inspector.inspect_pattern_data(source) {
        Ok(pattern_data) => TemplateReport::Ok {
            linked,
            pattern_data,
        },
        Err(err) => TemplateReport::Error {
            message: display_chain(&err),
            linked: Some(linked),
        },
    }
}
