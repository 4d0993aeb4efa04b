use std::path::{Component, Path};

use template_inspector::{Error, ErrorDetails, Source};
use walkdir::WalkDir;

/// Reads every template under `root` whose extension is in `extensions`.
///
/// Templates are named by their `/`-separated path relative to `root`, which
/// is also the name the engine's filesystem loader resolves. The result is
/// sorted by name.
pub fn discover_templates(root: &Path, extensions: &[String]) -> Result<Vec<Source>, Error> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            Error::new(ErrorDetails::FileRead {
                message: e.to_string(),
                file_path: e
                    .path()
                    .unwrap_or(root)
                    .display()
                    .to_string(),
            })
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext));
        if !matches_extension {
            continue;
        }
        let Some(name) = template_name(root, path) else {
            tracing::warn!("Skipping template with a non UTF-8 path: {}", path.display());
            continue;
        };
        let code = std::fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorDetails::FileRead {
                message: e.to_string(),
                file_path: path.display().to_string(),
            })
        })?;
        sources.push(Source::new(name, code).with_path(path));
    }
    sources.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!("Discovered {} template(s) in {}", sources.len(), root.display());
    Ok(sources)
}

fn template_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}
