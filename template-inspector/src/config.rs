use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorDetails};

/// Name of the block holding pattern metadata, unless configured otherwise.
pub const DEFAULT_METADATA_BLOCK: &str = "patterninfo";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InspectorConfig {
    /// Block rendered by `inspect_pattern_data`.
    #[serde(default = "default_metadata_block")]
    pub metadata_block: String,
    /// Fail on undefined variables when rendering the metadata block.
    #[serde(default)]
    pub strict_undefined: bool,
    /// Root directory the engine loads templates from by name.
    /// Relative paths are resolved against the directory of the config file.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// File extensions treated as templates during discovery.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            metadata_block: default_metadata_block(),
            strict_undefined: false,
            template_dir: None,
            extensions: default_extensions(),
        }
    }
}

fn default_metadata_block() -> String {
    DEFAULT_METADATA_BLOCK.to_string()
}

fn default_extensions() -> Vec<String> {
    ["html", "twig", "jinja", "j2"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    inspector: InspectorConfig,
}

impl InspectorConfig {
    /// Reads a TOML config file with an optional `[inspector]` table.
    pub fn load_from_path(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::new(ErrorDetails::FileRead {
                message: e.to_string(),
                file_path: path.display().to_string(),
            })
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(template_dir) = config.template_dir.as_mut()
            && let Some(base) = path.parent()
            && template_dir.is_relative()
        {
            *template_dir = base.join(&*template_dir);
        }
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| {
            Error::new(ErrorDetails::Config {
                message: e.to_string(),
            })
        })?;
        file.inspector.validate()?;
        Ok(file.inspector)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.metadata_block.trim().is_empty() {
            return Err(ErrorDetails::Config {
                message: "`inspector.metadata_block` must not be empty".to_string(),
            }
            .into());
        }
        if self.extensions.iter().any(|ext| ext.starts_with('.')) {
            return Err(ErrorDetails::Config {
                message: "`inspector.extensions` entries must not start with `.`".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
