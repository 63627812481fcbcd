use crate::options::FetchOptionsPatch;
use std::{fs, path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Read fetch options from a yaml file.
///
/// Every field is optional, missing ones are left for the lower layers:
/// ```yaml
/// expires_after: 60000   # milliseconds, 0 disables, "forever" never expires
/// items_per_page: 20
/// default_params:
///   limit: 20
/// keys:
///   records: data.items
///   total_pages: meta.pages
/// ```
pub fn load_options(
    config_file_path: impl AsRef<path::Path>,
) -> Result<FetchOptionsPatch, ConfigError> {
    let path = config_file_path.as_ref();
    let content: String = fs::read_to_string(path)?;
    // an empty file is a valid "no overrides" config
    if content.trim().is_empty() {
        return Ok(FetchOptionsPatch::default());
    }
    let patch: FetchOptionsPatch = serde_yaml::from_str(&content)?;
    tracing::debug!("Loaded fetch options from {}", path.display());
    Ok(patch)
}
