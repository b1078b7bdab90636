use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Pre-validation limits applied by the caller before a file reaches the
/// measurement pipeline. The pipeline itself never checks sizes.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest file we accept, in bytes.
    pub max_file_size: u64,
    /// Extensions accepted at the boundary, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            max_file_size: 50 * 1024 * 1024,
            allowed_extensions: vec!["shp".into(), "kml".into(), "kmz".into()],
        }
    }
}

impl UploadConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: UploadConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn allows_extension(&self, declared_name: &str) -> bool {
        Path::new(declared_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .map(|e| self.allowed_extensions.iter().any(|allowed| allowed == &e))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_upload_contract() {
        let config = UploadConfig::default();
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert!(config.allows_extension("fazenda.KML"));
        assert!(config.allows_extension("area.kmz"));
        assert!(config.allows_extension("limites.shp"));
        assert!(!config.allows_extension("notes.txt"));
        assert!(!config.allows_extension("no_extension"));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: UploadConfig = toml::from_str("max_file_size = 1024\n").unwrap();
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(config.allowed_extensions.len(), 3);
    }
}
