//! Configuration file handling for talentsift.
//!
//! Loads settings from `talentsift.config.toml` with the following search order:
//! 1. Current directory
//! 2. ~/.config/talentsift/talentsift.config.toml (Linux/macOS)
//! 3. ~/.talentsift/talentsift.config.toml (fallback)

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TalentsiftConfig {
    pub catalog: CatalogConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
}

/// Catalog store location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding the catalog files (default: platform data dir).
    pub data_dir: Option<PathBuf>,
}

impl CatalogConfig {
    /// Metadata array, as written by the ingestion job.
    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir().join("assessments.json")
    }

    /// Aligned vector file, as written by the ingestion job.
    pub fn vectors_path(&self) -> PathBuf {
        self.data_dir().join("assessments.tsv1")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("talentsift")
        })
    }
}

/// Retrieval and fusion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidate width for each retriever and for fusion.
    pub k: usize,
    /// Default number of final results.
    pub top_n: usize,
    /// Reciprocal-rank fusion constant.
    pub rrf_c: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 20,
            top_n: 10,
            rrf_c: 60.0,
        }
    }
}

/// Completion service configuration. The API key is only ever read from the
/// environment, never from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    /// Endpoint override, mainly for tests.
    pub endpoint: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemma-3-27b-it".into(),
            endpoint: None,
            temperature: 0.1,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// Environment variable carrying the API key.
    pub const API_KEY_ENV: &'static str = "GOOGLE_API_KEY";

    /// The configured API key, if present and non-empty.
    pub fn api_key() -> Option<String> {
        std::env::var(Self::API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl TalentsiftConfig {
    /// Config file name.
    pub const FILENAME: &'static str = "talentsift.config.toml";

    /// Load configuration from file, searching standard locations.
    /// Returns default config if no file found.
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::find_config_file() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: TalentsiftConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Find config file in standard locations.
    pub fn find_config_file() -> Option<PathBuf> {
        // 1. Current directory
        let current = PathBuf::from(Self::FILENAME);
        if current.exists() {
            return Some(current);
        }

        // 2. Config directory (~/.config/talentsift/ on Linux/macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("talentsift").join(Self::FILENAME);
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Home directory fallback
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".talentsift").join(Self::FILENAME);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Generate a default config file with comments.
    pub fn generate_default_config() -> String {
        r#"# talentsift configuration
# Place this file at:
#   - ./talentsift.config.toml (current directory)
#   - ~/.config/talentsift/talentsift.config.toml (Linux/macOS)

[catalog]
# Directory holding assessments.json and assessments.tsv1, both produced by
# the ingestion job (default: ~/.local/share/talentsift)
# data_dir = "/custom/path/to/catalog"

[retrieval]
# Candidate width for each retriever and for rank fusion
k = 20

# Default number of final recommendations
top_n = 10

# Reciprocal-rank fusion constant
rrf_c = 60.0

[llm]
# Completion model used for query expansion and candidate reranking.
# The API key is read from the GOOGLE_API_KEY environment variable; when it
# is unset, both steps are skipped and the fused order is returned.
model = "gemma-3-27b-it"

# Sampling temperature
temperature = 0.1

# Per-request timeout in seconds
timeout_secs = 30
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TalentsiftConfig::default();
        assert_eq!(config.retrieval.k, 20);
        assert_eq!(config.retrieval.top_n, 10);
        assert_eq!(config.llm.model, "gemma-3-27b-it");
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            [catalog]
            data_dir = "/srv/talentsift"

            [retrieval]
            k = 50

            [llm]
            model = "gemini-2.0-flash"
        "#;

        let config: TalentsiftConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.data_dir, Some(PathBuf::from("/srv/talentsift")));
        assert_eq!(config.retrieval.k, 50);
        assert_eq!(config.retrieval.rrf_c, 60.0);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_catalog_paths_derive_from_data_dir() {
        let config = CatalogConfig {
            data_dir: Some(PathBuf::from("/tmp/cat")),
        };
        assert_eq!(config.metadata_path(), PathBuf::from("/tmp/cat/assessments.json"));
        assert_eq!(config.vectors_path(), PathBuf::from("/tmp/cat/assessments.tsv1"));
    }

    #[test]
    fn test_default_config_string_parses() {
        let config: TalentsiftConfig =
            toml::from_str(&TalentsiftConfig::generate_default_config()).unwrap();
        assert_eq!(config.retrieval.k, 20);
    }
}
