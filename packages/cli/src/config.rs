use folio_editor::{AllowListSanitizer, ContentSanitizer, EditorOptions, PassthroughSanitizer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Session options handed to the editor
    #[serde(default)]
    pub editor: EditorOptions,

    /// Node types kept when hydrating JSON snapshots (all when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_nodes: Option<Vec<String>>,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Sanitizer for JSON snapshots
    pub fn sanitizer(&self) -> Box<dyn ContentSanitizer> {
        match &self.allowed_nodes {
            Some(nodes) => Box::new(AllowListSanitizer::new(nodes.iter().cloned())),
            None => Box::new(PassthroughSanitizer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "editor": { "collaboration": true, "historyLimit": 20 },
            "allowedNodes": ["paragraph", "heading"]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.editor.collaboration);
        assert_eq!(config.editor.history_limit, 20);
        assert_eq!(
            config.allowed_nodes,
            Some(vec!["paragraph".to_string(), "heading".to_string()])
        );
    }

    #[test]
    fn test_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.editor.collaboration);
        assert_eq!(config.editor.history_limit, 100);
    }

    #[test]
    fn test_allow_list_sanitizer() {
        let config = Config {
            allowed_nodes: Some(vec!["paragraph".to_string()]),
            ..Default::default()
        };

        let cleaned = config.sanitizer().sanitize(json!({
            "type": "doc",
            "content": [{ "type": "paragraph" }, { "type": "image" }]
        }));

        assert_eq!(cleaned["content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_config_falls_back() {
        let config = Config::load("/nonexistent-folio-dir").unwrap();
        assert_eq!(config, Config::default());
    }
}
