// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::ConfigError;

/// Root of a pipeline document, loaded from JSON or YAML.
///
/// Exactly one of `processors` (linear pipeline) or `nodes` (tag-routed
/// graph) must be present.
///
/// # Example
/// ```yaml
/// tracing_enabled: true
/// nodes:
///   - tag: start
///     type: tag_lines
///   - tag: error
///     type: terminal
///   - tag: warn
///     type: snakecase
///   - tag: general
///     type: terminal
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub processors: Vec<ProcessorDescriptor>,
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub tracing_enabled: bool,
}

/// Which engine shape a config describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Pipeline,
    Router,
}

impl Config {
    pub fn mode(&self) -> Result<Mode, ConfigError> {
        match (self.processors.is_empty(), self.nodes.is_empty()) {
            (false, true) => Ok(Mode::Pipeline),
            (true, false) => Ok(Mode::Router),
            (true, true) => Err(ConfigError::EmptyConfig),
            (false, false) => Err(ConfigError::AmbiguousMode),
        }
    }
}

/// One processor in a linear pipeline (or a `tag_router` sub-route).
///
/// Anything besides `type`, `id` and `routes` is collected into `options`,
/// so documents write options inline:
///
/// ```json
/// {"type": "line_counter", "id": "c1", "format": "[{count}] {line}"}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorDescriptor {
    #[serde(rename = "type")]
    pub processor_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub routes: HashMap<String, ProcessorDescriptor>,
    #[serde(flatten)]
    pub options: HashMap<String, serde_yaml::Value>,
}

impl ProcessorDescriptor {
    pub fn bare(processor_type: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            id: None,
            routes: HashMap::new(),
            options: HashMap::new(),
        }
    }

    fn display_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.processor_type.clone())
    }

    pub fn str_option(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| ConfigError::InvalidOption {
                    id: self.display_id(),
                    option: key.to_string(),
                    expected: "string",
                }),
        }
    }

    pub fn u64_option(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| ConfigError::InvalidOption {
                    id: self.display_id(),
                    option: key.to_string(),
                    expected: "non-negative integer",
                }),
        }
    }

    pub fn usize_option(&self, key: &str) -> Result<Option<usize>, ConfigError> {
        Ok(self.u64_option(key)?.map(|v| v as usize))
    }
}

/// One node of a tag-routed graph: the tag it serves and the processor
/// reference to mount there. Dotted references resolve by their final
/// segment, so `pkg.mod.tag_lines` means the built-in `tag_lines`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescriptor {
    pub tag: String,
    #[serde(rename = "type")]
    pub processor_type: String,
    #[serde(default)]
    pub config: HashMap<String, serde_yaml::Value>,
}

/// Load a config document, dispatching on the file extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let cfg: Config = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        }
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    cfg.mode()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pipeline_json() {
        let json = r#"
        {"processors": [
            {"type": "line_counter", "id": "c1", "format": "[{count}] {line}"},
            {"type": "filter", "id": "imp", "pattern": "ERROR"},
            {"type": "line_splitter", "delimiter": "|"}
        ]}
        "#;

        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.mode().unwrap(), Mode::Pipeline);
        assert_eq!(cfg.processors.len(), 3);
        assert_eq!(cfg.processors[0].id.as_deref(), Some("c1"));
        assert_eq!(
            cfg.processors[0].str_option("format").unwrap().as_deref(),
            Some("[{count}] {line}")
        );
        assert_eq!(
            cfg.processors[2].str_option("delimiter").unwrap().as_deref(),
            Some("|")
        );
    }

    #[test]
    fn parse_router_yaml() {
        let yaml = r#"
nodes:
  - tag: start
    type: pkg.mod.tag_lines
  - tag: error
    type: pkg.mod.only_error
  - tag: warn
    type: pkg.mod.snakecase
  - tag: general
    type: pkg.mod.terminal
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.mode().unwrap(), Mode::Router);
        assert_eq!(cfg.nodes.len(), 4);
        assert_eq!(cfg.nodes[0].tag, "start");
        assert_eq!(cfg.nodes[0].processor_type, "pkg.mod.tag_lines");
    }

    #[test]
    fn parse_nested_routes() {
        let json = r#"
        {"processors": [
            {"type": "tag_router", "tag_field": 0, "delimiter": ",",
             "routes": {"err": {"type": "uppercase"}}}
        ]}
        "#;

        let cfg: Config = serde_json::from_str(json).unwrap();
        let router = &cfg.processors[0];
        assert_eq!(router.usize_option("tag_field").unwrap(), Some(0));
        assert_eq!(router.routes["err"].processor_type, "uppercase");
    }

    #[test]
    fn wrong_option_type_is_an_error() {
        let json = r#"{"processors": [{"type": "line_joiner", "count": "two"}]}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        let err = cfg.processors[0].u64_option("count").unwrap_err();
        assert!(err.to_string().contains("'count'"));
    }

    #[test]
    fn both_modes_is_ambiguous() {
        let json = r#"
        {"processors": [{"type": "uppercase"}],
         "nodes": [{"tag": "start", "type": "terminal"}]}
        "#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(cfg.mode(), Err(ConfigError::AmbiguousMode)));
    }

    #[test]
    fn neither_mode_is_empty() {
        let cfg: Config = serde_json::from_str(r#"{"tracing_enabled": true}"#).unwrap();
        assert!(cfg.tracing_enabled);
        assert!(matches!(cfg.mode(), Err(ConfigError::EmptyConfig)));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("pipeline.json");
        fs::write(&json_path, r#"{"processors": [{"type": "uppercase"}]}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().mode().unwrap(), Mode::Pipeline);

        let yaml_path = dir.path().join("router.yaml");
        fs::write(&yaml_path, "nodes:\n  - tag: start\n    type: terminal\n").unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().mode().unwrap(), Mode::Router);

        let txt_path = dir.path().join("config.txt");
        fs::write(&txt_path, "nope").unwrap();
        assert!(matches!(
            load_config(&txt_path),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        assert!(matches!(
            load_config("definitely/not/here.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn load_malformed_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "nodes: [unclosed").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
