// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Resolves processor descriptors into runtime instances.
//!
//! Processor types are a fixed registration table of built-in names; a
//! router node may also reference one with a dotted path, in which case
//! the final segment is looked up. Unknown names fail construction before
//! any file is claimed.

use std::sync::Arc;

use uuid::Uuid;

use crate::engine::{Engine, Pipeline, StateRouter};
use crate::errors::ConfigError;
use crate::line::Tag;
use crate::metrics::MetricsStore;
use crate::processors::{
    lowercase, uppercase, FilterCriterion, FilterProcessor, LineCounter, LineJoiner, LineSplitter,
    ObservedProcessor, OnlyTag, SeverityTagger, SnakeCase, TagRouter, Terminal,
};
use crate::traits::Processor;
use crate::config::{Config, Mode, NodeDescriptor, ProcessorDescriptor};

/// Processor types accepted in linear pipelines.
const PIPELINE_TYPES: &[&str] = &[
    "line_counter",
    "line_joiner",
    "line_splitter",
    "filter",
    "uppercase",
    "lowercase",
    "tag_router",
];

/// Build whichever engine shape the config describes. Fresh processor
/// instances are created on every call, so each engine run owns its state.
pub fn build_engine(cfg: &Config, metrics: &Arc<MetricsStore>) -> Result<Engine, ConfigError> {
    match cfg.mode()? {
        Mode::Pipeline => Ok(Engine::Pipeline(build_pipeline(&cfg.processors, metrics)?)),
        Mode::Router => Ok(Engine::Router(build_router(&cfg.nodes, metrics)?)),
    }
}

fn build_pipeline(
    descriptors: &[ProcessorDescriptor],
    metrics: &Arc<MetricsStore>,
) -> Result<Pipeline, ConfigError> {
    let mut stages = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if !PIPELINE_TYPES.contains(&descriptor.processor_type.as_str()) {
            return Err(ConfigError::UnknownProcessorType(
                descriptor.processor_type.clone(),
            ));
        }
        stages.push(build_processor(descriptor, metrics)?);
    }
    Ok(Pipeline::new(stages))
}

fn build_router(
    nodes: &[NodeDescriptor],
    metrics: &Arc<MetricsStore>,
) -> Result<StateRouter, ConfigError> {
    let mut registrations: Vec<(Tag, ObservedProcessor)> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let descriptor = ProcessorDescriptor {
            processor_type: resolve_reference(&node.processor_type).to_string(),
            id: None,
            routes: std::collections::HashMap::new(),
            options: node.config.clone(),
        };
        registrations.push((node.tag.clone(), build_processor(&descriptor, metrics)?));
    }
    StateRouter::new(registrations)
}

/// Instantiate one descriptor as a telemetry-wrapped processor.
pub fn build_processor(
    descriptor: &ProcessorDescriptor,
    metrics: &Arc<MetricsStore>,
) -> Result<ObservedProcessor, ConfigError> {
    let inner = instantiate(descriptor, metrics)?;
    let processor_id = descriptor
        .id
        .clone()
        .unwrap_or_else(|| default_id(&descriptor.processor_type));
    Ok(ObservedProcessor::new(inner, processor_id, metrics))
}

fn instantiate(
    descriptor: &ProcessorDescriptor,
    metrics: &Arc<MetricsStore>,
) -> Result<Box<dyn Processor>, ConfigError> {
    let processor: Box<dyn Processor> = match descriptor.processor_type.as_str() {
        "line_counter" => {
            let format = descriptor
                .str_option("format")?
                .unwrap_or_else(|| LineCounter::DEFAULT_FORMAT.to_string());
            let start_count = descriptor.u64_option("start_count")?.unwrap_or(1);
            Box::new(LineCounter::new(format, start_count))
        }
        "line_joiner" => {
            let delimiter = descriptor
                .str_option("delimiter")?
                .unwrap_or_else(|| LineJoiner::DEFAULT_DELIMITER.to_string());
            let count = descriptor.usize_option("count")?.unwrap_or(2);
            Box::new(LineJoiner::new(delimiter, count))
        }
        "line_splitter" => {
            let delimiter = descriptor
                .str_option("delimiter")?
                .unwrap_or_else(|| ",".to_string());
            Box::new(LineSplitter::new(delimiter))
        }
        "filter" => Box::new(FilterProcessor::new(filter_criterion(descriptor)?)),
        "uppercase" => Box::new(uppercase()),
        "lowercase" => Box::new(lowercase()),
        "tag_router" => {
            let tag_field = descriptor.usize_option("tag_field")?.unwrap_or(0);
            let delimiter = descriptor
                .str_option("delimiter")?
                .unwrap_or_else(|| ",".to_string());
            let mut router = TagRouter::new(tag_field, delimiter);
            for (tag, route) in &descriptor.routes {
                router.add_route(tag.clone(), build_processor(route, metrics)?);
            }
            Box::new(router)
        }
        "tag_lines" => Box::new(SeverityTagger),
        "only_error" => Box::new(OnlyTag::error()),
        "only_warn" => Box::new(OnlyTag::warn()),
        "snakecase" => Box::new(SnakeCase),
        "terminal" => Box::new(Terminal),
        other => return Err(ConfigError::UnknownProcessorType(other.to_string())),
    };
    Ok(processor)
}

fn filter_criterion(descriptor: &ProcessorDescriptor) -> Result<FilterCriterion, ConfigError> {
    if let Some(pattern) = descriptor.str_option("pattern")? {
        return Ok(FilterCriterion::Pattern(pattern));
    }
    if let Some(name) = descriptor.str_option("predicate")? {
        let f = named_predicate(&name)?;
        return Ok(FilterCriterion::Predicate { name, f });
    }
    if let Some(min) = descriptor.usize_option("min_length")? {
        return Ok(FilterCriterion::MinLength(min));
    }
    Err(ConfigError::MissingFilterCriterion {
        id: descriptor
            .id
            .clone()
            .unwrap_or_else(|| descriptor.processor_type.clone()),
    })
}

fn named_predicate(name: &str) -> Result<fn(&str) -> bool, ConfigError> {
    match name {
        "is_important" => Ok(is_important),
        "non_empty" => Ok(non_empty),
        other => Err(ConfigError::UnknownPredicate(other.to_string())),
    }
}

fn is_important(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("important") || lower.contains("error")
}

fn non_empty(line: &str) -> bool {
    !line.trim().is_empty()
}

/// Router node references may be dotted paths; only the final segment
/// names the factory.
fn resolve_reference(reference: &str) -> &str {
    reference.rsplit('.').next().unwrap_or(reference)
}

fn default_id(processor_type: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", processor_type, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> Arc<MetricsStore> {
        Arc::new(MetricsStore::new())
    }

    fn pipeline_config(json: &str) -> Config {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn builds_and_runs_a_pipeline_from_json() {
        let cfg = pipeline_config(
            r#"{"processors": [
                {"type": "line_counter", "id": "c1"},
                {"type": "line_splitter", "delimiter": "|"}
            ]}"#,
        );
        let store = metrics();
        let mut engine = build_engine(&cfg, &store).unwrap();

        let out = engine
            .run(vec!["a|b".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec!["[1] a", "b"]);
        assert!(store.processor_metrics().contains_key("c1"));
    }

    #[tokio::test]
    async fn builds_a_router_from_nodes() {
        let cfg = pipeline_config(
            r#"{"nodes": [
                {"tag": "start", "type": "pkg.mod.tag_lines"},
                {"tag": "error", "type": "terminal"},
                {"tag": "warn", "type": "snakecase"},
                {"tag": "general", "type": "terminal"}
            ]}"#,
        );
        let mut engine = build_engine(&cfg, &metrics()).unwrap();

        let out = engine
            .run(vec!["ERROR: disk".to_string(), "hello".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec!["ERROR: disk", "hello"]);
    }

    #[test]
    fn unknown_type_fails_construction() {
        let cfg = pipeline_config(r#"{"processors": [{"type": "frobnicate"}]}"#);
        assert!(matches!(
            build_engine(&cfg, &metrics()),
            Err(ConfigError::UnknownProcessorType(t)) if t == "frobnicate"
        ));
    }

    #[test]
    fn router_only_types_are_rejected_in_pipelines() {
        let cfg = pipeline_config(r#"{"processors": [{"type": "tag_lines"}]}"#);
        assert!(matches!(
            build_engine(&cfg, &metrics()),
            Err(ConfigError::UnknownProcessorType(_))
        ));
    }

    #[test]
    fn router_without_start_fails() {
        let cfg = pipeline_config(r#"{"nodes": [{"tag": "warn", "type": "terminal"}]}"#);
        assert!(matches!(
            build_engine(&cfg, &metrics()),
            Err(ConfigError::MissingStartTag)
        ));
    }

    #[test]
    fn filter_requires_a_criterion() {
        let cfg = pipeline_config(r#"{"processors": [{"type": "filter", "id": "f"}]}"#);
        assert!(matches!(
            build_engine(&cfg, &metrics()),
            Err(ConfigError::MissingFilterCriterion { id }) if id == "f"
        ));
    }

    #[test]
    fn unknown_predicate_fails() {
        let cfg =
            pipeline_config(r#"{"processors": [{"type": "filter", "predicate": "is_cromulent"}]}"#);
        assert!(matches!(
            build_engine(&cfg, &metrics()),
            Err(ConfigError::UnknownPredicate(p)) if p == "is_cromulent"
        ));
    }

    #[tokio::test]
    async fn tag_router_routes_are_built_recursively() {
        let cfg = pipeline_config(
            r#"{"processors": [
                {"type": "tag_router",
                 "routes": {"err": {"type": "uppercase", "id": "shout"}}}
            ]}"#,
        );
        let store = metrics();
        let mut engine = build_engine(&cfg, &store).unwrap();

        let out = engine
            .run(vec!["err,disk".to_string(), "ok,fine".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec!["ERR,DISK", "ok,fine"]);
        assert!(store.processor_metrics().contains_key("shout"));
    }

    #[test]
    fn build_processor_table_driven() {
        struct TestCase {
            name: &'static str,
            json: &'static str,
            expected_type: &'static str,
        }

        let test_cases = vec![
            TestCase {
                name: "counter with options",
                json: r#"{"type": "line_counter", "format": "{count}> {line}", "start_count": 10}"#,
                expected_type: "line_counter",
            },
            TestCase {
                name: "joiner with defaults",
                json: r#"{"type": "line_joiner"}"#,
                expected_type: "line_joiner",
            },
            TestCase {
                name: "splitter",
                json: r#"{"type": "line_splitter", "delimiter": ";"}"#,
                expected_type: "line_splitter",
            },
            TestCase {
                name: "filter by pattern",
                json: r#"{"type": "filter", "pattern": "WARN"}"#,
                expected_type: "filter",
            },
            TestCase {
                name: "filter by predicate",
                json: r#"{"type": "filter", "predicate": "non_empty"}"#,
                expected_type: "filter",
            },
            TestCase {
                name: "uppercase",
                json: r#"{"type": "uppercase"}"#,
                expected_type: "uppercase",
            },
            TestCase {
                name: "lowercase",
                json: r#"{"type": "lowercase"}"#,
                expected_type: "lowercase",
            },
            TestCase {
                name: "tag router without routes",
                json: r#"{"type": "tag_router", "tag_field": 1}"#,
                expected_type: "tag_router",
            },
            TestCase {
                name: "severity classifier",
                json: r#"{"type": "tag_lines"}"#,
                expected_type: "tag_lines",
            },
            TestCase {
                name: "terminal",
                json: r#"{"type": "terminal"}"#,
                expected_type: "terminal",
            },
        ];

        let store = metrics();
        for test_case in test_cases {
            let descriptor: ProcessorDescriptor = serde_json::from_str(test_case.json).unwrap();
            let processor = build_processor(&descriptor, &store).unwrap();
            assert_eq!(
                processor.type_name(),
                test_case.expected_type,
                "test case '{}'",
                test_case.name
            );
        }
    }

    #[test]
    fn generated_ids_carry_the_type_name() {
        let store = metrics();
        let descriptor = ProcessorDescriptor::bare("uppercase");
        let processor = build_processor(&descriptor, &store).unwrap();
        assert!(processor.processor_id().starts_with("uppercase_"));
    }
}
