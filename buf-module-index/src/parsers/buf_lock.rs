//! Extractor for `buf.lock` files
//!
//! A v1 lock file pins each dependency under a `deps` sequence:
//!
//! ```yaml
//! version: v1
//! deps:
//!   - remote: buf.build
//!     owner: googleapis
//!     repository: googleapis
//!     commit: 62f35d8aed1149c291d606d958a7ce32
//! ```
//!
//! Every `deps` key found anywhere in the document is honoured. Entries that
//! lack one of `remote`, `owner`, `repository` or `commit` are dropped.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_yaml::Value;

use super::Extractor;
use crate::coordinates::ModuleCoordinates;
use crate::document::{FileContent, ParsedContent};

const DEPS_KEY: &str = "deps";

/// Extractor producing [`ModuleCoordinates`] from `buf.lock` content
#[derive(Debug, Default, Clone, Copy)]
pub struct BufLockExtractor;

impl BufLockExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for BufLockExtractor {
    type Key = ModuleCoordinates;

    fn extract(&self, file: &FileContent) -> IndexMap<ModuleCoordinates, ()> {
        let mut result = IndexMap::new();

        let Some(location) = file.location.as_deref() else {
            tracing::debug!(file = %file.file_name, "No location for lock file, skipping");
            return result;
        };
        let ParsedContent::Yaml(documents) = &file.content else {
            return result;
        };

        for document in documents {
            visit(document, &mut |key, value| {
                if key.as_str() != Some(DEPS_KEY) {
                    return;
                }
                let Value::Sequence(items) = value else {
                    return;
                };
                for item in items {
                    match module_dep(location, item) {
                        Some(coordinates) => {
                            result.insert(coordinates, ());
                        }
                        None => {
                            tracing::debug!(location, "Skipping incomplete deps entry");
                        }
                    }
                }
            });
        }

        tracing::debug!(location, modules = result.len(), "Extracted buf.lock modules");
        result
    }
}

/// Depth-first walk calling `on_key_value` for every mapping entry.
fn visit(value: &Value, on_key_value: &mut impl FnMut(&Value, &Value)) {
    match value {
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                on_key_value(key, value);
                visit(value, on_key_value);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                visit(item, on_key_value);
            }
        }
        Value::Tagged(tagged) => visit(&tagged.value, on_key_value),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

fn module_dep(location: &str, item: &Value) -> Option<ModuleCoordinates> {
    let mapping = match item {
        Value::Mapping(mapping) => mapping,
        Value::Tagged(tagged) => return module_dep(location, &tagged.value),
        _ => return None,
    };
    let fields: HashMap<String, String> = mapping
        .iter()
        .filter_map(|(key, value)| Some((scalar_text(key)?, scalar_text(value)?)))
        .collect();

    ModuleCoordinates::new(
        location,
        fields.get("remote")?.as_str(),
        fields.get("owner")?.as_str(),
        fields.get("repository")?.as_str(),
        fields.get("commit")?.as_str(),
    )
    .ok()
}

/// Text of a scalar node; `None` for nulls and collections.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
