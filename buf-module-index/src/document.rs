//! File content handed to index extensions
//!
//! The host reads and parses a candidate file, then passes the result to the
//! extension as a [`FileContent`]. Parsing failures are folded into
//! [`ParsedContent::Other`] so extensions never see an error.

use std::fmt;
use std::path::Path;

use serde::de::{self, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use url::Url;

/// Structured content of a file, as produced by the host's parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    /// A YAML stream, one value per document
    Yaml(Vec<Value>),
    /// Content that is not a YAML document (other language or unparsable)
    Other,
}

/// A file as seen by an index extension.
#[derive(Debug, Clone, PartialEq)]
pub struct FileContent {
    /// Stable location of the file, if the host can provide one
    pub location: Option<String>,
    /// Bare file name
    pub file_name: String,
    pub content: ParsedContent,
}

impl FileContent {
    pub fn new(location: Option<String>, file_name: impl Into<String>, content: ParsedContent) -> Self {
        Self {
            location,
            file_name: file_name.into(),
            content,
        }
    }

    /// Parse `text` as a (possibly multi-document) YAML stream.
    pub fn from_text(location: Option<String>, file_name: impl Into<String>, text: &str) -> Self {
        let file_name = file_name.into();
        let content = match parse_yaml_stream(text) {
            Ok(documents) => ParsedContent::Yaml(documents),
            Err(e) => {
                tracing::debug!(file = %file_name, "Not a YAML document: {e}");
                ParsedContent::Other
            }
        };
        Self::new(location, file_name, content)
    }

    /// Parse a file on disk, using its `file://` URL as the location.
    pub fn from_path(path: &Path, text: &str) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_text(location_for_path(path), file_name, text)
    }
}

/// `file://` URL for an absolute path, `None` for relative paths.
pub fn location_for_path(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}

fn parse_yaml_stream(text: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    use serde::Deserialize;

    serde_yaml::Deserializer::from_str(text)
        .map(|document| LenientValue::deserialize(document).map(|v| v.0))
        .collect()
}

/// A YAML value whose mappings keep the last of duplicated keys.
///
/// `serde_yaml::Value` rejects the whole stream on a duplicate key, which
/// would throw away every well-formed entry next to a sloppy one.
struct LenientValue(Value);

impl<'de> serde::Deserialize<'de> for LenientValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LenientVisitor)
    }
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = LenientValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::Bool(b)))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::Number(i.into())))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::Number(u.into())))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::Number(f.into())))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::String(s.to_owned())))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::String(s)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<LenientValue, E> {
        Ok(LenientValue(Value::Null))
    }

    fn visit_some<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<LenientValue, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<LenientValue, A::Error> {
        let mut items = Vec::new();
        while let Some(LenientValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(LenientValue(Value::Sequence(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<LenientValue, A::Error> {
        let mut mapping = Mapping::new();
        while let Some((LenientValue(key), LenientValue(value))) = map.next_entry()? {
            // last one wins
            mapping.insert(key, value);
        }
        Ok(LenientValue(Value::Mapping(mapping)))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<LenientValue, A::Error> {
        let (tag, contents): (String, _) = data.variant()?;
        let LenientValue(value) = contents.newtype_variant()?;
        let tag = tag.trim_start_matches('!');
        if tag.is_empty() {
            return Ok(LenientValue(value));
        }
        Ok(LenientValue(Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(tag),
            value,
        }))))
    }
}
