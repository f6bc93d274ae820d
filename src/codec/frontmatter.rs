//! Metadata header parsing.
//!
//! A document may start with a header block delimited by `---` lines (YAML) or `+++` lines
//! (TOML). The header is parsed into the fixed set of recognized keys in [`Metadata`]; every
//! other key is kept opaquely in [`Metadata::extra`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

use crate::{error::NotegraphError, properties::Timestamp};

/// Metadata format of a document header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    Toml,
    Yaml,
}

impl MetadataFormat {
    fn from_delimiter(line: &str) -> Option<MetadataFormat> {
        match line {
            "---" => Some(MetadataFormat::Yaml),
            "+++" => Some(MetadataFormat::Toml),
            _ => None,
        }
    }

    fn closes(&self, line: &str) -> bool {
        match self {
            MetadataFormat::Yaml => line == "---" || line == "...",
            MetadataFormat::Toml => line == "+++",
        }
    }
}

/// A document split into its header block and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDocument<'a> {
    pub header: Option<(MetadataFormat, &'a str)>,
    pub body: &'a str,
    /// Lines preceding the body, delimiters included.
    pub body_line_offset: usize,
}

/// Split `text` into header and body. A header must open on the first line.
pub fn split_header(text: &str) -> Result<SplitDocument<'_>, NotegraphError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(SplitDocument {
            header: None,
            body: text,
            body_line_offset: 0,
        });
    };
    let Some(format) = MetadataFormat::from_delimiter(first.trim_end()) else {
        return Ok(SplitDocument {
            header: None,
            body: text,
            body_line_offset: 0,
        });
    };

    let header_start = first.len();
    let mut offset = header_start;
    let mut line_count = 1;
    for line in lines {
        line_count += 1;
        if format.closes(line.trim_end()) {
            let header = &text[header_start..offset];
            let body = &text[offset + line.len()..];
            return Ok(SplitDocument {
                header: Some((format, header)),
                body,
                body_line_offset: line_count,
            });
        }
        offset += line.len();
    }
    Err(NotegraphError::MalformedMetadata(format!(
        "unterminated {format:?} header block"
    )))
}

/// The recognized header keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub aliases: Vec<String>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub draft: bool,
    pub extra: BTreeMap<String, JsonValue>,
}

impl Metadata {
    pub fn parse(format: MetadataFormat, header: &str) -> Result<Metadata, NotegraphError> {
        if header.trim().is_empty() {
            return Ok(Metadata::default());
        }
        let value = match format {
            MetadataFormat::Yaml => serde_yaml::from_str::<JsonValue>(header)
                .map_err(|e| NotegraphError::MalformedMetadata(format!("invalid YAML: {e}")))?,
            MetadataFormat::Toml => {
                let table = toml::from_str::<toml::Table>(header)
                    .map_err(|e| NotegraphError::MalformedMetadata(format!("invalid TOML: {e}")))?;
                toml_value_to_json(toml::Value::Table(table))
            }
        };
        match value {
            JsonValue::Null => Ok(Metadata::default()),
            JsonValue::Object(map) => Metadata::from_map(map),
            other => Err(NotegraphError::MalformedMetadata(format!(
                "header must be a mapping, found {}",
                json_type_name(&other)
            ))),
        }
    }

    fn from_map(map: JsonMap<String, JsonValue>) -> Result<Metadata, NotegraphError> {
        let mut metadata = Metadata::default();
        for (key, value) in map {
            match key.as_str() {
                "title" => metadata.title = optional_string(&key, value)?,
                "tags" => metadata.tags = string_list(&key, value)?,
                "aliases" => metadata.aliases = string_list(&key, value)?,
                "created" => metadata.created = optional_timestamp(&key, value)?,
                "updated" => metadata.updated = optional_timestamp(&key, value)?,
                "draft" => {
                    metadata.draft = match value {
                        JsonValue::Null => false,
                        JsonValue::Bool(draft) => draft,
                        other => return Err(wrong_type(&key, "a boolean", &other)),
                    }
                }
                _ => {
                    metadata.extra.insert(key, value);
                }
            }
        }
        Ok(metadata)
    }
}

/// Parse an RFC 3339 timestamp, a `YYYY-MM-DD HH:MM[:SS]` local time (read as UTC), or a bare
/// `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc));
    }
    for pattern in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn optional_string(key: &str, value: JsonValue) -> Result<Option<String>, NotegraphError> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        other => Err(wrong_type(key, "a string", &other)),
    }
}

fn string_list(key: &str, value: JsonValue) -> Result<Vec<String>, NotegraphError> {
    match value {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::String(s) => Ok(s),
                other => Err(wrong_type(key, "a sequence of strings", &other)),
            })
            .collect(),
        other => Err(wrong_type(key, "a sequence of strings", &other)),
    }
}

fn optional_timestamp(key: &str, value: JsonValue) -> Result<Option<Timestamp>, NotegraphError> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => parse_timestamp(&s).map(Some).ok_or_else(|| {
            NotegraphError::MalformedMetadata(format!("`{key}` is not a timestamp: '{s}'"))
        }),
        other => Err(wrong_type(key, "a timestamp", &other)),
    }
}

fn wrong_type(key: &str, expected: &str, found: &JsonValue) -> NotegraphError {
    NotegraphError::MalformedMetadata(format!(
        "`{key}` must be {expected}, found {}",
        json_type_name(found)
    ))
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "mapping",
    }
}

/// Convert toml::Value to serde_json::Value. Datetimes become their TOML string form.
fn toml_value_to_json(value: toml::Value) -> JsonValue {
    match value {
        toml::Value::String(s) => JsonValue::String(s),
        toml::Value::Integer(i) => JsonValue::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Datetime(datetime) => JsonValue::String(datetime.to_string()),
        toml::Value::Array(items) => {
            JsonValue::Array(items.into_iter().map(toml_value_to_json).collect())
        }
        toml::Value::Table(table) => JsonValue::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_value_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use test_log::test;

    #[test]
    fn test_no_header() {
        let split = split_header("# Title\n\nBody").unwrap();
        assert!(split.header.is_none());
        assert_eq!(split.body, "# Title\n\nBody");
        assert_eq!(split.body_line_offset, 0);
    }

    #[test]
    fn test_yaml_header_split() {
        let split = split_header("---\ntags: [x]\n---\nBody\n").unwrap();
        assert_eq!(split.header, Some((MetadataFormat::Yaml, "tags: [x]\n")));
        assert_eq!(split.body, "Body\n");
        assert_eq!(split.body_line_offset, 3);
    }

    #[test]
    fn test_crlf_and_bom() {
        let split = split_header("\u{feff}+++\r\ndraft = true\r\n+++\r\nBody").unwrap();
        assert_eq!(split.header.unwrap().0, MetadataFormat::Toml);
        assert_eq!(split.body, "Body");
    }

    #[test]
    fn test_unterminated_header() {
        let err = split_header("---\ntags: [x]\nBody\n").unwrap_err();
        assert!(matches!(err, NotegraphError::MalformedMetadata(_)));
    }

    #[test]
    fn test_yaml_recognized_and_extra_keys() {
        let metadata = Metadata::parse(
            MetadataFormat::Yaml,
            concat!(
                "title: Bee\ntags: [x, y]\naliases: [bee]\n",
                "created: 2024-03-01\ndraft: true\nlayout: wide\n"
            ),
        )
        .unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Bee"));
        assert_eq!(metadata.tags, vec!["x", "y"]);
        assert_eq!(metadata.aliases, vec!["bee"]);
        assert!(metadata.draft);
        let created = metadata.created.unwrap();
        assert_eq!((created.year(), created.month(), created.day()), (2024, 3, 1));
        assert_eq!(metadata.extra.get("layout"), Some(&JsonValue::from("wide")));
    }

    #[test]
    fn test_toml_datetime() {
        let metadata = Metadata::parse(
            MetadataFormat::Toml,
            "updated = 2024-03-01T10:30:00Z\ntags = [\"x\"]\n",
        )
        .unwrap();
        let updated = metadata.updated.unwrap();
        assert_eq!((updated.hour(), updated.minute()), (10, 30));
        assert_eq!(metadata.tags, vec!["x"]);
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        for header in [
            "draft: \"yes\"\n",
            "tags: x\n",
            "aliases: [1, 2]\n",
            "created: not a date\n",
            "- just\n- a list\n",
        ] {
            let err = Metadata::parse(MetadataFormat::Yaml, header).unwrap_err();
            assert!(
                matches!(err, NotegraphError::MalformedMetadata(_)),
                "{header:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_null_values_default() {
        let metadata = Metadata::parse(MetadataFormat::Yaml, "tags:\ndraft:\n").unwrap();
        assert!(metadata.tags.is_empty());
        assert!(!metadata.draft);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("2024-03-01T10:30:00+02:00").is_some());
        assert!(parse_timestamp("2024-03-01 10:30").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("March 1st").is_none());
    }
}
