//! Decoding file content into records.
//!
//! Text files are assigned to the record's first string field. JSON and YAML
//! are parsed into a [`serde_json::Value`], deep-merged over the record's
//! current state, and deserialized back. Keys absent from the file therefore
//! keep whatever the record already held, which is how `default` tags survive
//! a partial file.

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json as SJSON;
use thiserror::Error;

#[cfg(feature = "yaml")]
use serde_saphyr as YAML;

use crate::config::Config;
use crate::error::Error;
use crate::kind::Slot;
use crate::tags::Format;

/// Errors produced while decoding file content.
#[derive(Debug, Error, Diagnostic)]
pub enum DecodeError {
    /// Syntax error with source location.
    #[error("{format} parse error in {path}")]
    #[diagnostic(code(envi::codec::parse_error))]
    Parse {
        format: Format,

        path: String,

        #[source_code]
        src: NamedSource<String>,

        #[label("{message}")]
        span: SourceSpan,

        message: String,

        #[help]
        help: String,
    },

    /// Syntax error without source location.
    #[error("{format} parse error: {message}")]
    #[diagnostic(code(envi::codec::parse_error))]
    ParseNoSpan {
        format: Format,

        message: String,

        #[help]
        help: String,
    },

    /// Well-formed content that does not fit the record.
    #[error("{format} content does not match {type_name}: {message}")]
    #[diagnostic(
        code(envi::codec::type_mismatch),
        help("check that every key in the file has the type the record declares")
    )]
    Mismatch {
        format: Format,
        type_name: &'static str,
        message: String,
    },

    /// The record has no decoder for the format.
    #[error("{type_name} cannot be decoded from {format}")]
    #[diagnostic(
        code(envi::codec::unsupported),
        help("derive serde's `Serialize` and `Deserialize` and add `#[envi(serde)]` to the record")
    )]
    Unsupported {
        format: Format,
        type_name: &'static str,
    },
}

/// Decodes `content` into `record` according to `format`.
///
/// `origin` is the file the content came from and is only used to label
/// errors.
pub fn unmarshal(
    record: &mut dyn Config,
    format: Format,
    content: &str,
    origin: &Path,
) -> Result<(), Error> {
    match format {
        Format::Text => assign_text(record, content),
        Format::Yaml | Format::Json => {
            let type_name = record.type_name();
            record
                .decode(format, content, origin)
                .map_err(|source| Error::Unmarshal {
                    path: origin.to_path_buf(),
                    type_name,
                    source,
                })
        }
    }
}

fn assign_text(record: &mut dyn Config, content: &str) -> Result<(), Error> {
    let type_name = record.type_name();
    let text = content.trim_end_matches(['\r', '\n']);

    for field in record.fields() {
        if let Some(Slot::Str(value)) = field.value.peek() {
            text.clone_into(value);
            return Ok(());
        }
    }

    Err(Error::invalid_kind(type_name, "string", "struct"))
}

/// Merges JSON or YAML `content` over the current state of `record`.
///
/// This is the body of [`Config::decode`] for records derived with
/// `#[envi(serde)]`.
pub fn merge_into<T>(
    record: &mut T,
    format: Format,
    content: &str,
    origin: &Path,
) -> Result<(), DecodeError>
where
    T: Config + Serialize + DeserializeOwned,
{
    let type_name = record.type_name();
    let mismatch = |e: SJSON::Error| DecodeError::Mismatch {
        format,
        type_name,
        message: e.to_string(),
    };

    let Some(overlay) = parse_value(format, content, origin, type_name)? else {
        return Ok(());
    };

    let mut merged = SJSON::to_value(&*record).map_err(mismatch)?;
    deep_merge(&mut merged, overlay);
    *record = SJSON::from_value(merged).map_err(mismatch)?;

    Ok(())
}

/// Parses content into a generic value.
///
/// Returns `None` for a YAML document with no content.
fn parse_value(
    format: Format,
    content: &str,
    origin: &Path,
    type_name: &'static str,
) -> Result<Option<SJSON::Value>, DecodeError> {
    match format {
        Format::Json => SJSON::from_str(content)
            .map(Some)
            .map_err(|e| json_parse_error(&e, content, origin)),

        #[cfg(feature = "yaml")]
        Format::Yaml => {
            if content.trim().is_empty() {
                return Ok(None);
            }

            YAML::from_str::<SJSON::Value>(content)
                .map(|value| (!value.is_null()).then_some(value))
                .map_err(|e| yaml_parse_error(&e, content, origin))
        }

        _ => Err(DecodeError::Unsupported { format, type_name }),
    }
}

/// Recursively merges `overlay` into `base`.
///
/// Objects merge key by key. Any other overlay value replaces the base.
pub fn deep_merge(base: &mut SJSON::Value, overlay: SJSON::Value) {
    match (base, overlay) {
        (SJSON::Value::Object(base_map), SJSON::Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    deep_merge(base_value, overlay_value);
                } else {
                    base_map.insert(key, overlay_value);
                }
            }
        }
        (base, overlay) => {
            *base = overlay;
        }
    }
}

// ============================================================================
// Source spans
// ============================================================================

/// Span from `offset` to the end of the token that starts there.
fn offset_to_span(offset: usize, content: &str) -> SourceSpan {
    let start = offset.min(content.len());
    let token = content
        .get(start..)
        .unwrap_or_default()
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '}' | ']'))
        .next()
        .unwrap_or_default();

    SourceSpan::new(start.into(), token.len().clamp(1, 20))
}

/// Converts a 1-indexed line/column pair to a byte offset.
///
/// Line endings are counted as they appear in `content`, so `\r\n` files
/// map to the same bytes the parser saw.
fn line_col_to_offset(content: &str, line: usize, col: usize) -> usize {
    let mut start = 0;

    for (number, text) in (1..).zip(content.split_inclusive('\n')) {
        if number == line {
            return start + col.saturating_sub(1).min(text.len());
        }
        start += text.len();
    }

    start
}

fn json_parse_error(e: &SJSON::Error, content: &str, path: &Path) -> DecodeError {
    let offset = line_col_to_offset(content, e.line(), e.column());

    DecodeError::Parse {
        format: Format::Json,
        path: path.display().to_string(),
        src: NamedSource::new(path.display().to_string(), content.to_string()),
        span: offset_to_span(offset, content),
        message: e.to_string(),
        help: "check for missing commas, quotes, or brackets".to_string(),
    }
}

#[cfg(feature = "yaml")]
fn yaml_parse_error(e: &YAML::Error, content: &str, path: &Path) -> DecodeError {
    let message = e.to_string();
    let help = "check indentation and ensure proper YAML syntax".to_string();

    match extract_yaml_location(&message) {
        Some((line, col)) => DecodeError::Parse {
            format: Format::Yaml,
            path: path.display().to_string(),
            src: NamedSource::new(path.display().to_string(), content.to_string()),
            span: offset_to_span(line_col_to_offset(content, line, col), content),
            message,
            help,
        },
        None => DecodeError::ParseNoSpan {
            format: Format::Yaml,
            message,
            help,
        },
    }
}

/// Pulls `line N ... column M` out of a YAML error message.
#[cfg(feature = "yaml")]
fn extract_yaml_location(msg: &str) -> Option<(usize, usize)> {
    fn number_after<'a>(text: &'a str, label: &str) -> Option<(usize, &'a str)> {
        let rest = &text[text.find(label)? + label.len()..];
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let value = rest[..digits].parse().ok()?;
        Some((value, &rest[digits..]))
    }

    let (line, rest) = number_after(msg, "line ")?;
    let (col, _) = number_after(rest, "column ")?;
    Some((line, col))
}
