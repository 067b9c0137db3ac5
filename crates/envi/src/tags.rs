//! Field tags and value resolution.
//!
//! Every field that takes part in loading carries a [`Tags`] value generated
//! by `#[derive(Config)]` from its `#[envi(...)]` attribute.

use crate::error::Error;

/// Per-field metadata.
///
/// `env` and `default` decide where a value (or a file path) comes from.
/// `format` names the decoder for file-backed records. `required` makes
/// validation reject the zero value. `watch` asks for hot reload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tags {
    pub env: Option<&'static str>,
    pub default: Option<&'static str>,
    pub format: Option<&'static str>,
    pub required: bool,
    pub watch: bool,
}

impl Tags {
    /// Returns `true` if the field names at least one value source.
    #[must_use]
    pub fn has_source(&self) -> bool {
        self.env.is_some() || self.default.is_some()
    }

    /// Resolves the field's raw value.
    ///
    /// A set, non-empty environment variable wins. Otherwise the default is
    /// used, and a field with neither resolves to the empty string.
    #[must_use]
    pub fn resolve(&self) -> String {
        self.env
            .filter(|name| !name.is_empty())
            .and_then(|name| std::env::var(name).ok())
            .filter(|value| !value.is_empty())
            .or_else(|| self.default.map(str::to_owned))
            .unwrap_or_default()
    }
}

/// Encoding of a file-backed record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Yaml,
    Json,
    /// Whole file content goes to the record's first string field.
    Text,
}

impl Format {
    /// Maps a `type` tag to a format.
    ///
    /// An absent tag means YAML.
    pub fn from_tag(field: &str, tag: Option<&str>) -> Result<Self, Error> {
        match tag {
            None => Ok(Self::Yaml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("text") => Ok(Self::Text),
            Some(other) => Err(Error::InvalidTag {
                field: field.to_owned(),
                tag: "type",
                value: other.to_owned(),
            }),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
