//! Error types for configuration loading.
//!
//! This module contains the [`Error`] enum returned by [`Envi::load`] and
//! [`Envi::close`], integrating with [`miette`] for rich diagnostics.
//!
//! # Error Variants
//!
//! | Variant | When It Occurs |
//! |---------|----------------|
//! | [`Error::InvalidKind`] | A field has a shape the loader cannot handle |
//! | [`Error::MissingTag`] | A field carries neither `env` nor `default` |
//! | [`Error::InvalidTag`] | A `type` tag names an unknown format |
//! | [`Error::Parsing`] | A `default` could not be parsed into the field's kind |
//! | [`Error::FieldRequired`] | A `required` field holds its zero value |
//! | [`Error::Validation`] | Every `FieldRequired` violation of one load |
//! | [`Error::Read`] | A backing file could not be read |
//! | [`Error::Unmarshal`] | A backing file could not be decoded |
//! | [`Error::NotWatchable`] | `watch` on a field that is not a [`Watched`] cell |
//! | [`Error::Watch`] | A file watch could not be registered |
//! | [`Error::Close`] | One or more watches failed to close |
//!
//! # Propagation
//!
//! Structural errors (kind, tag and parse failures) abort [`Envi::load`]
//! immediately. Validation is exhaustive: every missing required field of
//! the whole record is reported in one [`Error::Validation`].
//!
//! [`Envi::load`]: crate::Envi::load
//! [`Envi::close`]: crate::Envi::close
//! [`Watched`]: crate::Watched

use std::error::Error as StdError;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::codec::DecodeError;
use crate::watch::WatchError;

/// Errors that can occur while loading, validating or closing configuration.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// A field's kind is not one the loader can populate.
    #[error("expected field {field} to be kind {expected} got {got}")]
    #[diagnostic(
        code(envi::invalid_kind),
        help("root fields must be `String` or a record deriving `envi::Config`")
    )]
    InvalidKind {
        /// Dotted name of the offending field.
        field: String,

        /// The kinds that would have been accepted.
        expected: &'static str,

        /// The kind that was found.
        got: &'static str,
    },

    /// A field carries none of the tags it needs.
    #[error("field {field}: tag {tag} not set")]
    #[diagnostic(
        code(envi::missing_tag),
        help("add `#[envi(env = \"...\")]` or `#[envi(default = \"...\")]` to the field")
    )]
    MissingTag {
        /// Name of the field.
        field: String,

        /// The tag (or tags) that were expected.
        tag: &'static str,
    },

    /// A tag carries a value that is not recognized.
    #[error("field {field}: invalid tag {tag} = {value:?}")]
    #[diagnostic(
        code(envi::invalid_tag),
        help("supported file types are: yaml, yml, json, text")
    )]
    InvalidTag {
        /// Name of the field.
        field: String,

        /// The tag name.
        tag: &'static str,

        /// The unrecognized value.
        value: String,
    },

    /// A default value could not be parsed into the field's kind.
    #[error("could not parse {kind} for field {field} from {value:?}")]
    #[diagnostic(code(envi::parse_error))]
    Parsing {
        /// Name of the field.
        field: String,

        /// Kind the value was parsed as (`int32`, `float64`, `bool`, ...).
        kind: &'static str,

        /// The raw default text.
        value: String,

        /// The underlying parse error.
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A required field holds its zero value after loading.
    #[error("field {field} is required")]
    #[diagnostic(
        code(envi::field_required),
        help("set the field through its environment variable, default, or backing file")
    )]
    FieldRequired {
        /// Dotted path of the field from the root record.
        field: String,
    },

    /// Every required-field violation found during one validation pass.
    #[error("{}", join_lines(.errors))]
    #[diagnostic(
        code(envi::validation_error),
        help("fix all listed configuration errors")
    )]
    Validation {
        /// The individual violations, in traversal order.
        #[related]
        errors: Vec<Error>,
    },

    /// A backing file could not be read.
    #[error("could not read configuration file {}", path.display())]
    #[diagnostic(
        code(envi::read_error),
        help("check that the file exists and is readable, or point the env override at it")
    )]
    Read {
        /// The resolved path.
        path: PathBuf,

        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A backing file could not be decoded into its record.
    #[error("could not unmarshal {} into {type_name}", path.display())]
    #[diagnostic(code(envi::unmarshal_error))]
    Unmarshal {
        /// The resolved path of the file.
        path: PathBuf,

        /// Name of the record type being decoded.
        type_name: &'static str,

        /// The decoder failure, with a source span when available.
        #[diagnostic_source]
        source: DecodeError,
    },

    /// `watch` was set on a field that cannot be watched.
    #[error("field {field} is tagged `watch` but {type_name} is not held in a `Watched` cell")]
    #[diagnostic(
        code(envi::not_watchable),
        help("declare the field as `envi::Watched<{type_name}>` and implement `ChangeObserver`")
    )]
    NotWatchable {
        /// Name of the field.
        field: String,

        /// Name of the record type.
        type_name: &'static str,
    },

    /// A file watch could not be registered.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Watch(#[from] WatchError),

    /// One or more watches failed to close.
    #[error("{}", join_lines(.errors))]
    #[diagnostic(code(envi::close_error))]
    Close {
        /// Every close failure; closing continues past each one.
        #[related]
        errors: Vec<WatchError>,
    },
}

fn join_lines<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl Error {
    /// Creates an `InvalidKind` error.
    pub fn invalid_kind(field: impl Into<String>, expected: &'static str, got: &'static str) -> Self {
        Self::InvalidKind {
            field: field.into(),
            expected,
            got,
        }
    }

    /// Collects validation violations into one `Validation` error.
    ///
    /// Returns `None` if the input is empty.
    pub fn validation(errors: Vec<Error>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self::Validation { errors })
    }

    /// Returns the individual violations of a `Validation` error.
    ///
    /// Any other variant yields an empty slice.
    #[must_use]
    pub fn violations(&self) -> &[Error] {
        match self {
            Self::Validation { errors } => errors,
            _ => &[],
        }
    }
}
