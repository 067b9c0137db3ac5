//! The loader that populates records and owns their file watches.
//!
//! [`Envi`] is the main entry point. [`Envi::load`] walks a record's fields:
//!
//! - `String` fields take their environment variable when it is set and
//!   non-empty, else their default
//! - record fields are file-backed: the same rule yields a path, the file's
//!   own defaults are applied, then its content is decoded over them
//! - [`Watched`] record fields load the same way and, when tagged `watch`,
//!   keep following the file until [`Envi::close`]
//!
//! Any other field kind is rejected. After the walk, every `required` field
//! of the whole tree is checked and all violations are returned together.
//!
//! # Example
//!
//! ```rust,ignore
//! use envi::{Config, Envi};
//!
//! #[derive(Config, Default)]
//! pub struct App {
//!     #[envi(env = "APP_NAME", default = "demo", required)]
//!     pub name: String,
//! }
//!
//! let mut envi = Envi::new();
//! let mut app = App::default();
//! envi.load(&mut app)?;
//! ```
//!
//! [`Watched`]: crate::Watched

use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;
use tracing::debug;

use crate::codec;
use crate::config::{Config, Field};
use crate::defaults;
use crate::error::Error;
use crate::kind::{Kind, Slot};
use crate::tags::{Format, Tags};
use crate::validation;
use crate::watch::{ContentHash, Coordinator, EnviBuilder, Live, WatchError, WatchTarget};

/// Loads configuration records and keeps watched fields up to date.
///
/// Watches registered by [`load`](Envi::load) live until
/// [`close`](Envi::close) is called or the `Envi` is dropped. Several
/// independent `Envi` values can coexist in one process.
pub struct Envi {
    coordinator: Coordinator,
    errors: Receiver<WatchError>,
}

impl Envi {
    /// Creates a loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        EnviBuilder::new().build()
    }

    #[must_use]
    pub const fn builder() -> EnviBuilder {
        EnviBuilder::new()
    }

    pub(crate) fn from_parts(coordinator: Coordinator, errors: Receiver<WatchError>) -> Self {
        Self {
            coordinator,
            errors,
        }
    }

    /// Populates `config` and validates it.
    ///
    /// # Errors
    ///
    /// The first structural failure (kind, tag, parse, read, decode or watch
    /// registration) aborts the load. Otherwise every violated `required`
    /// tag is reported in one [`Error::Validation`].
    pub fn load<C: Kind>(&mut self, config: &mut C) -> Result<(), Error> {
        populate(config, &mut self.coordinator)
    }

    /// Returns the receiving end of the reload error channel.
    ///
    /// The channel is bounded (see [`EnviBuilder::error_capacity`]). When it
    /// is full the oldest pending error makes room for the new one. Every
    /// clone competes for the same messages.
    #[must_use]
    pub fn errors(&self) -> Receiver<WatchError> {
        self.errors.clone()
    }

    /// Number of fields currently being watched.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.coordinator.watch_count()
    }

    /// Resolved paths of the watched files, in registration order.
    #[must_use]
    pub fn watched_paths(&self) -> &[PathBuf] {
        self.coordinator.watched_paths()
    }

    /// Stops every reload loop and releases every file watch.
    ///
    /// Closing is attempted for every watch even when some fail. Calling
    /// `close` again, or on an `Envi` that never watched anything, succeeds.
    ///
    /// A reload that was already running may still finish and notify its
    /// record after this returns.
    ///
    /// # Errors
    ///
    /// [`Error::Close`] listing each watch that failed to close.
    pub fn close(&mut self) -> Result<(), Error> {
        self.coordinator.close()
    }
}

impl Default for Envi {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Envi {
    fn drop(&mut self) {
        let _ = self.coordinator.close();
    }
}

impl std::fmt::Debug for Envi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envi")
            .field("watched_paths", &self.watched_paths())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Traversal
// ============================================================================

fn populate(root: &mut dyn Kind, coordinator: &mut Coordinator) -> Result<(), Error> {
    let record = match root.slot() {
        Slot::Record(record) => record,
        other => return Err(Error::invalid_kind("<root>", "struct", other.kind_name())),
    };

    debug!(record = record.type_name(), "loading configuration");

    for field in record.fields() {
        populate_field(field, coordinator)?;
    }

    match Error::validation(validation::validate(record)) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn populate_field(field: Field<'_>, coordinator: &mut Coordinator) -> Result<(), Error> {
    let Field { name, tags, value } = field;

    if !tags.has_source() {
        return Err(Error::MissingTag {
            field: name.to_owned(),
            tag: "env or default",
        });
    }

    match value.slot() {
        Slot::Str(value) => {
            *value = tags.resolve();
            debug!(field = name, "populated from environment or default");
        }

        Slot::Record(record) => {
            if tags.watch {
                return Err(Error::NotWatchable {
                    field: name.to_owned(),
                    type_name: record.type_name(),
                });
            }

            let source = FileSource::resolve(name, &tags)?;
            defaults::apply(record)?;
            let content = source.read()?;
            codec::unmarshal(record, source.format, &content, &source.path)?;
            debug!(field = name, path = %source.path.display(), "populated from file");
        }

        Slot::Watched(live) => {
            let source = FileSource::resolve(name, &tags)?;
            let content = live_load(live, &source)?;
            debug!(field = name, path = %source.path.display(), "populated from file");

            if tags.watch {
                coordinator.watch(WatchTarget {
                    field: name,
                    content_hash: ContentHash::of(&content),
                    path: source.path,
                    format: source.format,
                    live: live.share(),
                })?;
            }
        }

        other => {
            return Err(Error::invalid_kind(
                name,
                "string, struct",
                other.kind_name(),
            ));
        }
    }

    Ok(())
}

/// Populates a watched cell in place and returns the content it was loaded from.
fn live_load(live: &dyn Live, source: &FileSource) -> Result<String, Error> {
    let mut content = String::new();

    live.update(&mut |record: &mut dyn Config| {
        defaults::apply(record)?;
        content = source.read()?;
        codec::unmarshal(record, source.format, &content, &source.path)
    })?;

    Ok(content)
}

/// Where a file-backed field's content comes from.
struct FileSource {
    path: PathBuf,
    format: Format,
}

impl FileSource {
    fn resolve(field: &str, tags: &Tags) -> Result<Self, Error> {
        let format = Format::from_tag(field, tags.format)?;
        let raw = tags.resolve();
        let path = std::path::absolute(Path::new(&raw)).map_err(|source| Error::Read {
            path: PathBuf::from(&raw),
            source,
        })?;

        Ok(Self { path, format })
    }

    fn read(&self) -> Result<String, Error> {
        std::fs::read_to_string(&self.path).map_err(|source| Error::Read {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(crate::Config, Default)]
    pub struct Plain {
        #[envi(default = "PAN")]
        pub peter: String,
        hidden: i32,
    }

    #[derive(crate::Config, Default)]
    pub struct Untagged {
        pub name: String,
    }

    #[derive(crate::Config, Default)]
    pub struct Numeric {
        #[envi(default = "1")]
        pub count: i32,
    }

    #[test]
    fn test_private_fields_are_ignored() {
        let mut plain = Plain::default();
        Envi::new().load(&mut plain).unwrap();
        assert_eq!(plain.peter, "PAN");
        assert_eq!(plain.hidden, 0);
    }

    #[test]
    fn test_root_must_be_record() {
        let mut root = String::new();
        let err = Envi::new().load(&mut root).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKind { expected: "struct", got: "string", .. }
        ));
    }

    #[test]
    fn test_missing_tag() {
        let err = Envi::new().load(&mut Untagged::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingTag { ref field, tag: "env or default" } if field == "name"
        ));
    }

    #[test]
    fn test_scalar_root_field_is_invalid_kind() {
        let err = Envi::new().load(&mut Numeric::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected field count to be kind string, struct got int32"
        );
    }

    #[test]
    fn test_optional_root_is_allocated() {
        let mut plain: Option<Plain> = None;
        Envi::new().load(&mut plain).unwrap();
        assert_eq!(plain.map(|p| p.peter).as_deref(), Some("PAN"));
    }

    #[test]
    fn test_close_without_watches() {
        let mut envi = Envi::new();
        assert!(envi.close().is_ok());
        assert!(envi.close().is_ok());
        assert!(envi.watched_paths().is_empty());
    }
}
