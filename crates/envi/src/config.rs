//! The record trait implemented by `#[derive(Config)]`.

use std::path::Path;

use crate::codec::DecodeError;
use crate::kind::Kind;
use crate::tags::{Format, Tags};

/// A struct whose public fields are populated by the loader.
///
/// This trait is normally derived:
///
/// ```rust,ignore
/// use envi::Config;
///
/// #[derive(Config, Default)]
/// pub struct App {
///     #[envi(env = "APP_NAME", default = "demo")]
///     pub name: String,
/// }
/// ```
///
/// The derive also implements [`Kind`] for the struct, so records nest in
/// other records, in `Option`, and in [`Watched`](crate::Watched) cells.
pub trait Config {
    /// Returns the record's loadable fields in declaration order.
    fn fields(&mut self) -> Vec<Field<'_>>;

    /// Name of the record type.
    fn type_name(&self) -> &'static str;

    /// Merges file content into the record.
    ///
    /// Fields absent from the content keep their current value. Records
    /// derived with `#[envi(serde)]` implement this through
    /// [`codec::merge_into`](crate::codec::merge_into); the default rejects
    /// structured formats.
    fn decode(&mut self, format: Format, content: &str, origin: &Path) -> Result<(), DecodeError> {
        let _ = (content, origin);
        Err(DecodeError::Unsupported {
            format,
            type_name: self.type_name(),
        })
    }
}

/// A named, tagged, mutable reference to one field of a record.
pub struct Field<'a> {
    pub name: &'static str,
    pub tags: Tags,
    pub value: &'a mut dyn Kind,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, tags: Tags, value: &'a mut dyn Kind) -> Self {
        Self { name, tags, value }
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}
