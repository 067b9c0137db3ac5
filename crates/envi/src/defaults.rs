//! Applying `default` tags to the fields of a file-backed record.

use crate::config::Config;
use crate::error::Error;
use crate::kind::Slot;

const DEFAULTABLE: &str = "int32, int64, float32, float64, bool, string";

/// Writes every field's non-empty `default` tag into the record.
///
/// Fields without a default are left untouched. A default on a field whose
/// kind cannot be parsed from text is an [`Error::InvalidKind`].
pub fn apply(record: &mut dyn Config) -> Result<(), Error> {
    for field in record.fields() {
        let Some(default) = field.tags.default.filter(|d| !d.is_empty()) else {
            continue;
        };

        match field.value.slot() {
            Slot::Str(value) => default.clone_into(value),
            Slot::Scalar(scalar) => {
                let kind = scalar.kind();
                scalar
                    .set_from_str(default)
                    .map_err(|source| Error::Parsing {
                        field: field.name.to_owned(),
                        kind,
                        value: default.to_owned(),
                        source,
                    })?;
            }
            other => {
                return Err(Error::invalid_kind(
                    field.name,
                    DEFAULTABLE,
                    other.kind_name(),
                ));
            }
        }
    }

    Ok(())
}
