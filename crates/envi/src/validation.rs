//! Required-field validation.
//!
//! After a load, every field tagged `required` must hold a non-zero value.
//! The walk covers nested records (including those inside [`Watched`] cells)
//! and reports every violation, each named by its dotted path from the root.
//!
//! Unset `Option` fields are not descended into.
//!
//! [`Watched`]: crate::Watched

use crate::config::Config;
use crate::error::Error;
use crate::kind::Slot;

/// Returns one [`Error::FieldRequired`] per violation, in traversal order.
pub fn validate(record: &mut dyn Config) -> Vec<Error> {
    let mut errors = Vec::new();
    walk(record, None, &mut errors);
    errors
}

fn walk(record: &mut dyn Config, parent: Option<&str>, errors: &mut Vec<Error>) {
    for field in record.fields() {
        let path = match parent {
            Some(parent) => format!("{parent}.{}", field.name),
            None => field.name.to_owned(),
        };

        if field.tags.required && field.value.is_zero() {
            errors.push(Error::FieldRequired {
                field: path.clone(),
            });
        }

        match field.value.peek() {
            Some(Slot::Record(inner)) => walk(inner, Some(&path), errors),
            // walked on a copy so reload threads and readers are not blocked
            Some(Slot::Watched(live)) => walk(&mut *live.snapshot(), Some(&path), errors),
            _ => {}
        }
    }
}
