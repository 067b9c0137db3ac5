//! Runtime shapes of configuration fields.
//!
//! The loader never sees concrete field types. It asks each field for a
//! [`Slot`], a typed view that tells it whether the field is a string, a
//! scalar that can be parsed from text, a nested record, a watched record
//! cell, or something it has no rule for.
//!
//! `Option<T>` and `Box<T>` are transparent: asking for a slot allocates the
//! inner value when it is absent, so pointer-like fields are populated the
//! same way as their targets.
//!
//! Every loadable field of a derived record must implement [`Kind`], even one
//! that is only ever filled by a serde decoder. Common types such as
//! `PathBuf`, `Duration` and collections map to [`Slot::Other`]. A field of
//! any other type needs `#[envi(skip)]` or its own `Kind` implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::watch::Live;

/// A typed, mutable view of one field.
pub enum Slot<'a> {
    Str(&'a mut String),
    Scalar(&'a mut dyn Scalar),
    Record(&'a mut dyn Config),
    Watched(&'a dyn Live),
    /// A kind with no loading rule, named for error messages.
    Other(&'static str),
}

impl Slot<'_> {
    /// Name of the slot's kind as it appears in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Scalar(scalar) => scalar.kind(),
            Self::Record(_) => "struct",
            Self::Watched(_) => "watched struct",
            Self::Other(name) => name,
        }
    }
}

/// A value that can take part in a configuration record.
pub trait Kind {
    /// Returns a mutable view of the value, allocating any absent pointer.
    fn slot(&mut self) -> Slot<'_>;

    /// Like [`slot`](Kind::slot), but returns `None` instead of allocating.
    fn peek(&mut self) -> Option<Slot<'_>> {
        Some(self.slot())
    }

    /// Returns `true` if the value is its kind's zero value.
    fn is_zero(&self) -> bool;
}

/// A value that can be parsed from a `default` tag.
pub trait Scalar {
    /// Kind name used in parse errors (`int32`, `float64`, ...).
    fn kind(&self) -> &'static str;

    /// Parses `text` and stores the result.
    fn set_from_str(&mut self, text: &str) -> Result<(), Box<dyn StdError + Send + Sync>>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn kind(&self) -> &'static str {
                    $name
                }

                fn set_from_str(&mut self, text: &str) -> Result<(), Box<dyn StdError + Send + Sync>> {
                    *self = <$ty as FromStr>::from_str(text)?;
                    Ok(())
                }
            }

            impl Kind for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Scalar(self)
                }

                fn is_zero(&self) -> bool {
                    *self == <$ty>::default()
                }
            }
        )*
    };
}

impl_scalar! {
    i32 => "int32",
    i64 => "int64",
    f32 => "float32",
    f64 => "float64",
    bool => "bool",
}

macro_rules! impl_other {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Kind for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Other($name)
                }

                fn is_zero(&self) -> bool {
                    *self == <$ty>::default()
                }
            }
        )*
    };
}

impl_other! {
    i8 => "int8",
    i16 => "int16",
    isize => "int",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    usize => "uint",
    i128 => "int128",
    u128 => "uint128",
    char => "int32",
    Duration => "duration",
}

impl Kind for String {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Str(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Kind for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Other("slice")
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> Kind for HashSet<T, S> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Other("slice")
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Kind for BTreeSet<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Other("slice")
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Kind for PathBuf {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Other("path")
    }

    fn is_zero(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

impl<K, V, S> Kind for HashMap<K, V, S> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Other("map")
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Kind for BTreeMap<K, V> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Other("map")
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Kind + Default> Kind for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        self.get_or_insert_with(T::default).slot()
    }

    fn peek(&mut self) -> Option<Slot<'_>> {
        self.as_mut().and_then(Kind::peek)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: Kind + ?Sized> Kind for Box<T> {
    fn slot(&mut self) -> Slot<'_> {
        (**self).slot()
    }

    fn peek(&mut self) -> Option<Slot<'_>> {
        (**self).peek()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}
