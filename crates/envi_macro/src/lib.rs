//! # envi_macro
//!
//! Procedural macro implementation for the `envi` crate.
//!
//! This crate provides `#[derive(Config)]`, which describes a struct's
//! loadable fields to the `envi` runtime. It is a proc-macro crate and can
//! only export procedural macros.
//!
//! **Note:** Users should depend on the `envi` crate, not this one directly.
//! The `envi` crate re-exports this macro along with the runtime types.
//!
//! # Module Structure
//!
//! - `parse` - Attribute parsing for `#[envi(...)]`
//! - `field` - Per-field descriptor generation
//! - `expand` - Macro expansion orchestration

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod expand;
mod field;
mod parse;

/// Derive macro describing a configuration record.
///
/// Implements `envi::Config` and `envi::Kind` for the struct. Only `pub`
/// fields take part in loading.
///
/// Every loadable field's type must implement `envi::Kind`. Strings,
/// numbers, `bool`, `PathBuf`, `Duration`, collections, nested records and
/// `Watched` records already do. Mark a public field of any other type with
/// `#[envi(skip)]`; a serde record still decodes it from the file.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `env = "NAME"` | Environment variable (for records: overrides the file path) |
/// | `default = "value"` | Default value (for records: the default file path) |
/// | `type = "json"` | File format of a record field: `yaml`, `yml`, `json`, `text` |
/// | `required` | Reject the zero value after loading |
/// | `watch` | Reload a `Watched<T>` field when its file changes |
/// | `skip` | Leave a public field out of loading |
///
/// # Struct Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `serde` | Decode JSON/YAML files through `Serialize`/`Deserialize` |
///
/// # Example
///
/// ```ignore
/// use envi::{Config, Watched};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Config, Clone, Default, Serialize, Deserialize)]
/// #[envi(serde)]
/// pub struct Database {
///     #[envi(default = "admin")]
///     pub user: String,
/// }
///
/// #[derive(Config, Default)]
/// pub struct App {
///     #[envi(env = "APP_NAME", default = "demo")]
///     pub name: String,
///
///     #[envi(env = "DB_FILE", default = "./db.json", type = "json")]
///     pub db: Database,
/// }
/// ```
#[proc_macro_derive(Config, attributes(envi))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    // On error, convert to a compile_error!() invocation
    expand::Expander::expand(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
