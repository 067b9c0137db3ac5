//! # envi
//!
//! Declarative configuration for Rust structs from environment variables,
//! defaults and files, with live reloading of file-backed sections.
//!
//! A configuration is a plain struct deriving [`Config`]. Its `String`
//! fields are read from environment variables (falling back to a default).
//! Its nested record fields are read from files whose path comes from the
//! same environment-or-default rule. A nested record held in a [`Watched`]
//! cell and tagged `watch` keeps following its file after the initial load.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use envi::{Config, Envi};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Config, Default, Serialize, Deserialize)]
//! #[envi(serde)]
//! pub struct Database {
//!     #[serde(rename = "USER")]
//!     #[envi(default = "admin")]
//!     pub user: String,
//!
//!     #[serde(rename = "PORT")]
//!     #[envi(default = "5432")]
//!     pub port: i32,
//! }
//!
//! #[derive(Config, Default)]
//! pub struct App {
//!     #[envi(env = "APP_NAME", default = "demo", required)]
//!     pub name: String,
//!
//!     #[envi(env = "DB_CONFIG", default = "./db.json", type = "json")]
//!     pub db: Database,
//! }
//!
//! fn main() -> envi::Result<()> {
//!     let mut envi = envi::Envi::new();
//!     let mut app = App::default();
//!     envi.load(&mut app)?;
//!
//!     println!("{} connects as {}", app.name, app.db.user);
//!     Ok(())
//! }
//! ```
//!
//! ## Field Attributes
//!
//! | Attribute | Applies to | Effect |
//! |-----------|------------|--------|
//! | `env = "VAR"` | any field | environment variable; for records, overrides the file path |
//! | `default = "..."` | any field | default value; for records, the default file path |
//! | `type = "..."` | record fields | `yaml` (default), `yml`, `json` or `text` |
//! | `required` | any field | the zero value fails validation |
//! | `watch` | `Watched<T>` fields | reload the record when its file changes |
//! | `skip` | any field | exclude a public field from loading |
//!
//! Only `pub` fields take part. Every participating field needs `env` or
//! `default`.
//!
//! ## Struct Attributes
//!
//! | Attribute | Effect |
//! |-----------|--------|
//! | `#[envi(serde)]` | decode JSON/YAML files through the struct's serde impls |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `yaml` | yes | YAML files through `serde-saphyr` |
//!
//! ## Error Handling
//!
//! All errors carry [`miette`] diagnostic codes and help text. Structural
//! problems abort [`Envi::load`] at the first failure; missing required
//! fields are collected and returned together in [`Error::Validation`].
//! Errors raised while reloading in the background go to the record's
//! [`ChangeObserver::on_error`] and to [`Envi::errors`].

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// Generated code refers to `::envi`, including inside this crate's tests.
extern crate self as envi;

// Re-export the derive macro
pub use envi_macro::Config;

/// Re-export miette for error handling.
pub use miette;

// ============================================================================
// Core Modules
// ============================================================================

mod error;
pub use error::Error;

/// A Result type that displays errors with miette's fancy formatting.
///
/// ```rust,ignore
/// fn main() -> envi::Result<()> {
///     envi::Envi::new().load(&mut app)?;
///     Ok(())
/// }
/// ```
pub type Result<T> = miette::Result<T>;

mod config;
mod kind;
mod tags;

pub use config::{Config, Field};
pub use kind::{Kind, Scalar, Slot};
pub use tags::{Format, Tags};

pub mod codec;
pub use codec::DecodeError;

mod defaults;
mod validation;

// ============================================================================
// Loading
// ============================================================================

mod loader;
pub use loader::Envi;

// ============================================================================
// Hot Reload
// ============================================================================

pub mod watch;
pub use watch::{ChangeObserver, EnviBuilder, Live, WatchError, Watched};
