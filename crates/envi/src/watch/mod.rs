//! Hot reload of file-backed records.
//!
//! A nested record becomes live by declaring it as [`Watched<T>`] and adding
//! `watch` to its tags. The record type implements [`ChangeObserver`] to be
//! told about applied reloads and failures.
//!
//! # Quick Start
//!
//! ```ignore
//! use envi::{ChangeObserver, Config, Envi, WatchError, Watched};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Config, Clone, Default, Serialize, Deserialize)]
//! #[envi(serde)]
//! pub struct Database {
//!     #[envi(default = "admin")]
//!     pub user: String,
//! }
//!
//! impl ChangeObserver for Database {
//!     fn on_change(&self) {
//!         println!("database user is now {}", self.user);
//!     }
//!
//!     fn on_error(&self, error: &WatchError) {
//!         eprintln!("reload failed: {error}");
//!     }
//! }
//!
//! #[derive(Config, Default)]
//! pub struct App {
//!     #[envi(env = "DB_FILE", default = "db.yaml", watch)]
//!     pub db: Watched<Database>,
//! }
//!
//! fn main() -> Result<(), envi::Error> {
//!     let mut envi = Envi::new();
//!     let mut app = App::default();
//!     envi.load(&mut app)?;
//!
//!     let user = app.db.read(|db| db.user.clone());
//!     // `app.db` follows edits to db.yaml from here on
//!
//!     envi.close()
//! }
//! ```
//!
//! # Architecture
//!
//! - One `notify` watcher per directory, shared by every watched file in it
//! - One reload thread per watched field, fed by the directory's events
//! - A short debounce window coalesces bursts, then a SHA-1 content hash
//!   suppresses reloads of unchanged content
//! - Reload errors go to [`ChangeObserver::on_error`] and to the bounded
//!   channel returned by [`Envi::errors`](crate::Envi::errors)

mod builder;
mod container;
mod reload;
mod types;
mod watcher;

pub use builder::EnviBuilder;
pub use container::{Live, Watched};
pub use types::{ChangeObserver, WatchError};

pub(crate) use reload::ContentHash;
pub(crate) use watcher::{Coordinator, WatchTarget};
