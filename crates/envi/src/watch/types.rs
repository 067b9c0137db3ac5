//! Core types for hot reload.
//!
//! - [`WatchError`] - errors reported by file watches and reload loops
//! - [`ChangeObserver`] - notifications a watched record receives

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error type for watch and hot reload operations.
///
/// Errors raised inside a reload loop are delivered to the record's
/// [`ChangeObserver::on_error`] and to [`Envi::errors`](crate::Envi::errors).
/// In every case the previously loaded value stays active.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum WatchError {
    /// The filesystem watcher (or its thread) could not be started.
    #[error("failed to initialize file watcher: {message}")]
    #[diagnostic(
        code(envi::watch::init_failed),
        help("check the platform's file watch limits")
    )]
    InitFailed {
        message: String,
        #[source]
        source: Option<notify::Error>,
    },

    /// A directory could not be watched.
    #[error("failed to watch path '{}': {message}", path.display())]
    #[diagnostic(
        code(envi::watch::path_error),
        help("ensure the directory exists and you have read permissions")
    )]
    PathError { path: PathBuf, message: String },

    /// A changed file could not be re-loaded.
    #[error("configuration reload of '{}' failed", path.display())]
    #[diagnostic(
        code(envi::watch::reload_failed),
        help("fix the file and save it again; the previous configuration remains active")
    )]
    ReloadFailed {
        path: PathBuf,
        #[source]
        source: Box<crate::Error>,
    },

    /// A watched file was removed.
    #[error("watched file was removed: {}", path.display())]
    #[diagnostic(
        code(envi::watch::file_removed),
        help("recreate the file to resume reloading")
    )]
    FileRemoved { path: PathBuf },

    /// The directory watch could not be re-established after a removal.
    #[error("failed to re-watch '{}' after removal", path.display())]
    #[diagnostic(code(envi::watch::rewatch_failed))]
    RewatchFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A directory watch could not be released.
    #[error("failed to close watch on '{}'", path.display())]
    #[diagnostic(code(envi::watch::close_failed))]
    CloseFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl WatchError {
    /// Create a new `InitFailed` error.
    pub fn init_failed(message: impl Into<String>, source: Option<notify::Error>) -> Self {
        Self::InitFailed {
            message: message.into(),
            source,
        }
    }

    /// Create a new `PathError`.
    pub fn path_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PathError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new `ReloadFailed` error.
    pub fn reload_failed(path: impl Into<PathBuf>, source: crate::Error) -> Self {
        Self::ReloadFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create a new `FileRemoved` error.
    pub fn file_removed(path: impl Into<PathBuf>) -> Self {
        Self::FileRemoved { path: path.into() }
    }
}

/// Notifications delivered to a watched record.
///
/// Only records implementing this trait can be held in a
/// [`Watched`](super::Watched) cell that takes part in loading, so a record
/// tagged `watch` always has somewhere to report to.
///
/// Both methods run on the field's reload thread and receive a snapshot of
/// the record taken right after the reload attempt.
pub trait ChangeObserver {
    /// Called after new file content has been applied.
    fn on_change(&self);

    /// Called when a reload attempt fails or the file disappears.
    fn on_error(&self, error: &WatchError);
}
