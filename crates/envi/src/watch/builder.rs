//! Builder for configuring an [`Envi`] loader.
//!
//! [`Envi`]: crate::Envi

use std::time::Duration;

use super::reload::ErrorSink;
use super::watcher::Coordinator;
use crate::Envi;

/// Builder for configuring reload behavior.
///
/// # Example
///
/// ```ignore
/// let mut envi = Envi::builder()
///     .debounce(Duration::from_millis(200))
///     .error_capacity(64)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct EnviBuilder {
    /// Debounce duration (default: 100ms).
    debounce: Duration,

    /// Capacity of the error channel (default: 16).
    error_capacity: usize,
}

impl EnviBuilder {
    /// Create a new builder with default settings.
    ///
    /// Default settings:
    /// - 100ms debounce
    /// - 16 buffered errors
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            error_capacity: 16,
        }
    }

    /// Set the debounce duration.
    ///
    /// Editors often emit several events for a single save (truncate, then
    /// write). A reload runs once no event for the file has arrived for this
    /// long. Identical content is skipped regardless.
    ///
    /// # Example
    ///
    /// ```ignore
    /// Envi::builder().debounce(Duration::from_millis(200))
    /// ```
    #[must_use]
    pub const fn debounce(mut self, duration: Duration) -> Self {
        self.debounce = duration;
        self
    }

    /// Set how many reload errors [`Envi::errors`] buffers.
    ///
    /// When the buffer is full, the oldest pending error is dropped to make
    /// room (every error still reaches the record's `on_error`). A capacity
    /// of zero is treated as one.
    #[must_use]
    pub const fn error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity;
        self
    }

    #[must_use]
    pub fn build(self) -> Envi {
        let errors = ErrorSink::new(self.error_capacity);
        let receiver = errors.receiver();
        Envi::from_parts(Coordinator::new(errors, self.debounce), receiver)
    }
}

impl Default for EnviBuilder {
    fn default() -> Self {
        Self::new()
    }
}
