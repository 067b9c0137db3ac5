//! Thread-safe container for live nested records.
//!
//! This module provides [`Watched`], the field type a record uses to opt in
//! to hot reload, and [`Live`], the object-safe view the loader and the
//! reload threads use to reach into it.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::types::{ChangeObserver, WatchError};
use crate::codec;
use crate::config::Config;
use crate::defaults;
use crate::error::Error;
use crate::kind::{Kind, Slot};
use crate::tags::Format;

/// A nested record that can be replaced while the program runs.
///
/// Clones share the same underlying value, so a clone taken before
/// [`Envi::load`](crate::Envi::load) observes every later reload.
///
/// # Thread Safety
///
/// - Any number of threads can read concurrently
/// - A reload replaces the value under the write lock; readers see either
///   the old value or the new one, never a mix
/// - The epoch counter increments once per applied reload
///
/// # Example
///
/// ```ignore
/// let epoch = cfg.db.epoch();
/// let user = cfg.db.read(|db| db.user.clone());
/// // ... later ...
/// if cfg.db.has_changed_since(epoch) {
///     println!("database settings reloaded");
/// }
/// ```
pub struct Watched<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    value: RwLock<T>,
    epoch: AtomicU64,
}

impl<T> Watched<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: RwLock::new(value),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Read the current value via a closure.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let port = watched.read(|db| db.port);
    /// ```
    pub fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.shared.value.read();
        f(&guard)
    }

    /// Get the current epoch.
    ///
    /// Starts at zero and is incremented after each applied reload. The
    /// initial load does not count.
    pub fn epoch(&self) -> u64 {
        self.shared.epoch.load(Ordering::Acquire)
    }

    /// Returns `true` if a reload was applied after `epoch` was observed.
    pub fn has_changed_since(&self, epoch: u64) -> bool {
        self.epoch() != epoch
    }
}

impl<T: Clone> Watched<T> {
    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.shared.value.read().clone()
    }
}

impl<T> Clone for Watched<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Default> Default for Watched<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// Manual Debug impl to avoid requiring T: Debug
impl<T> std::fmt::Debug for Watched<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watched")
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

/// Object-safe access to a [`Watched`] cell.
///
/// Implemented only by [`Watched<T>`]. The loader uses it to populate the
/// cell in place and hands a shared handle to the field's reload thread.
pub trait Live: Send + Sync {
    /// Name of the record type held in the cell.
    fn type_name(&self) -> &'static str;

    /// Runs `apply` against the value under the write lock.
    fn update(
        &self,
        apply: &mut dyn FnMut(&mut dyn Config) -> Result<(), Error>,
    ) -> Result<(), Error>;

    fn is_zero(&self) -> bool;

    /// Returns a copy of the current value, taken under the read lock.
    fn snapshot(&self) -> Box<dyn Config>;

    /// Re-populates the value from new file content.
    ///
    /// Defaults are re-applied and the content decoded into a copy of the
    /// current value. The copy replaces the live value only when every step
    /// succeeds; on error the live value is untouched.
    fn reload(&self, format: Format, content: &str, origin: &Path) -> Result<(), Error>;

    /// Delivers [`ChangeObserver::on_change`] to a snapshot of the value.
    fn notify_change(&self);

    /// Delivers [`ChangeObserver::on_error`] to a snapshot of the value.
    fn notify_error(&self, error: &WatchError);

    /// Returns a shared handle to the same cell.
    fn share(&self) -> Arc<dyn Live>;
}

impl<T> Live for Watched<T>
where
    T: Config + Kind + ChangeObserver + Clone + Send + Sync + 'static,
{
    fn type_name(&self) -> &'static str {
        self.shared.value.read().type_name()
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(&mut dyn Config) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut guard = self.shared.value.write();
        apply(&mut *guard)
    }

    fn is_zero(&self) -> bool {
        self.read(Kind::is_zero)
    }

    fn snapshot(&self) -> Box<dyn Config> {
        Box::new(self.get())
    }

    fn reload(&self, format: Format, content: &str, origin: &Path) -> Result<(), Error> {
        let mut guard = self.shared.value.write();
        let mut next = guard.clone();

        defaults::apply(&mut next)?;
        codec::unmarshal(&mut next, format, content, origin)?;

        *guard = next;
        drop(guard);

        self.shared.epoch.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn notify_change(&self) {
        self.get().on_change();
    }

    fn notify_error(&self, error: &WatchError) {
        self.get().on_error(error);
    }

    fn share(&self) -> Arc<dyn Live> {
        Arc::new(self.clone())
    }
}

impl<T> Kind for Watched<T>
where
    T: Config + Kind + ChangeObserver + Clone + Send + Sync + 'static,
{
    fn slot(&mut self) -> Slot<'_> {
        Slot::Watched(self)
    }

    fn is_zero(&self) -> bool {
        Live::is_zero(self)
    }
}
