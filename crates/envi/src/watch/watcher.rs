//! Directory watches shared by the watched fields of one [`Envi`].
//!
//! Watching happens per directory. The first watched file in a directory
//! creates a [`WatchEntry`] holding the `notify` watcher; every watched
//! field in that directory subscribes to its event stream and filters for
//! its own file name. Closing an entry disconnects its cancellation channel,
//! which stops every reload thread subscribed to it.
//!
//! [`Envi`]: crate::Envi

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::container::Live;
use super::reload::{ContentHash, ErrorSink, ReloadTask};
use super::types::WatchError;
use crate::error::Error;
use crate::tags::Format;

/// One directory watch and its subscribers.
struct WatchEntry {
    watcher: Arc<Mutex<RecommendedWatcher>>,
    subscribers: Arc<Mutex<Vec<Sender<Event>>>>,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
}

impl WatchEntry {
    fn open(dir: &Path) -> Result<Self, WatchError> {
        let subscribers: Arc<Mutex<Vec<Sender<Event>>>> = Arc::default();
        let fanout = Arc::clone(&subscribers);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => fanout.lock().retain(|tx| tx.send(event.clone()).is_ok()),
            Err(error) => warn!(%error, "file watcher reported an error"),
        })
        .map_err(|e| WatchError::init_failed(format!("failed to create file watcher: {e}"), Some(e)))?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::path_error(dir, format!("failed to watch: {e}")))?;

        let (cancel_tx, cancel_rx) = bounded(0);

        Ok(Self {
            watcher: Arc::new(Mutex::new(watcher)),
            subscribers,
            cancel_tx,
            cancel_rx,
        })
    }

    fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    fn close(self, dir: &Path) -> Result<(), WatchError> {
        let Self {
            watcher, cancel_tx, ..
        } = self;
        drop(cancel_tx);

        watcher
            .lock()
            .unwatch(dir)
            .map_err(|source| WatchError::CloseFailed {
                path: dir.to_path_buf(),
                source,
            })
    }
}

/// A file the coordinator is asked to watch.
pub(crate) struct WatchTarget {
    pub field: &'static str,
    pub path: PathBuf,
    pub format: Format,
    pub content_hash: ContentHash,
    pub live: Arc<dyn Live>,
}

/// Owns every directory watch and the error channel.
pub(crate) struct Coordinator {
    entries: HashMap<PathBuf, WatchEntry>,
    watched: Vec<PathBuf>,
    errors: ErrorSink,
    debounce: Duration,
}

impl Coordinator {
    pub(crate) fn new(errors: ErrorSink, debounce: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            watched: Vec::new(),
            errors,
            debounce,
        }
    }

    /// Starts watching `target.path` and spawns the field's reload thread.
    pub(crate) fn watch(&mut self, target: WatchTarget) -> Result<(), Error> {
        let WatchTarget {
            field,
            path,
            format,
            content_hash,
            live,
        } = target;

        let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Err(WatchError::path_error(&path, "path has no parent directory or file name").into());
        };
        let dir = dir.to_path_buf();
        let file_name = file_name.to_os_string();

        let entry = match self.entries.entry(dir.clone()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                debug!(dir = %dir.display(), "watching directory");
                vacant.insert(WatchEntry::open(&dir)?)
            }
        };

        let task = ReloadTask {
            field,
            path: path.clone(),
            dir,
            file_name,
            format,
            live,
            events: entry.subscribe(),
            cancel: entry.cancel_rx.clone(),
            watcher: Arc::clone(&entry.watcher),
            applied: content_hash,
            errors: self.errors.clone(),
            debounce: self.debounce,
        };

        thread::Builder::new()
            .name(format!("envi-watch-{field}"))
            .spawn(move || task.run())
            .map_err(|e| {
                WatchError::init_failed(format!("failed to spawn reload thread: {e}"), None)
            })?;

        debug!(field, path = %path.display(), "watching file");
        self.watched.push(path);

        Ok(())
    }

    pub(crate) fn watch_count(&self) -> usize {
        self.watched.len()
    }

    pub(crate) fn watched_paths(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Cancels every reload thread and releases every directory watch.
    ///
    /// All entries are closed even when some fail. Calling this again
    /// after it returned is a no-op.
    pub(crate) fn close(&mut self) -> Result<(), Error> {
        let errors: Vec<WatchError> = self
            .entries
            .drain()
            .filter_map(|(dir, entry)| entry.close(&dir).err())
            .collect();

        self.watched.clear();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Close { errors })
        }
    }
}
