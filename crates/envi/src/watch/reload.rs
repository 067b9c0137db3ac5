//! Per-field reload loop.
//!
//! Each watched field gets its own thread running a [`ReloadTask`]. The
//! task receives the raw events of its directory, keeps those that name its
//! file, waits for the burst to settle, and then runs the reload pipeline:
//!
//! 1. A missing file reports [`WatchError::FileRemoved`] and re-registers
//!    the directory watch.
//! 2. The content is hashed; if the hash matches the content this field
//!    last applied nothing happens.
//! 3. Otherwise the record is reloaded. Success updates the hash and calls
//!    `on_change`; failure calls `on_error` and leaves the hash alone.
//!
//! The last applied hash belongs to the task, not to the path. Several
//! fields backed by the same file each reload it on their own.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, select};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use sha1::{Digest, Sha1};
use tracing::{debug, info, trace, warn};

use super::container::Live;
use super::types::WatchError;
use crate::error::Error;
use crate::tags::Format;

/// SHA-1 digest of a file's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ContentHash([u8; 20]);

impl ContentHash {
    pub(crate) fn of(content: &str) -> Self {
        let mut digest = [0_u8; 20];
        digest.copy_from_slice(&Sha1::digest(content.as_bytes()));
        Self(digest)
    }
}

/// Both ends of the bounded error channel behind [`Envi::errors`].
///
/// Reporting never blocks: when the buffer is full the oldest pending
/// error is discarded to make room.
///
/// [`Envi::errors`]: crate::Envi::errors
#[derive(Clone)]
pub(crate) struct ErrorSink {
    tx: Sender<WatchError>,
    rx: Receiver<WatchError>,
}

impl ErrorSink {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub(crate) fn receiver(&self) -> Receiver<WatchError> {
        self.rx.clone()
    }

    pub(crate) fn push(&self, error: WatchError) {
        let Err(TrySendError::Full(error)) = self.tx.try_send(error) else {
            return;
        };

        if let Ok(oldest) = self.rx.try_recv() {
            warn!(error = %oldest, "error channel full, dropping oldest error");
        }
        if let Err(TrySendError::Full(dropped)) = self.tx.try_send(error) {
            warn!(error = %dropped, "error channel full, dropping error");
        }
    }
}

/// Everything one field's reload thread needs.
pub(crate) struct ReloadTask {
    pub field: &'static str,
    pub path: PathBuf,
    pub dir: PathBuf,
    pub file_name: OsString,
    pub format: Format,
    pub live: Arc<dyn Live>,
    pub events: Receiver<Event>,
    /// Never sent on; disconnects when the watch entry is dropped.
    pub cancel: Receiver<()>,
    pub watcher: Arc<Mutex<RecommendedWatcher>>,
    /// Hash of the content the field was loaded from.
    pub applied: ContentHash,
    pub errors: ErrorSink,
    pub debounce: Duration,
}

impl ReloadTask {
    pub(crate) fn run(self) {
        let mut deadline: Option<Instant> = None;
        let mut applied = self.applied;

        loop {
            let Some(due) = deadline else {
                select! {
                    recv(self.cancel) -> _ => break,
                    recv(self.events) -> event => match event {
                        Ok(event) if self.is_relevant(&event) => {
                            deadline = Some(Instant::now() + self.debounce);
                        }
                        Ok(_) => {}
                        Err(_) => break,
                    },
                }
                continue;
            };

            select! {
                recv(self.cancel) -> _ => break,
                recv(self.events) -> event => match event {
                    Ok(event) if self.is_relevant(&event) => {
                        deadline = Some(Instant::now() + self.debounce);
                    }
                    Ok(_) => {}
                    Err(_) => break,
                },
                default(due.saturating_duration_since(Instant::now())) => {
                    deadline = None;
                    self.flush(&mut applied);
                }
            }
        }

        debug!(field = self.field, path = %self.path.display(), "reload loop stopped");
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(self.file_name.as_os_str()))
    }

    fn flush(&self, applied: &mut ContentHash) {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.report(WatchError::file_removed(&self.path));
                self.rewatch();
                return;
            }
            Err(source) => {
                let error = Error::Read {
                    path: self.path.clone(),
                    source,
                };
                self.report(WatchError::reload_failed(&self.path, error));
                return;
            }
        };

        let hash = ContentHash::of(&content);
        if *applied == hash {
            trace!(field = self.field, path = %self.path.display(), "content unchanged, skipping reload");
            return;
        }

        match self.live.reload(self.format, &content, &self.path) {
            Ok(()) => {
                *applied = hash;
                info!(field = self.field, path = %self.path.display(), "configuration reloaded");
                self.live.notify_change();
            }
            Err(error) => self.report(WatchError::reload_failed(&self.path, error)),
        }
    }

    fn rewatch(&self) {
        if let Err(source) = self
            .watcher
            .lock()
            .watch(&self.dir, RecursiveMode::NonRecursive)
        {
            self.report(WatchError::RewatchFailed {
                path: self.dir.clone(),
                source,
            });
        }
    }

    fn report(&self, error: WatchError) {
        warn!(field = self.field, error = %error, "reload failed");
        self.live.notify_error(&error);
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::watch::Watched;

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(ContentHash::of("name: PETER PAN"), ContentHash::of("name: PETER PAN"));
        assert_ne!(ContentHash::of("name: PETER PAN"), ContentHash::of("name: PANUS"));
    }

    #[test]
    fn test_content_hash_known_digest() {
        // sha1("abc")
        let expected = [
            0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78, 0x50,
            0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d,
        ];
        assert_eq!(ContentHash::of("abc").0, expected);
    }

    fn task(path: &Path, live: Arc<dyn Live>, applied: &str) -> ReloadTask {
        let (_cancel_tx, cancel) = crossbeam_channel::bounded(0);
        let (_events_tx, events) = crossbeam_channel::unbounded();
        let watcher = notify::recommended_watcher(|_: notify::Result<Event>| {}).unwrap();

        ReloadTask {
            field: "token",
            path: path.to_path_buf(),
            dir: path.parent().unwrap().to_path_buf(),
            file_name: path.file_name().unwrap().to_os_string(),
            format: Format::Text,
            live,
            events,
            cancel,
            watcher: Arc::new(Mutex::new(watcher)),
            applied: ContentHash::of(applied),
            errors: ErrorSink::new(4),
            debounce: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_relevant_events_match_file_name() {
        let live = Arc::new(Watched::new(NoopRecord::default()));
        let task = task(Path::new("/tmp/conf/a.json"), live, "");

        let modify = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(Path::new("/tmp/conf/a.json").to_path_buf());
        let other = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(Path::new("/tmp/conf/b.yaml").to_path_buf());
        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(Path::new("/tmp/conf/a.json").to_path_buf());

        assert!(task.is_relevant(&modify));
        assert!(!task.is_relevant(&other));
        assert!(!task.is_relevant(&access));
    }

    #[test]
    fn test_unchanged_content_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        std::fs::write(&path, "one").unwrap();

        let cell = Watched::new(NoopRecord::default());
        let task = task(&path, Arc::new(cell.clone()), "one");
        let mut applied = task.applied;

        task.flush(&mut applied);

        assert_eq!(cell.epoch(), 0);
        assert_eq!(applied, ContentHash::of("one"));
    }

    #[test]
    fn test_fields_sharing_a_file_each_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        std::fs::write(&path, "one").unwrap();

        let first = Watched::new(NoopRecord::default());
        let second = Watched::new(NoopRecord::default());
        let first_task = task(&path, Arc::new(first.clone()), "one");
        let second_task = task(&path, Arc::new(second.clone()), "one");
        let mut first_applied = first_task.applied;
        let mut second_applied = second_task.applied;

        std::fs::write(&path, "two").unwrap();
        first_task.flush(&mut first_applied);
        second_task.flush(&mut second_applied);

        assert_eq!(first.get().value, "two");
        assert_eq!(second.get().value, "two");
        assert_eq!(first.epoch(), 1);
        assert_eq!(second.epoch(), 1);
        assert_eq!(first_applied, second_applied);
    }

    #[test]
    fn test_full_sink_drops_oldest() {
        let sink = ErrorSink::new(2);
        let errors = sink.receiver();

        sink.push(WatchError::file_removed("/tmp/1"));
        sink.push(WatchError::file_removed("/tmp/2"));
        sink.push(WatchError::file_removed("/tmp/3"));

        let paths: Vec<PathBuf> = errors
            .try_iter()
            .map(|e| match e {
                WatchError::FileRemoved { path } => path,
                other => panic!("unexpected error: {other}"),
            })
            .collect();
        assert_eq!(paths, [PathBuf::from("/tmp/2"), PathBuf::from("/tmp/3")]);
    }

    #[derive(crate::Config, Clone, Default)]
    pub struct NoopRecord {
        #[envi(default = "x")]
        pub value: String,
    }

    impl crate::ChangeObserver for NoopRecord {
        fn on_change(&self) {}
        fn on_error(&self, _error: &WatchError) {}
    }
}
