use std::error::Error as _;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::archive::Archive;
use crate::error::StevedoreError;
use crate::logging::Reporter;

/// Whether a registered archive currently holds an open handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveState {
    Closed,
    Open,
}

/// Outcome of reading one entry through a wrapper.
pub(super) enum Lookup {
    Found(Vec<u8>),
    Missing,
    /// The wrapper was destroyed while the caller waited for it.
    Gone,
}

/// Bookkeeping for one registered archive.
///
/// Open, close, and every read happen under `slot`, so a purge can never
/// close a handle that a lookup is using.
pub(super) struct Wrapper {
    location: PathBuf,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    archive: Option<Archive>,
    last_access: Option<Instant>,
    destroyed: bool,
}

impl Wrapper {
    pub(super) fn new(location: PathBuf) -> Self {
        Self {
            location,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub(super) fn location(&self) -> &Path {
        &self.location
    }

    /// Reads `entry`, opening the archive first if it is closed.
    ///
    /// Open and read failures go to `reporter` and count as a miss. The
    /// archive stays closed after a failed open and is retried next time.
    pub(super) fn read(&self, entry: &str, reporter: &dyn Reporter) -> Lookup {
        let mut guard = self.slot.lock();
        let slot = &mut *guard;
        if slot.destroyed {
            return Lookup::Gone;
        }

        let archive = match slot.archive.take() {
            Some(archive) => archive,
            None => match Archive::open(&self.location) {
                Ok(archive) => archive,
                Err(err) => {
                    self.report(reporter, entry, &err);
                    return Lookup::Missing;
                }
            },
        };
        let archive = slot.archive.insert(archive);
        slot.last_access = Some(Instant::now());

        match archive.read(entry) {
            Ok(Some(bytes)) => Lookup::Found(bytes),
            Ok(None) => Lookup::Missing,
            Err(err) => {
                self.report(reporter, entry, &err);
                Lookup::Missing
            }
        }
    }

    /// Closes the handle if it has been idle for longer than `threshold`.
    ///
    /// Waits for a read in progress on this archive. That read refreshes
    /// `last_access` before releasing the lock, so it is judged afterwards.
    pub(super) fn close_if_idle(&self, now: Instant, threshold: Duration) -> bool {
        let mut slot = self.slot.lock();
        if slot.archive.is_none() {
            return false;
        }

        let idle = slot
            .last_access
            .is_none_or(|last| now.saturating_duration_since(last) > threshold);
        if idle {
            slot.archive = None;
        }
        idle
    }

    /// Closes the handle for good. Waits for any in-flight read to finish.
    pub(super) fn destroy(&self) {
        let mut slot = self.slot.lock();
        slot.archive = None;
        slot.destroyed = true;
    }

    pub(super) fn state(&self) -> ArchiveState {
        if self.slot.lock().archive.is_some() {
            ArchiveState::Open
        } else {
            ArchiveState::Closed
        }
    }

    fn report(&self, reporter: &dyn Reporter, entry: &str, err: &StevedoreError) {
        let mut message = format!(
            "while loading {entry} from {}: {err}",
            self.location.display()
        );
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(message, ": {cause}");
            source = cause.source();
        }
        reporter.error(&message);
    }
}
