//! Lazily opened, idle-evicting archive loader.
//!
//! An [`ArchiveLoader`] resolves named units and resources against an ordered
//! list of archives. Archives are opened the first time a lookup reaches them
//! and closed again by [`ArchiveLoader::purge`] once they have been idle for
//! longer than the configured threshold, which bounds the number of open file
//! descriptors in long-running builds.
//!
//! # Concurrency
//!
//! - Each registered archive has its own lock. Opening, reading, and closing
//!   an archive are serialized per archive only, so lookups against different
//!   archives run in parallel and purging one archive never blocks another.
//! - Registration and teardown take a separate registry lock. Lookups hold it
//!   only long enough to copy the search order, never across I/O.
//! - Lookups always consult archives in registration order, so the first
//!   registered archive that holds a name wins regardless of timing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use stevedore::loader::{ArchiveLoader, LoaderConfig};
//! use stevedore::logging::Logger;
//!
//! let config = LoaderConfig::builder()
//!     .idle_threshold(Duration::from_secs(5))
//!     .autopurge_interval(Some(Duration::from_secs(1)))
//!     .build()?;
//! let loader = ArchiveLoader::new(config, Arc::new(Logger::new(0, false)));
//!
//! loader.add("lib/osgi.jar")?;
//! let unit = loader.load_unit("org.osgi.framework.Bundle")?;
//! println!("{} bytes from {}", unit.bytes.len(), unit.source.display());
//!
//! loader.close();
//! # Ok::<(), stevedore::error::StevedoreError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::archive::unit_entry_name;
use crate::error::{Result, StevedoreError};
use crate::logging::Reporter;

mod config;
mod wrapper;

pub use config::{DEFAULT_IDLE_THRESHOLD, LoaderConfig, LoaderConfigBuilder};
pub use wrapper::ArchiveState;
use wrapper::{Lookup, Wrapper};

#[cfg(test)]
mod tests;

/// A unit resolved from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// The logical name that was requested, e.g. `org.example.Widget`
    pub name: String,
    /// The archive entry that held the unit, e.g. `org/example/Widget.class`
    pub entry: String,
    /// The archive the unit was read from
    pub source: PathBuf,
    /// The entry's contents
    pub bytes: Vec<u8>,
}

/// A resource resolved from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// The entry name, e.g. `META-INF/MANIFEST.MF`
    pub name: String,
    /// The archive the resource was read from
    pub source: PathBuf,
    /// The entry's contents
    pub bytes: Vec<u8>,
}

/// Resolves units ahead of the archives.
///
/// A loader built with a parent asks it first and searches its own archives
/// only when the parent returns `None`. Closures of the right shape implement
/// this trait.
pub trait ParentLoader: Send + Sync {
    fn load_unit(&self, name: &str) -> Option<Unit>;
}

impl<F> ParentLoader for F
where
    F: Fn(&str) -> Option<Unit> + Send + Sync,
{
    fn load_unit(&self, name: &str) -> Option<Unit> {
        self(name)
    }
}

/// Loads units and resources from an ordered, growing set of archives.
///
/// Dropping the loader closes it.
pub struct ArchiveLoader {
    shared: Arc<Shared>,
    purger: Mutex<Option<Purger>>,
}

/// State shared with the autopurge thread.
struct Shared {
    open: AtomicBool,
    /// Insertion order is search order
    registry: RwLock<IndexMap<PathBuf, Arc<Wrapper>>>,
    idle_threshold: Duration,
    reporter: Arc<dyn Reporter>,
    parent: Option<Arc<dyn ParentLoader>>,
}

struct Purger {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl ArchiveLoader {
    /// Creates a loader with no archives.
    ///
    /// If the configuration names an autopurge interval, purging starts
    /// immediately.
    pub fn new(config: LoaderConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self::create(config, reporter, None)
    }

    /// Creates a loader with no archives that delegates unit lookups to
    /// `parent` before searching its own archives.
    pub fn with_parent(
        config: LoaderConfig,
        reporter: Arc<dyn Reporter>,
        parent: Arc<dyn ParentLoader>,
    ) -> Self {
        Self::create(config, reporter, Some(parent))
    }

    fn create(
        config: LoaderConfig,
        reporter: Arc<dyn Reporter>,
        parent: Option<Arc<dyn ParentLoader>>,
    ) -> Self {
        let loader = Self {
            shared: Arc::new(Shared {
                open: AtomicBool::new(true),
                registry: RwLock::new(IndexMap::new()),
                idle_threshold: config.idle_threshold(),
                reporter,
                parent,
            }),
            purger: Mutex::new(None),
        };
        if let Some(interval) = config.autopurge_interval() {
            loader.start_purger(interval);
        }
        loader
    }

    /// Returns `false` once the loader has been closed.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    /// The configured idle threshold.
    pub fn idle_threshold(&self) -> Duration {
        self.shared.idle_threshold
    }

    /// Registers an archive at the end of the search order.
    ///
    /// The archive is not opened until a lookup reaches it. Returns `false`
    /// if the location was already registered, in which case nothing changes.
    pub fn add(&self, location: impl Into<PathBuf>) -> Result<bool> {
        self.shared.ensure_open()?;
        let location = location.into();

        let mut registry = self.shared.registry.write();
        // close() may have won the race for the registry lock
        self.shared.ensure_open()?;
        if registry.contains_key(&location) {
            return Ok(false);
        }
        let wrapper = Arc::new(Wrapper::new(location.clone()));
        registry.insert(location, wrapper);
        Ok(true)
    }

    /// Unregisters an archive, closing it if it is open.
    ///
    /// Waits for any lookup that is currently reading from the archive.
    /// Returns `false` if the location was not registered.
    pub fn remove(&self, location: &Path) -> Result<bool> {
        self.shared.ensure_open()?;
        let removed = self.shared.registry.write().shift_remove(location);
        match removed {
            Some(wrapper) => {
                wrapper.destroy();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Registered locations in search order.
    pub fn locations(&self) -> Vec<PathBuf> {
        self.shared.registry.read().keys().cloned().collect()
    }

    /// Whether the archive at `location` is open, or `None` if it is not
    /// registered.
    pub fn state(&self, location: &Path) -> Option<ArchiveState> {
        let wrapper = self.shared.registry.read().get(location).cloned()?;
        Some(wrapper.state())
    }

    /// Number of archives currently holding an open handle.
    pub fn open_count(&self) -> usize {
        self.shared
            .snapshot()
            .iter()
            .filter(|w| w.state() == ArchiveState::Open)
            .count()
    }

    /// Loads a unit by its logical name.
    ///
    /// The parent, if any, is asked first. Otherwise archives are searched in
    /// registration order and the first one holding the unit wins. Every
    /// archive visited is opened if needed and counts as used. Archives that
    /// cannot be opened are reported and skipped.
    ///
    /// # Errors
    ///
    /// - [`StevedoreError::UnitNotFound`] if neither the parent nor any
    ///   archive holds the unit
    /// - [`StevedoreError::LoaderClosed`] if the loader is closed
    pub fn load_unit(&self, name: &str) -> Result<Unit> {
        self.shared.ensure_open()?;
        if let Some(unit) = self.shared.parent.as_ref().and_then(|p| p.load_unit(name)) {
            return Ok(unit);
        }

        let entry = unit_entry_name(name);
        match self.shared.search(&entry, true)?.into_iter().next() {
            Some((source, bytes)) => Ok(Unit {
                name: name.to_string(),
                entry,
                source,
                bytes,
            }),
            None => Err(StevedoreError::UnitNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Returns a resource from the first archive that holds it.
    pub fn get_resource(&self, name: &str) -> Result<Option<Resource>> {
        let name = resource_name(name);
        let found = self.shared.search(name, true)?.into_iter().next();
        Ok(found.map(|(source, bytes)| Resource {
            name: name.to_string(),
            source,
            bytes,
        }))
    }

    /// Returns the resource from every archive that holds it, in search
    /// order.
    pub fn get_resources(&self, name: &str) -> Result<Vec<Resource>> {
        let name = resource_name(name);
        let found = self.shared.search(name, false)?;
        Ok(found
            .into_iter()
            .map(|(source, bytes)| Resource {
                name: name.to_string(),
                source,
                bytes,
            })
            .collect())
    }

    /// Closes every open archive idle for longer than the idle threshold as
    /// of `now`. Returns the number of archives closed.
    ///
    /// Closed archives stay registered and reopen on the next lookup that
    /// needs them.
    pub fn purge(&self, now: Instant) -> usize {
        self.shared.purge(now)
    }

    /// Purges on a background thread every `interval` until the loader is
    /// closed.
    ///
    /// Returns `false` if autopurge was already running.
    pub fn autopurge(&self, interval: Duration) -> Result<bool> {
        self.shared.ensure_open()?;
        if interval.is_zero() {
            return Err(StevedoreError::ConfigError {
                message: "Autopurge interval must be greater than zero".to_string(),
            });
        }
        Ok(self.start_purger(interval))
    }

    fn start_purger(&self, interval: Duration) -> bool {
        let mut purger = self.purger.lock();
        // close() swaps `open` before it takes this lock
        if purger.is_some() || !self.is_open() {
            return false;
        }

        let (stop, stopped) = mpsc::channel::<()>();
        let shared = Arc::clone(&self.shared);
        let handle = thread::spawn(move || {
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        shared.purge(Instant::now());
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        *purger = Some(Purger { stop, handle });
        true
    }

    /// Closes the loader.
    ///
    /// Stops autopurge, waits for in-flight reads, and closes every archive.
    /// Every later `add`, `remove`, or lookup fails with
    /// [`StevedoreError::LoaderClosed`]. Closing twice is a no-op.
    pub fn close(&self) {
        if !self.shared.open.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(purger) = self.purger.lock().take() {
            let _ = purger.stop.send(());
            let _ = purger.handle.join();
        }

        let wrappers: Vec<Arc<Wrapper>> = {
            let mut registry = self.shared.registry.write();
            registry.drain(..).map(|(_, wrapper)| wrapper).collect()
        };
        for wrapper in wrappers {
            wrapper.destroy();
        }
    }
}

impl Drop for ArchiveLoader {
    fn drop(&mut self) {
        self.close();
    }
}

impl Shared {
    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StevedoreError::LoaderClosed)
        }
    }

    /// Copies the search order out of the registry.
    fn snapshot(&self) -> Vec<Arc<Wrapper>> {
        self.registry.read().values().cloned().collect()
    }

    /// Reads `entry` from each archive in search order, stopping at the first
    /// hit when `first_only` is set.
    fn search(&self, entry: &str, first_only: bool) -> Result<Vec<(PathBuf, Vec<u8>)>> {
        self.ensure_open()?;

        let mut found = Vec::new();
        for wrapper in self.snapshot() {
            match wrapper.read(entry, self.reporter.as_ref()) {
                Lookup::Found(bytes) => {
                    found.push((wrapper.location().to_path_buf(), bytes));
                    if first_only {
                        break;
                    }
                }
                Lookup::Missing => {}
                // Removed concurrently; fatal only if the whole loader closed
                Lookup::Gone => self.ensure_open()?,
            }
        }
        Ok(found)
    }

    fn purge(&self, now: Instant) -> usize {
        self.snapshot()
            .iter()
            .filter(|w| w.close_if_idle(now, self.idle_threshold))
            .count()
    }
}

fn resource_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}
