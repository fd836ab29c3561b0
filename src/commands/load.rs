//! Load and resources commands: resolve names against an archive loader.

use std::path::PathBuf;
use std::sync::Arc;

use crate::duration::format_duration;
use crate::error::Result;
use crate::loader::{ArchiveLoader, LoaderConfig, Resource, Unit};
use crate::logging::{Collector, Logger, Reporter};

/// One-shot lookup over an ordered list of archives.
pub struct Search<'a> {
    archives: &'a [PathBuf],
    config: LoaderConfig,
    logger: Logger,
}

impl<'a> Search<'a> {
    pub fn builder() -> SearchBuilder<'a> {
        SearchBuilder::default()
    }

    /// Resolves a unit by logical name. The first archive holding it wins.
    pub fn load_unit(&self, name: &str) -> Result<Unit> {
        self.with_loader(|loader| loader.load_unit(name))
    }

    /// Resolves a resource in every archive holding it, or only the first
    /// when `first` is set.
    pub fn resources(&self, name: &str, first: bool) -> Result<Vec<Resource>> {
        self.with_loader(|loader| {
            if first {
                Ok(loader.get_resource(name)?.into_iter().collect())
            } else {
                loader.get_resources(name)
            }
        })
    }

    fn with_loader<T>(&self, lookup: impl FnOnce(&ArchiveLoader) -> Result<T>) -> Result<T> {
        let collector = Arc::new(Collector::new());
        let loader = ArchiveLoader::new(self.config, collector.clone());
        self.logger.verbose(
            2,
            format!(
                "Idle threshold: {}",
                format_duration(loader.idle_threshold())
            ),
        );

        for archive in self.archives {
            if !loader.add(archive.as_path())? {
                self.logger.verbose(
                    1,
                    format!("Skipping duplicate archive {}", archive.display()),
                );
            }
        }

        let result = lookup(&loader);
        self.logger.verbose(
            2,
            format!("{} of {} archives opened", loader.open_count(), self.archives.len()),
        );
        loader.close();

        self.echo_problems(&collector);
        result
    }

    /// Replays archive problems recorded during the lookup.
    fn echo_problems(&self, collector: &Collector) {
        let errors = collector.errors();
        if errors.is_empty() {
            return;
        }

        if self.logger.level() > 0 {
            for error in &errors {
                self.logger.warning(error);
            }
        } else {
            self.logger.info(format!(
                "Skipped {} archive problem(s); rerun with --verbose for details",
                errors.len()
            ));
        }
    }
}

#[derive(Default)]
pub struct SearchBuilder<'a> {
    archives: &'a [PathBuf],
    config: LoaderConfig,
    logger: Option<Logger>,
}

impl<'a> SearchBuilder<'a> {
    /// Archives to search, in search order
    pub fn archives(mut self, archives: &'a [PathBuf]) -> Self {
        self.archives = archives;
        self
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Search<'a> {
        Search {
            archives: self.archives,
            config: self.config,
            logger: self.logger.unwrap_or_else(|| Logger::new(0, true)),
        }
    }
}
