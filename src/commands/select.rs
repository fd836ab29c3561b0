//! Select command: filter candidate paths through a [`PathSet`].

use std::fmt;
use std::path::PathBuf;

use crate::candidates::{archive_candidates, tracked_candidates, walk_candidates};
use crate::error::{Result, StevedoreError};
use crate::glob::{MatchMode, PathPredicate, PathSet};
use crate::logging::Logger;

/// Where candidate paths come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Every regular file below a directory
    Dir(PathBuf),
    /// Every file tracked by the Git repository containing a path
    Git(PathBuf),
    /// Every file entry of an archive
    Archive(PathBuf),
}

impl Source {
    /// Lists the candidate paths, `/`-separated and relative to the source.
    pub fn candidates(&self) -> Result<Vec<String>> {
        match self {
            Source::Dir(root) => walk_candidates(root),
            Source::Git(repo) => tracked_candidates(repo),
            Source::Archive(archive) => archive_candidates(archive),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Dir(root) => write!(f, "directory {}", root.display()),
            Source::Git(repo) => write!(f, "repository at {}", repo.display()),
            Source::Archive(archive) => write!(f, "archive {}", archive.display()),
        }
    }
}

pub struct Select {
    predicate: PathPredicate,
    source: Source,
    logger: Logger,
}

impl Select {
    pub fn builder<'a>() -> SelectBuilder<'a> {
        SelectBuilder::default()
    }

    /// Returns the selected paths in candidate order.
    pub fn run(&self) -> Result<Vec<String>> {
        let candidates = self.source.candidates()?;
        self.logger.verbose(
            1,
            format!("Found {} candidates in {}", candidates.len(), self.source),
        );

        if self.predicate.is_empty() {
            self.logger
                .verbose(1, "No include globs given; nothing can be selected");
        }

        let selected = self.predicate.par_filter(&candidates);
        self.logger.verbose(
            1,
            format!(
                "Selected {} of {} paths ({:?} match)",
                selected.len(),
                candidates.len(),
                self.predicate.mode()
            ),
        );
        Ok(selected)
    }
}

#[derive(Default)]
pub struct SelectBuilder<'a> {
    includes: &'a [String],
    excludes: &'a [String],
    default_includes: &'a [String],
    mode: MatchMode,
    source: Option<Source>,
    logger: Option<Logger>,
}

impl<'a> SelectBuilder<'a> {
    pub fn includes(mut self, globs: &'a [String]) -> Self {
        self.includes = globs;
        self
    }

    pub fn excludes(mut self, globs: &'a [String]) -> Self {
        self.excludes = globs;
        self
    }

    pub fn default_includes(mut self, globs: &'a [String]) -> Self {
        self.default_includes = globs;
        self
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Compiles every glob up front so a bad one fails before any I/O.
    pub fn build(self) -> Result<Select> {
        let source = self.source.ok_or(StevedoreError::ConfigError {
            message: "A candidate source is required".to_string(),
        })?;

        let mut set = PathSet::new();
        set.include(self.includes)?.exclude(self.excludes)?;
        let defaults: Vec<&str> = self.default_includes.iter().map(String::as_str).collect();
        let predicate = set.predicate(&defaults, self.mode)?;

        Ok(Select {
            predicate,
            source,
            logger: self.logger.unwrap_or_else(|| Logger::new(0, true)),
        })
    }
}
