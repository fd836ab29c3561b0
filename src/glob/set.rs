use rayon::prelude::*;

use super::pattern::{AntGlob, MatchMode};
use crate::error::Result;

/// Anything that may supply a glob string.
///
/// `None` entries are skipped when globs are appended to a [`PathSet`], so
/// optional configuration values can be passed straight through.
pub trait GlobSource {
    /// The glob text, or `None` to skip this entry.
    fn glob(&self) -> Option<&str>;
}

impl GlobSource for str {
    fn glob(&self) -> Option<&str> {
        Some(self)
    }
}

impl GlobSource for String {
    fn glob(&self) -> Option<&str> {
        Some(self)
    }
}

impl<T: GlobSource + ?Sized> GlobSource for &T {
    fn glob(&self) -> Option<&str> {
        (**self).glob()
    }
}

impl<T: GlobSource> GlobSource for Option<T> {
    fn glob(&self) -> Option<&str> {
        self.as_ref().and_then(|g| g.glob())
    }
}

/// A reusable set of Ant-style include and exclude globs.
///
/// A path is selected when any include glob matches it and no exclude glob
/// does. Globs are compiled when they are appended, so an invalid glob is
/// reported immediately and evaluation never recompiles anything.
///
/// # Example
///
/// ```
/// use stevedore::glob::PathSet;
///
/// let mut set = PathSet::new();
/// set.include(["**/*.java"])?.exclude(["**/Test*.java"])?;
///
/// let selected = set.paths(["a/Foo.java", "a/TestFoo.java", "a/Foo.txt"], &[])?;
/// assert_eq!(selected, vec!["a/Foo.java"]);
/// # Ok::<(), stevedore::error::StevedoreError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct PathSet {
    includes: Vec<AntGlob>,
    excludes: Vec<AntGlob>,
}

impl PathSet {
    /// Creates an empty path set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a path set with initial include globs.
    pub fn with_includes<I>(includes: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: GlobSource,
    {
        let mut set = Self::new();
        set.include(includes)?;
        Ok(set)
    }

    /// Appends include globs, preserving order and duplicates.
    ///
    /// Nothing is appended if any glob fails to compile.
    pub fn include<I>(&mut self, globs: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: GlobSource,
    {
        let compiled = compile_all(globs)?;
        self.includes.extend(compiled);
        Ok(self)
    }

    /// Appends exclude globs, preserving order and duplicates.
    ///
    /// Nothing is appended if any glob fails to compile.
    pub fn exclude<I>(&mut self, globs: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: GlobSource,
    {
        let compiled = compile_all(globs)?;
        self.excludes.extend(compiled);
        Ok(self)
    }

    /// The include globs appended so far.
    pub fn includes(&self) -> &[AntGlob] {
        &self.includes
    }

    /// The exclude globs appended so far.
    pub fn excludes(&self) -> &[AntGlob] {
        &self.excludes
    }

    /// Builds a whole-path predicate. See [`PathSet::predicate`].
    pub fn matches(&self, default_includes: &[&str]) -> Result<PathPredicate> {
        self.predicate(default_includes, MatchMode::Full)
    }

    /// Builds a substring predicate. See [`PathSet::predicate`].
    pub fn find(&self, default_includes: &[&str]) -> Result<PathPredicate> {
        self.predicate(default_includes, MatchMode::Find)
    }

    /// Builds a predicate over a snapshot of the current globs.
    ///
    /// `default_includes` are compiled and used only when no include globs
    /// were ever appended; the set itself is left untouched. With neither
    /// includes nor defaults the predicate rejects every path.
    pub fn predicate(&self, default_includes: &[&str], mode: MatchMode) -> Result<PathPredicate> {
        let includes = if self.includes.is_empty() {
            compile_all(default_includes)?
        } else {
            self.includes.clone()
        };

        Ok(PathPredicate {
            includes,
            excludes: self.excludes.clone(),
            mode,
        })
    }

    /// Returns the whole-path matches among `candidates`, in input order.
    pub fn paths<I>(&self, candidates: I, default_includes: &[&str]) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.paths_with(candidates, default_includes, MatchMode::Full)
    }

    /// Returns the matches among `candidates` under `mode`, in input order.
    pub fn paths_with<I>(
        &self,
        candidates: I,
        default_includes: &[&str],
        mode: MatchMode,
    ) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let predicate = self.predicate(default_includes, mode)?;
        Ok(predicate.filter(candidates))
    }

    /// Like [`PathSet::paths_with`], evaluating candidates on the rayon pool.
    ///
    /// The result keeps the order of `candidates`.
    pub fn par_paths<S>(
        &self,
        candidates: &[S],
        default_includes: &[&str],
        mode: MatchMode,
    ) -> Result<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        Ok(self.predicate(default_includes, mode)?.par_filter(candidates))
    }
}

fn compile_all<I>(globs: I) -> Result<Vec<AntGlob>>
where
    I: IntoIterator,
    I::Item: GlobSource,
{
    globs
        .into_iter()
        .filter_map(|g| g.glob().map(AntGlob::compile))
        .collect()
}

/// Path selection predicate produced by a [`PathSet`].
///
/// Owns its own copy of the globs, so globs appended to the set later do not
/// change an existing predicate.
#[derive(Clone, Debug)]
pub struct PathPredicate {
    includes: Vec<AntGlob>,
    excludes: Vec<AntGlob>,
    mode: MatchMode,
}

impl PathPredicate {
    /// Returns `true` if `path` is selected.
    pub fn test(&self, path: &str) -> bool {
        self.includes.iter().any(|g| g.is_match(path, self.mode))
            && !self.excludes.iter().any(|g| g.is_match(path, self.mode))
    }

    /// The evaluation mode of this predicate.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Returns `true` if the predicate has no include globs and so rejects
    /// every path.
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
    }

    /// Keeps the selected candidates, in input order.
    pub fn filter<I>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        candidates
            .into_iter()
            .filter(|path| self.test(path.as_ref()))
            .map(|path| path.as_ref().to_string())
            .collect()
    }

    /// Keeps the selected candidates, testing them on the rayon pool.
    ///
    /// The output is in input order.
    pub fn par_filter<S>(&self, candidates: &[S]) -> Vec<String>
    where
        S: AsRef<str> + Sync,
    {
        candidates
            .par_iter()
            .map(|path| path.as_ref())
            .filter(|path| self.test(path))
            .map(str::to_string)
            .collect()
    }
}
