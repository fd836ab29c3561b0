//! Diagnostic reporting.
//!
//! The archive loader never prints on its own. It reports archive failures to
//! an injected [`Reporter`], which the CLI backs with a [`Logger`] and tests
//! back with a [`Collector`].

use std::fmt::Display;

use parking_lot::Mutex;

/// Sink for diagnostics raised while resolving units and resources.
pub trait Reporter: Send + Sync {
    /// Record an error. The operation that raised it may still succeed.
    fn error(&self, message: &str);

    /// Record a warning.
    fn warning(&self, message: &str);
}

#[derive(Clone, Copy, Debug)]
pub struct Logger {
    verbose: u8,
    quiet: bool,
}

impl Logger {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn info(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    pub fn verbose(&self, level: u8, message: impl Display) {
        if !self.quiet && self.verbose >= level {
            eprintln!("{message}");
        }
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn level(&self) -> u8 {
        self.verbose
    }
}

impl Reporter for Logger {
    fn error(&self, message: &str) {
        // Errors are shown even in quiet mode
        eprintln!("error: {message}");
    }

    fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("warning: {message}");
        }
    }
}

/// A [`Reporter`] that keeps every message in memory.
#[derive(Debug, Default)]
pub struct Collector {
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded errors, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    /// Snapshot of the recorded warnings, oldest first.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    /// Returns `true` when no errors or warnings were recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.lock().is_empty() && self.warnings.lock().is_empty()
    }

    /// Returns `true` if any recorded error contains `fragment`.
    pub fn check(&self, fragment: &str) -> bool {
        self.errors.lock().iter().any(|e| e.contains(fragment))
    }
}

impl Reporter for Collector {
    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}
