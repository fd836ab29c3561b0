//! Command-line interface definitions for stevedore.
//!
//! This module defines the CLI structure using clap, including all subcommands
//! and their arguments. The main entry point is the [`Cli`] struct.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use stevedore::cli::{Cli, Commands};
//!
//! let cli = Cli::parse();
//!
//! match cli.command() {
//!     Commands::Select { include, .. } => println!("{} include globs", include.len()),
//!     Commands::Load { name, .. } => println!("Loading {name}"),
//!     Commands::Resources { name, .. } => println!("Looking up {name}"),
//! }
//! ```

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use crate::duration::parse_duration;
use crate::error::{Result, StevedoreError};
use crate::loader::LoaderConfig;

const DEFAULT_IDLE_THRESHOLD: &str = "10s";

/// Main command-line interface for stevedore.
#[derive(Parser)]
#[command(
    name = "stevedore",
    bin_name = "stevedore",
    author,
    version,
    about = "Select paths with Ant-style globs and load units from lazily opened archives",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Global options that apply to all stevedore commands.
///
/// Besides output verbosity these carry the archive loader's tuning knobs, so
/// they can be set once through the environment for a whole build.
#[derive(Parser)]
pub struct GlobalOpts {
    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "STEVEDORE_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "STEVEDORE_QUIET"
    )]
    quiet: bool,

    /// Close archives unused for longer than this (e.g. "500ms", "10s", "2m")
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_IDLE_THRESHOLD,
        env = "STEVEDORE_IDLE_THRESHOLD"
    )]
    idle_threshold: String,

    /// Purge idle archives in the background at this interval
    #[arg(long, global = true, env = "STEVEDORE_AUTOPURGE_INTERVAL")]
    autopurge_interval: Option<String>,
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts` programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    /// Get the verbose level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// Get the raw idle threshold
    pub fn idle_threshold(&self) -> &str {
        &self.idle_threshold
    }

    /// Get the raw autopurge interval, if any
    pub fn autopurge_interval(&self) -> Option<&str> {
        self.autopurge_interval.as_deref()
    }

    /// Parse the loader options into a [`LoaderConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if a duration does not parse or the autopurge
    /// interval is zero.
    pub fn loader_config(&self) -> Result<LoaderConfig> {
        let autopurge_interval = self
            .autopurge_interval
            .as_deref()
            .map(parse_duration)
            .transpose()?;

        LoaderConfig::builder()
            .idle_threshold(parse_duration(&self.idle_threshold)?)
            .autopurge_interval(autopurge_interval)
            .build()
    }
}

/// Builder for constructing `GlobalOpts` programmatically.
///
/// Useful for testing and library usage where no command line exists.
#[derive(Default)]
pub struct GlobalOptsBuilder {
    verbose: u8,
    quiet: bool,
    idle_threshold: Option<String>,
    autopurge_interval: Option<String>,
}

impl GlobalOptsBuilder {
    /// Set the verbosity level (0 = normal, 1+ = verbose).
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Set the idle threshold, e.g. `"10s"`.
    pub fn idle_threshold(mut self, threshold: impl Into<String>) -> Self {
        self.idle_threshold = Some(threshold.into());
        self
    }

    /// Set the autopurge interval (`None` disables autopurge).
    pub fn autopurge_interval(mut self, interval: Option<impl Into<String>>) -> Self {
        self.autopurge_interval = interval.map(Into::into);
        self
    }

    /// Build the `GlobalOpts` instance with the configured values.
    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            verbose: self.verbose,
            quiet: self.quiet,
            idle_threshold: self
                .idle_threshold
                .unwrap_or_else(|| DEFAULT_IDLE_THRESHOLD.to_string()),
            autopurge_interval: self.autopurge_interval,
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// Get the command
    pub fn command(&self) -> &Commands {
        &self.command
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    verbose: u8,
    quiet: bool,
    idle_threshold: Option<String>,
    autopurge_interval: Option<String>,
    command: Option<Commands>,
}

impl CliBuilder {
    /// Set the verbose level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable quiet mode
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.quiet = enabled;
        self
    }

    /// Set the idle threshold
    pub fn idle_threshold(mut self, threshold: impl Into<String>) -> Self {
        self.idle_threshold = Some(threshold.into());
        self
    }

    /// Set the autopurge interval
    pub fn autopurge_interval(mut self, interval: impl Into<String>) -> Self {
        self.autopurge_interval = Some(interval.into());
        self
    }

    /// Set the command
    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        let command = self.command.ok_or(StevedoreError::ConfigError {
            message: "Command is required".to_string(),
        })?;

        let mut global_opts = GlobalOpts::builder()
            .verbose(self.verbose)
            .quiet(self.quiet)
            .autopurge_interval(self.autopurge_interval);
        if let Some(threshold) = self.idle_threshold {
            global_opts = global_opts.idle_threshold(threshold);
        }

        Ok(Cli {
            global_opts: global_opts.build(),
            command,
        })
    }
}

/// Available stevedore subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the paths selected by include and exclude globs
    ///
    /// Candidates come from exactly one source:
    /// - `--dir`: every regular file below a directory
    /// - `--git`: every file tracked by a Git repository
    /// - `--archive`: every file entry of a jar or zip archive
    ///
    /// A path is printed when it matches at least one include glob and no
    /// exclude glob. Default includes apply only when no `--include` is
    /// given. Paths are printed in candidate order.
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["dir", "git", "archive"])
    ))]
    Select {
        /// Include glob (repeatable)
        #[arg(short, long)]
        include: Vec<String>,

        /// Exclude glob (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Include glob used only when no --include is given (repeatable)
        #[arg(long)]
        default_include: Vec<String>,

        /// Match globs anywhere in a path instead of against the whole path
        #[arg(long)]
        find: bool,

        /// Select among files below this directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Select among files tracked by the Git repository containing this
        /// path
        #[arg(long)]
        git: Option<PathBuf>,

        /// Select among the entries of this archive
        #[arg(long)]
        archive: Option<PathBuf>,
    },

    /// Load a unit by logical name and print where it came from
    ///
    /// `org.example.Widget` resolves to the entry
    /// `org/example/Widget.class`. Archives are searched in the order given
    /// and the first one holding the entry wins. Archives that cannot be
    /// opened are skipped and reported.
    Load {
        /// Logical unit name, e.g. `org.example.Widget`
        name: String,

        /// Archive to search (repeatable, searched in order)
        #[arg(short, long, required = true)]
        archive: Vec<PathBuf>,
    },

    /// Print every archive holding a resource
    Resources {
        /// Entry name, e.g. `META-INF/MANIFEST.MF`
        name: String,

        /// Archive to search (repeatable, searched in order)
        #[arg(short, long, required = true)]
        archive: Vec<PathBuf>,

        /// Stop at the first archive holding the resource
        #[arg(long)]
        first: bool,
    },
}
