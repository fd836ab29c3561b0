//! # stevedore
//!
//! Build-tool plumbing for JVM-style projects: selecting source paths with
//! Ant-style globs, and loading compiled units and resources from a set of
//! jar or zip archives that are opened lazily and closed again when idle.
//!
//! ## Key Features
//!
//! - **Ant-style globs**: `*`, `**`, `?` and `{a,b}` alternatives, compiled
//!   once into regular expressions
//! - **Include/exclude path sets**: reusable, with default includes and a
//!   parallel filter over large candidate lists
//! - **Lazy archive loading**: archives are opened on first use and searched
//!   in registration order
//! - **Idle eviction**: open archives unused for a configurable threshold are
//!   closed by an explicit or periodic purge, bounding open file handles
//! - **Git-aware discovery**: candidates can come from a Git index
//!
//! ## Architecture
//!
//! - [`glob`]: Ant-style glob compilation and path sets
//! - [`loader`]: the lazily opened, idle-evicting archive loader
//! - [`archive`]: a thin wrapper over one zip archive
//! - [`candidates`]: candidate path discovery from directories, Git, archives
//! - [`logging`]: the `Reporter` seam and its `Logger`/`Collector` backends
//! - [`cli`] and [`commands`]: the command-line surface
//! - [`error`]: error types with thiserror + miette
//!
//! ## Library Usage
//!
//! ```no_run
//! use stevedore::cli::{Cli, Commands};
//! use stevedore::commands;
//!
//! let cli = Cli::builder()
//!     .verbose(1)
//!     .idle_threshold("5s")
//!     .command(Commands::Load {
//!         name: "org.example.Widget".to_string(),
//!         archive: vec!["lib/widgets.jar".into()],
//!     })
//!     .build()?;
//!
//! commands::execute(&cli)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! The crate uses a combination of:
//! - `thiserror` for strongly-typed errors
//! - `miette` for rich diagnostic output in CLI
//!
//! All public functions return `Result` types with descriptive error variants.

pub mod archive;
pub mod candidates;
pub mod cli;
pub mod commands;
pub mod duration;
pub mod error;
pub mod glob;
pub mod loader;
pub mod logging;
