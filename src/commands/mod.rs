//! Implementation of stevedore subcommands.
//!
//! `mod.rs` is a thin dispatcher. It turns parsed arguments into command
//! values, runs them, and prints their results to stdout. Diagnostics go to
//! stderr through [`Logger`].

use std::path::{Component, Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::error::{Result, StevedoreError};
use crate::glob::MatchMode;
use crate::logging::Logger;

pub(crate) mod load;
pub(crate) mod select;

pub use load::{Search, SearchBuilder};
pub use select::{Select, SelectBuilder, Source};


/// Execute commands based on the parsed CLI arguments.
pub fn execute(cli: &Cli) -> Result<()> {
    execute_with_dir(cli, None)
}

/// Execute commands with an explicit working directory.
///
/// Relative paths on the command line are resolved against `working_dir`,
/// or the process's current directory when it is `None`.
pub fn execute_with_dir(cli: &Cli, working_dir: Option<&Path>) -> Result<()> {
    let quiet = cli.global_opts().quiet();
    let verbose = if quiet {
        0
    } else {
        cli.global_opts().verbose()
    };
    let logger = Logger::new(verbose, quiet);

    let current_dir = if let Some(dir) = working_dir {
        dir.to_path_buf()
    } else {
        std::env::current_dir().map_err(|source| StevedoreError::IoError {
            path: PathBuf::from("."),
            source,
        })?
    };

    match cli.command() {
        Commands::Select {
            include,
            exclude,
            default_include,
            find,
            dir,
            git,
            archive,
        } => {
            let source = match (dir, git, archive) {
                (Some(dir), _, _) => Source::Dir(resolve_path(&current_dir, dir)),
                (_, Some(repo), _) => Source::Git(resolve_path(&current_dir, repo)),
                (_, _, Some(archive)) => Source::Archive(resolve_path(&current_dir, archive)),
                (None, None, None) => {
                    return Err(StevedoreError::ConfigError {
                        message: "One of --dir, --git or --archive is required".to_string(),
                    });
                }
            };
            let mode = if *find {
                MatchMode::Find
            } else {
                MatchMode::Full
            };

            let paths = Select::builder()
                .includes(include)
                .excludes(exclude)
                .default_includes(default_include)
                .mode(mode)
                .source(source)
                .logger(logger)
                .build()?
                .run()?;
            for path in paths {
                println!("{path}");
            }
            Ok(())
        }
        Commands::Load { name, archive } => {
            let archives = resolve_all(&current_dir, archive);
            let unit = Search::builder()
                .archives(&archives)
                .config(cli.global_opts().loader_config()?)
                .logger(logger)
                .build()
                .load_unit(name)?;
            println!(
                "{}\t{}\t{}",
                unit.entry,
                unit.source.display(),
                unit.bytes.len()
            );
            Ok(())
        }
        Commands::Resources {
            name,
            archive,
            first,
        } => {
            let archives = resolve_all(&current_dir, archive);
            let resources = Search::builder()
                .archives(&archives)
                .config(cli.global_opts().loader_config()?)
                .logger(logger)
                .build()
                .resources(name, *first)?;
            if resources.is_empty() {
                logger.info(format!("No archive holds {name}"));
            }
            for resource in resources {
                println!("{}\t{}", resource.source.display(), resource.bytes.len());
            }
            Ok(())
        }
    }
}

fn resolve_all(base: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().map(|path| resolve_path(base, path)).collect()
}

/// Make `path` absolute against `base` and drop `.` and `..` components.
///
/// Symlinks are not resolved and the path need not exist.
pub(crate) fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    let absolute = if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    components.into_iter().collect()
}
