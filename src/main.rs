//! # stevedore CLI
//!
//! Selects paths with Ant-style globs and resolves units and resources from
//! lazily opened archives.
//!
//! ## Commands
//!
//! - **select**: Print the paths of a directory, Git index, or archive that
//!   match include globs and no exclude glob
//! - **load**: Resolve a unit like `org.example.Widget` against archives
//! - **resources**: List every archive holding a resource
//!
//! ## Quick Start
//!
//! ```bash
//! stevedore select --git . -i '**/*.java' -e '**/Test*.java'
//! stevedore load org.example.Widget -a lib/a.jar -a lib/b.jar
//! stevedore resources META-INF/MANIFEST.MF -a lib/a.jar -a lib/b.jar
//! ```
//!
//! ## Environment Variables
//!
//! - `STEVEDORE_VERBOSE`: Enable verbose output
//! - `STEVEDORE_QUIET`: Silence all output except errors
//! - `STEVEDORE_IDLE_THRESHOLD`: Close archives idle for longer than this
//! - `STEVEDORE_AUTOPURGE_INTERVAL`: Purge idle archives in the background

use std::io::IsTerminal;

use clap::Parser;
use stevedore::cli::Cli;

fn main() -> miette::Result<()> {
    // Install miette's fancy panic and error report handler
    miette::set_panic_hook();

    // Plain output when stderr is not a terminal (CI, logs, etc.)
    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let cli = Cli::parse();

    stevedore::commands::execute(&cli).map_err(Into::into)
}
