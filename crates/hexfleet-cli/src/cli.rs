use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hexfleet")]
#[command(version)]
#[command(about = "Runs hex-grid fleet battles headlessly.", long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Plays a battle package with every AI ship under engine control
    Run {
        /// Battle package (JSON)
        package: PathBuf,
        /// Maximum number of turns to resolve
        #[arg(short, long, default_value_t = 20)]
        turns: u32,
        /// Master seed; overrides the package's config
        #[arg(short, long)]
        seed: Option<u64>,
        /// Print the final snapshot with projected pixel positions
        #[arg(long)]
        show_state: bool,
    },
    /// Validates a battle package without playing it
    Check {
        /// Battle package (JSON)
        package: PathBuf,
    },
}
