use clap::{Parser, Subcommand};
use ros_diff::Policy;
use ros_diff::cli::{self, CliError, DiffOptions};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rosdiff")]
#[command(about = "Generate minimal patch scripts by diffing two export scripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the expressions which migrate OLD to NEW
    Diff {
        /// Export of the current configuration
        old: PathBuf,

        /// Export of the desired configuration
        new: PathBuf,

        /// Verbose export of the current configuration, used to avoid
        /// setting values the device already holds
        #[arg(long)]
        verbose: Option<PathBuf>,
    },

    /// Parse an export and print it in canonical form (reads from stdin
    /// if no file is provided)
    Prettify {
        file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff { old, new, verbose } => run_diff(old, new, verbose),
        Commands::Prettify { file } => run_prettify(file),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_diff(old: PathBuf, new: PathBuf, verbose: Option<PathBuf>) -> Result<(), CliError> {
    let options = DiffOptions {
        old: fs::read_to_string(old).map_err(CliError::Io)?,
        new: fs::read_to_string(new).map_err(CliError::Io)?,
        verbose: verbose
            .map(fs::read_to_string)
            .transpose()
            .map_err(CliError::Io)?,
    };

    let patch = cli::execute_diff(&options, &Policy::default())?;
    if !patch.is_empty() {
        println!("{}", patch.trim_end());
    }
    Ok(())
}

fn run_prettify(file: Option<PathBuf>) -> Result<(), CliError> {
    let source = match file {
        Some(path) => fs::read_to_string(path).map_err(CliError::Io)?,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            buffer
        }
        None => return Err(CliError::NoInput),
    };

    let rendered = cli::execute_prettify(&source)?;
    if !rendered.is_empty() {
        println!("{}", rendered.trim_end());
    }
    Ok(())
}
