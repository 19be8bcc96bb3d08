use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser as ClapParser, Subcommand};
use graft_lang::cli::{self, CliError, TransformOptions};

#[derive(ClapParser)]
#[command(name = "graft")]
#[command(about = "Graft - a data transformation language over JSON, YAML, and CSV")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a transform script against an input document
    Run {
        /// Path to the script file
        script: PathBuf,

        /// Input document file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate a script without executing it
    Check {
        /// Path to the script file
        script: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            script,
            input,
            pretty,
        } => run_transform(script, input, pretty),
        Commands::Check { script } => run_check(script),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_transform(
    script: PathBuf,
    input: Option<PathBuf>,
    pretty: bool,
) -> Result<(), CliError> {
    let script = std::fs::read_to_string(&script).map_err(CliError::Io)?;

    let input = match input {
        Some(path) => Some(std::fs::read_to_string(&path).map_err(CliError::Io)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = TransformOptions {
        script,
        input,
        pretty,
    };
    let output = cli::execute_transform(&options)?;
    println!("{}", output);
    Ok(())
}

fn run_check(script: PathBuf) -> Result<(), CliError> {
    let source = std::fs::read_to_string(&script).map_err(CliError::Io)?;
    let header = cli::execute_check(&source)?;
    println!(
        "{}: syntax is valid (input {}, output {})",
        script.display(),
        header.input,
        header.output
    );
    Ok(())
}
