//! OxiRAR CLI - read-only RAR archive utility
//!
//! Lists, extracts, prints and tests RAR archives through the system UnRAR
//! library.

mod commands;
mod utils;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{ExtractOptions, ListOptions, cmd_cat, cmd_extract, cmd_info, cmd_list, cmd_test};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use utils::resolve_password;

#[derive(Parser)]
#[command(name = "oxirar")]
#[command(author, version, about = "Read-only RAR archive utility")]
#[command(long_about = "
OxiRAR reads RAR archives: listing, extraction, integrity testing and
streaming single entries to stdout.

Examples:
  oxirar list archive.rar
  oxirar list -v archive.rar
  oxirar extract archive.rar -o out/
  oxirar extract archive.rar docs/readme.txt
  oxirar cat archive.rar notes.txt
  oxirar test -p secret archive.rar
  oxirar info archive.rar

Set RUST_LOG=debug for decoder diagnostics.
")]
struct Cli {
    #[command(flatten)]
    password: PasswordArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Password sources shared by every command.
#[derive(Args)]
struct PasswordArgs {
    /// Password for encrypted entries or headers
    #[arg(short, long, global = true, env = "OXIRAR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Prompt for the password interactively
    #[arg(long, global = true, conflicts_with = "password")]
    ask_password: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only entries matching pattern (glob syntax: *.txt, src/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Entries to extract (all if empty)
        files: Vec<String>,

        /// Include only entries matching pattern (glob syntax: *.txt, src/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Write a single entry to stdout
    Cat {
        /// Archive file to read
        archive: PathBuf,

        /// Entry name inside the archive
        entry: String,
    },

    /// Test archive integrity
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about an archive
    #[command(alias = "i")]
    Info {
        /// Archive file to inspect
        archive: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::List { verbose, .. }
            | Commands::Extract { verbose, .. }
            | Commands::Test { verbose, .. } => *verbose,
            _ => false,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli { password, command } = cli;

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "oxirar", &mut std::io::stdout());
        return Ok(());
    }
    let password = resolve_password(password.password, password.ask_password)?;

    match command {
        Commands::List {
            archive,
            verbose,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            password,
            &ListOptions {
                verbose,
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Extract {
            archive,
            output,
            files,
            include,
            exclude,
            overwrite,
            verbose,
            no_progress,
        } => cmd_extract(
            &archive,
            &output,
            password,
            &ExtractOptions {
                files: &files,
                include: &include,
                exclude: &exclude,
                overwrite,
                verbose,
                progress: !no_progress,
            },
        ),
        Commands::Cat { archive, entry } => cmd_cat(&archive, &entry, password),
        Commands::Test { archive, verbose } => cmd_test(&archive, password, verbose),
        Commands::Info { archive } => cmd_info(&archive, password),
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.command.verbose());

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
