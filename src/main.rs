use clap::{Args, Parser as ClapParser, Subcommand};
use kol_lang::cli::{self, CheckOptions, CheckResult, CliError};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "kol")]
#[command(about = "kol - a grammar-driven expression language with first-class functions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a kol program and print the value of its last statement
    Run(Source),

    /// Parse and resolve a kol program without running it
    Check(Source),
}

#[derive(Args)]
struct Source {
    /// Program file (reads from stdin if not provided)
    file: Option<PathBuf>,

    /// Grammar file replacing the standard grammar
    #[arg(short, long)]
    grammar: Option<PathBuf>,

    /// JSON operator table replacing the standard operators
    #[arg(short, long)]
    operators: Option<PathBuf>,

    /// Log pipeline stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let (source, syntax_only) = match cli.command {
        Commands::Run(source) => (source, false),
        Commands::Check(source) => (source, true),
    };

    let default_filter = if source.verbose { "kol_lang=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(source, syntax_only) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(source: Source, syntax_only: bool) -> Result<(), CliError> {
    let program = match &source.file {
        Some(path) => fs::read_to_string(path)?,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        None => return Err(CliError::NoInput),
    };

    let options = CheckOptions {
        source: program,
        grammar: source.grammar.map(fs::read_to_string).transpose()?,
        operators: source.operators.map(fs::read_to_string).transpose()?,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(value) => println!("{}", value),
    }
    Ok(())
}
