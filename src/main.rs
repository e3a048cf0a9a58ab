use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast::{NodeIds, Stmt};
use rox::ast_printer::AstPrinter;
use rox::host::ConsoleHost;
use rox::lox::{Lox, RunStatus};
use rox::parser::Parser;
use rox::scanner::scan_tokens;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Rox language interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to run; starts an interactive prompt when omitted
    scripts: Vec<PathBuf>,

    /// Enable logging to rox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints the AST of each expression statement
    Parse { filename: PathBuf },
}

/// Reads the contents of a file into a String
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rox.log").context("Failed to create rox.log")?;

    // Module path without the crate prefix, plus source line.
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to rox.log");
    Ok(())
}

fn run_file(path: &Path) -> Result<()> {
    info!("Running script {:?}", path);
    let source = read_file(path)?;

    let mut lox = Lox::new(Box::new(ConsoleHost));
    let status = lox.run(&source);

    debug!("Script finished with {:?}", status);

    if status != RunStatus::Ok {
        std::process::exit(status.exit_code());
    }

    Ok(())
}

fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");

    let mut lox = Lox::new(Box::new(ConsoleHost));
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        let source = line.trim_end_matches(['\n', '\r']);
        if read == 0 || source.is_empty() {
            break;
        }

        // Errors are per line; the session keeps its globals.
        let status = lox.run(source);
        debug!("Line finished with {:?}", status);
    }

    info!("Interactive prompt closed");
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let (tokens, errors) = scan_tokens(&source);

    for e in &errors {
        debug!("Tokenization debug: {}", e);
        eprintln!("{}", e);
    }

    if json {
        let out = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", out);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;
    let (tokens, scan_errors) = scan_tokens(&source);

    for e in &scan_errors {
        eprintln!("{}", e);
    }

    let mut ids = NodeIds::new();
    match Parser::new(tokens, &mut ids).parse() {
        Ok(statements) => {
            for stmt in &statements {
                if let Stmt::Expression(expr) = stmt {
                    let ast_str = AstPrinter::print(expr);
                    debug!("AST: {}", ast_str);
                    println!("{}", ast_str);
                }
            }
        }

        Err(errors) => {
            for e in &errors {
                debug!("Parse debug: {}", e);
                eprintln!("{}", e);
            }
            std::process::exit(65);
        }
    }

    if !scan_errors.is_empty() {
        std::process::exit(65);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    }

    info!("CLI arguments: {:?}", args);

    match args.command {
        Some(Commands::Tokenize { filename, json }) => tokenize(&filename, json),

        Some(Commands::Parse { filename }) => parse(&filename),

        None => match args.scripts.as_slice() {
            [] => run_prompt(),
            [script] => run_file(script),
            _ => {
                println!("Usage: rox [script]");
                std::process::exit(64);
            }
        },
    }
}
