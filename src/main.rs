use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::driver::{Lox, Status};
use rox::error::Reporter;
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};
use rox::token::Token;

const EXIT_COMPILE_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;
const EXIT_IO_ERROR: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to rox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints it back
    Parse { filename: PathBuf },

    /// Runs a Lox program, or starts the REPL when no file is given
    Run { filename: Option<PathBuf> },

    /// Starts the interactive prompt
    Repl,
}

/// Maps the script into memory and copies it out as UTF-8 text.
fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file: File =
        File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    let len: u64 = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", filename))?
        .len();

    // mapping a zero-length file fails on some platforms
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read-only and dropped before this function returns.
    let mmap: Mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let text: &str = std::str::from_utf8(&mmap)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", len, filename);

    Ok(text.to_owned())
}

fn read_or_exit(filename: &Path) -> String {
    match read_source(filename) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(EXIT_IO_ERROR);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file: File = File::create("rox.log").context("Failed to create rox.log")?;

    Builder::new()
        .format(|buf, record| {
            let module: &str = record.module_path().unwrap_or("<unnamed>");
            let module: &str = module.strip_prefix("rox::").unwrap_or(module);

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

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source: String = read_or_exit(filename);

    if json {
        let mut reporter: Reporter = Reporter::echoing();
        let tokens: Vec<Token> = scan_tokens(&source, &mut reporter);

        println!("{}", serde_json::to_string_pretty(&tokens)?);

        if reporter.had_error() {
            process::exit(EXIT_COMPILE_ERROR);
        }

        return Ok(());
    }

    let mut tokenized: bool = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                println!("{}", token);
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_COMPILE_ERROR);
        process::exit(EXIT_COMPILE_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source: String = read_or_exit(filename);
    let mut reporter: Reporter = Reporter::echoing();

    let tokens: Vec<Token> = scan_tokens(&source, &mut reporter);
    let expr = Parser::new(&tokens, &mut reporter).parse_expression();

    match expr {
        Some(expr) if !reporter.had_error() => {
            let printed: String = AstPrinter::print(&expr);

            debug!("AST: {}", printed);
            println!("{}", printed);
        }

        _ => process::exit(EXIT_COMPILE_ERROR),
    }

    Ok(())
}

fn run_file(filename: &Path) -> Result<()> {
    let source: String = read_or_exit(filename);
    let mut lox: Lox = Lox::new(false);

    match lox.run(&source) {
        Status::Ok => Ok(()),
        Status::CompileError => process::exit(EXIT_COMPILE_ERROR),
        Status::RuntimeError => process::exit(EXIT_RUNTIME_ERROR),
    }
}

/// Reads one line at a time; `.q` or end of input leaves.  Each line gets
/// fresh error flags, globals carry over.
fn run_prompt() -> Result<()> {
    info!("Starting REPL");

    let mut lox: Lox = Lox::new(true);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };

        let line: String = line.context("Failed to read from stdin")?;
        let line: &str = line.trim();

        if line == ".q" {
            break;
        }

        if line.is_empty() {
            continue;
        }

        let status: Status = lox.run(line);
        debug!("REPL line finished with {:?}", status);
    }

    info!("Leaving REPL");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),

        Commands::Parse { filename } => parse(&filename),

        Commands::Run {
            filename: Some(filename),
        } => run_file(&filename),

        Commands::Run { filename: None } | Commands::Repl => run_prompt(),
    }
}
