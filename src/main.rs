use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::Ast;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::lox::{Lox, STACK_SIZE};
use rox::parser::Parser;
use rox::scanner::{self, Scanner};

/// Exit status for any reported static or runtime error.
const EXIT_DATA_ERROR: i32 = 65;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for the Lox language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print tokens as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs a script; starts an interactive prompt when no file is given
    Run { filename: Option<PathBuf> },
}

/// Maps a source file and decodes it as UTF-8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Mapping a zero-length file is an error on some platforms.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read-only and dropped before this function returns;
    // the text is copied out first.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&mmap)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);

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

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn no_input() -> ! {
    info!("No filepath provided");

    println!("No input filepath was provided. Exiting...");

    std::process::exit(0);
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    let mut tokenized = true;

    for token in Scanner::new(source) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization error: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        std::process::exit(EXIT_DATA_ERROR);
    }

    Ok(())
}

fn parse(source: &str) {
    let (tokens, errors) = scanner::scan_tokens(source);

    for e in &errors {
        eprintln!("{}", e);
    }

    match Parser::new(&tokens).parse_expression() {
        Ok(expr) if errors.is_empty() => println!("{}", Ast.print(&expr)),

        Ok(_) => std::process::exit(EXIT_DATA_ERROR),

        Err(parse_errors) => {
            for e in parse_errors {
                eprintln!("{}", e);
            }
            std::process::exit(EXIT_DATA_ERROR);
        }
    }
}

fn evaluate(source: &str) {
    let (tokens, errors) = scanner::scan_tokens(source);

    for e in &errors {
        eprintln!("{}", e);
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) if errors.is_empty() => expr,

        Ok(_) => std::process::exit(EXIT_DATA_ERROR),

        Err(parse_errors) => {
            for e in parse_errors {
                eprintln!("{}", e);
            }
            std::process::exit(EXIT_DATA_ERROR);
        }
    };

    let mut interpreter = Interpreter::new();

    if let Err(e) = interpreter.interpret_expression(&expr) {
        debug!("Evaluation error: {}", e);
        eprintln!("{}", e);
        std::process::exit(EXIT_DATA_ERROR);
    }
}

fn run_file(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;

    let mut lox = Lox::new();
    lox.run(&source);

    if lox.had_error || lox.had_runtime_error {
        debug!("Run reported errors, exiting with code {}", EXIT_DATA_ERROR);
        std::process::exit(EXIT_DATA_ERROR);
    }

    info!("Program executed successfully");
    Ok(())
}

fn run_prompt() -> Result<()> {
    info!("Starting interactive prompt");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };

        lox.run_line(&line.context("Failed to read from stdin")?);
        lox.reset_errors();
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Deep Lox recursion must hit the interpreter's call limit before the
    // native stack runs out.
    thread::Builder::new()
        .name("rox".to_string())
        .stack_size(STACK_SIZE)
        .spawn(move || run_cli(args))
        .context("Failed to spawn interpreter thread")?
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))?
}

fn run_cli(args: Cli) -> Result<()> {
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => tokenize(&read_file(&filename)?, json)?,
            None => no_input(),
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => parse(&read_file(&filename)?),
            None => no_input(),
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => evaluate(&read_file(&filename)?),
            None => no_input(),
        },

        Commands::Run { filename } => match filename {
            Some(filename) => run_file(&filename)?,
            None => run_prompt()?,
        },
    }

    Ok(())
}
