use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use axscript::ast_printer::AstPrinter;
use axscript::interpreter::{ErrorPolicy, Interpreter};
use axscript::{parse, run, tokenize, EXIT_STATIC_ERROR};

#[derive(ClapParser, Debug)]
#[command(version, about = "AxScript language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// What to do when a statement fails at runtime
    #[arg(long, global = true, value_enum, default_value_t = ErrorPolicy::Halt)]
    on_error: ErrorPolicy,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit the token list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse { filename: PathBuf },

    /// Runs a file as an AxScript program; without a file, starts a prompt
    Run { filename: Option<PathBuf> },
}

/// Maps `filename` into memory and checks it is UTF‑8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    // SAFETY: the mapping is read-only and copied out before returning.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&map)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("axscript::").unwrap_or(module);

            writeln!(
                buf,
                "{} {:<5} [{}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn repl(policy: ErrorPolicy) -> Result<()> {
    info!("Starting interactive prompt");

    let mut interpreter = Interpreter::new().with_policy(policy);
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if interpreter.input_mut().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let report = run(&line, &mut interpreter);
        for e in report.errors() {
            eprintln!("{}", e);
        }

        // `print` adds no newline of its own.
        println!();
    }

    info!("Prompt closed");
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
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            let source = read_file(&filename)?;
            let (tokens, errors) = tokenize(&source);

            for e in &errors {
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
                );
            } else {
                for token in &tokens {
                    println!("{}", token);
                }
            }

            if !errors.is_empty() {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(EXIT_STATIC_ERROR);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");
            let source = read_file(&filename)?;
            let (tokens, lex_errors) = tokenize(&source);
            let (statements, parse_errors) = parse(&tokens);

            for e in lex_errors.iter().chain(&parse_errors) {
                debug!("Parse debug: {}", e);
                eprintln!("{}", e);
            }

            println!("{}", AstPrinter::print_program(&statements));

            if !lex_errors.is_empty() || !parse_errors.is_empty() {
                std::process::exit(EXIT_STATIC_ERROR);
            }

            info!("Parse subcommand completed");
        }

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");
                let source = read_file(&filename)?;
                info!("Provided input:\n {}", source);

                let mut interpreter = Interpreter::new().with_policy(args.on_error);
                let report = run(&source, &mut interpreter);
                drop(interpreter);

                for e in report.errors() {
                    debug!("Run debug: {}", e);
                    eprintln!("{}", e);
                }

                let code = report.exit_code();
                if code != 0 {
                    std::process::exit(code);
                }

                info!("Program executed successfully");
            }

            None => repl(args.on_error)?,
        },
    }

    Ok(())
}
