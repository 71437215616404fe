//! clens command-line driver
//!
//! Reads a C source file and prints the output of one pipeline stage.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use clens::feedback;
use clens::{check_syntax, flowchart, parse, render, tokenize, SemanticAnalyzer};

/// clens - inspect a small C subset
#[derive(Parser, Debug)]
#[command(name = "clens")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Tokenize, check, analyze and pretty-print a small C subset")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show tokens grouped by kind
    Tokens {
        /// Input source file
        input: PathBuf,

        /// Print the token list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the line-based syntax pre-check
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print the syntax tree as JSON
    Ast {
        /// Input source file
        input: PathBuf,
    },
    /// Run semantic analysis and print the report
    Analyze {
        /// Input source file
        input: PathBuf,

        /// Print the analysis result as JSON
        #[arg(long)]
        json: bool,

        /// Analyze even when the syntax pre-check reports issues
        #[arg(long)]
        skip_precheck: bool,
    },
    /// Regenerate readable pseudocode from the syntax tree
    Pseudo {
        /// Input source file
        input: PathBuf,
    },
    /// Print a Graphviz flowchart of every function
    Flow {
        /// Input source file
        input: PathBuf,
    },
}

fn read_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Error reading file: {}", path.display()))?;
    info!("Read {} bytes from {}", source.len(), path.display());
    Ok(source)
}

/// Run one subcommand; `Ok(false)` means the input had problems
fn run(command: &Commands) -> Result<bool> {
    match command {
        Commands::Tokens { input, json } => {
            let tokens = tokenize(&read_source(input)?);
            if *json {
                println!("{}", feedback::to_json(&tokens)?);
            } else {
                print!("{}", feedback::format_token_groups(&feedback::group_tokens(&tokens)));
            }
            Ok(true)
        }
        Commands::Check { input } => {
            let issues = check_syntax(&read_source(input)?);
            if issues.is_empty() {
                println!("No syntax issues found.");
                return Ok(true);
            }
            println!("{}", feedback::format_syntax_issues(&issues));
            Ok(false)
        }
        Commands::Ast { input } => {
            let program = parse(&tokenize(&read_source(input)?)).context("Parse error")?;
            println!("{}", feedback::to_json(&program)?);
            Ok(true)
        }
        Commands::Analyze { input, json, skip_precheck } => {
            let source = read_source(input)?;

            if !skip_precheck {
                let issues = check_syntax(&source);
                if !issues.is_empty() {
                    println!("{}", feedback::format_syntax_issues(&issues));
                    return Ok(false);
                }
            }

            let program = parse(&tokenize(&source)).context("Parse error")?;
            let result = SemanticAnalyzer::new().analyze(&program);
            if *json {
                println!("{}", feedback::to_json(&result)?);
            } else {
                print!("{}", feedback::format_report(&result));
            }
            Ok(result.is_valid)
        }
        Commands::Pseudo { input } => {
            let program = parse(&tokenize(&read_source(input)?)).context("Parse error")?;
            println!("{}", render(&program));
            Ok(true)
        }
        Commands::Flow { input } => {
            let program = parse(&tokenize(&read_source(input)?)).context("Parse error")?;
            println!("{}", flowchart(&program));
            Ok(true)
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match run(&cli.command) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
