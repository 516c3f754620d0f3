//! Odesza CLI
//!
//! Usage:
//!   odesza [OPTIONS] [FILE] [KEY=VALUE]...
//!
//! Renders a template file (or a template body piped on stdin) against a
//! variable scope built from `key=value` arguments and an optional TOML
//! vars file.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use odesza::{cache, render, render_file, Scope, Value};

#[derive(Parser)]
#[command(name = "odesza")]
#[command(about = "Compiles odesza templates")]
struct Cli {
    /// Template file (reads the template body from stdin if not provided)
    input: Option<String>,

    /// Scope variables as key=value pairs
    vars: Vec<String>,

    /// TOML file providing scope variables (key=value arguments override it)
    #[arg(short = 'V', long = "vars")]
    vars_file: Option<PathBuf>,

    /// Output file (stdout if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable the path and content caches
    #[arg(long)]
    no_cache: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.no_cache {
        cache::set_enabled(false);
    }

    let mut scope = Scope::new();

    if let Some(path) = &cli.vars_file {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error reading vars file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        };
        let parsed: Scope = match toml::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("Error parsing vars file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        };
        scope.extend(parsed);
    }

    for pair in &cli.vars {
        match pair.split_once('=') {
            Some((key, value)) => {
                scope.insert(key.to_string(), Value::from(value));
            }
            None => {
                eprintln!("Error: variable '{}' is not of the form key=value", pair);
                std::process::exit(1);
            }
        }
    }

    let result = match &cli.input {
        Some(reference) => render_file(reference, &scope),
        None => {
            if io::stdin().is_terminal() {
                eprintln!("Error: no template file given and stdin is a terminal");
                std::process::exit(1);
            }
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading from stdin: {}", e);
                std::process::exit(1);
            }
            render(&buffer, &scope)
        }
    };

    match result {
        Ok(text) => match &cli.output {
            Some(path) => {
                if let Err(e) = fs::write(path, &text) {
                    eprintln!("Error writing '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            }
            None => println!("{}", text),
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            if let odesza::RenderError::Evaluation(cause) = &e {
                eprintln!("  {}", cause);
            }
            std::process::exit(1);
        }
    }
}
