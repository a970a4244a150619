use std::env;
use std::fs;

use anyhow::Context;
use colored::Colorize;
use union_lang::{check_program, parse_program};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <source_file>", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let source = fs::read_to_string(filename)
        .with_context(|| format!("failed to read {}", filename))?;

    let program = match parse_program(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{} {}", "parse error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    match check_program(&program) {
        Ok(texp) => {
            println!("{} {}", "ok:".green().bold(), texp);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "type error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
