use std::{fs, process::ExitCode};

use clap::Parser;
use spinel::execute;

/// spinel runs programs written in a small Ruby-flavored teaching language
/// and prints their output, optionally grading it against an expected
/// transcript.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells spinel to read the program from a file instead of the command
    /// line.
    #[arg(short, long)]
    file: bool,

    /// Compares the program output byte-for-byte against the contents of
    /// this file and reports pass or fail.
    #[arg(short, long)]
    expect: Option<String>,

    contents: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let script = if args.file {
        match fs::read_to_string(&args.contents) {
            Ok(script) => script,
            Err(_) => {
                eprintln!(
                    "Failed to read the input file '{}'. Perhaps this file does not exist?",
                    &args.contents
                );
                return ExitCode::FAILURE;
            },
        }
    } else {
        args.contents
    };

    let output = match execute(&script) {
        Ok(output) => output,
        Err(e) => {
            // Show whatever the program printed before it failed, then the
            // error itself.
            print!("{}", e.output);
            eprintln!("{e}");
            return ExitCode::FAILURE;
        },
    };

    match args.expect {
        None => {
            print!("{output}");
            ExitCode::SUCCESS
        },
        Some(path) => {
            let expected = match fs::read_to_string(&path) {
                Ok(expected) => expected,
                Err(_) => {
                    eprintln!("Failed to read the expected-output file '{path}'.");
                    return ExitCode::FAILURE;
                },
            };
            if output == expected {
                println!("pass");
                ExitCode::SUCCESS
            } else {
                println!("fail");
                println!("--- expected ---");
                print!("{expected}");
                println!("--- actual ---");
                print!("{output}");
                ExitCode::FAILURE
            }
        },
    }
}
