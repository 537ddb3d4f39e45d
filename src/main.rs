use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ArgParser;
use tracing_subscriber::EnvFilter;

use calc::{print_tree, Interpreter, Parser, Tokenizer};

const SYNTAX_ERROR: u8 = 65;
const RUNTIME_ERROR: u8 = 70;

#[derive(ArgParser)]
#[command(version, about = "An interpreter for the calc language")]
struct Args {
    /// Program file to run; reads standard input when omitted
    file: Option<PathBuf>,
    /// Print the parse tree instead of running the program
    #[arg(long)]
    tree: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let source = match read_source(&args.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("cannot read program: {error}");
            return ExitCode::FAILURE;
        }
    };

    let tree = match Parser::new(Tokenizer::new(&source)).parse() {
        Ok(tree) => tree,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::from(SYNTAX_ERROR);
        }
    };

    if args.tree {
        print_tree(&tree);
        return ExitCode::SUCCESS;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    match Interpreter::new(stdin.lock(), stdout.lock()).run(&tree) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(RUNTIME_ERROR)
        }
    }
}

fn read_source(file: &Option<PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}
