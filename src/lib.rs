mod debug;
mod interpreter;
mod parser;

pub use debug::print_tree;
pub use interpreter::{Interpreter, RuntimeError, Value};
pub use parser::{ParseTree, Parser, SyntaxError, Tokenizer};
