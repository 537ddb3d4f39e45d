mod ast;
mod error;
mod grammar;
mod locations;
pub mod tokenizer;

pub use ast::{Operator, ParseTree};
pub use error::SyntaxError;
pub use grammar::Parser;
pub use locations::Location;
pub use tokenizer::{Number, TokenType, Tokenizer};

#[cfg(test)]
mod test;
