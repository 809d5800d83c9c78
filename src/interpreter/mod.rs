pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use environment::Env;
pub use error::RuntimeError;
pub use evaluator::{Interpreter, exec, parse_and_run, parse_and_run_with_diagnostics};
pub use parser::{ParseError, TokenParser, parse_program};
