#![allow(dead_code)]

use yahaha::Value;
use yahaha::interpreter::{Env, Interpreter, RuntimeError, builtins, parse_program};

/// Parse and run a program with the standard built-ins installed.
pub fn run(source: &str) -> Result<Value, RuntimeError> {
    let program = parse_program(source).expect("program should parse");
    let env = Env::new();
    builtins::install(&env);
    Interpreter::with_env(env).run(&program)
}

pub fn run_ok(source: &str) -> Value {
    match run(source) {
        Ok(value) => value,
        Err(e) => panic!("program should evaluate, got: {}", e),
    }
}

pub fn run_err(source: &str) -> RuntimeError {
    match run(source) {
        Ok(value) => panic!("program should fail, got: {:?}", value),
        Err(e) => e,
    }
}
