//! The standard built-ins the host hands to programs: `print`,
//! `println`, `assert`, and the three `read*` procedures. They are
//! ordinary callable values installed through `Env::register_builtin`,
//! not special cases in the evaluator.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use crate::value::{Value, value_to_string};

use super::environment::Env;
use super::error::RuntimeError;

pub fn install(env: &Env) {
    env.register_builtin("print", builtin_print);
    env.register_builtin("println", builtin_println);
    env.register_builtin("assert", builtin_assert);
    env.register_builtin("readInt", builtin_read_int);
    env.register_builtin("readReal", builtin_read_real);
    env.register_builtin("readString", builtin_read_string);
}

fn builtin_print(args: &[Value]) -> Result<Value, RuntimeError> {
    let rendered: Vec<String> = args.iter().map(value_to_string).collect();
    print!("{}", rendered.join(" "));
    io::stdout().flush().ok();
    Ok(Value::Empty)
}

fn builtin_println(args: &[Value]) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        return Err(RuntimeError::num_args(
            0,
            args.to_vec(),
            crate::diagnostic::Span::dummy(),
        ));
    }
    println!();
    io::stdout().flush().ok();
    Ok(Value::Empty)
}

fn builtin_assert(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::num_args(
            1,
            args.to_vec(),
            crate::diagnostic::Span::dummy(),
        ));
    }
    match &args[0] {
        Value::Bool(true) => Ok(Value::Empty),
        Value::Bool(false) => Err(RuntimeError::other("assertion failed")),
        other => Err(RuntimeError::type_mismatch(
            "bool",
            other.type_name(),
            crate::diagnostic::Span::dummy(),
        )),
    }
}

fn read_line() -> Result<String, RuntimeError> {
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| RuntimeError::other(format!("failed to read input: {}", e)))?;
    if read == 0 {
        return Err(RuntimeError::other("unexpected end of input"));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn builtin_read_int(_args: &[Value]) -> Result<Value, RuntimeError> {
    let line = read_line()?;
    line.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| RuntimeError::other(format!("readInt: `{}` is not an integer", line.trim())))
}

fn builtin_read_real(_args: &[Value]) -> Result<Value, RuntimeError> {
    let line = read_line()?;
    line.trim()
        .parse::<f64>()
        .map(Value::Real)
        .map_err(|_| RuntimeError::other(format!("readReal: `{}` is not a real", line.trim())))
}

fn builtin_read_string(_args: &[Value]) -> Result<Value, RuntimeError> {
    read_line().map(|line| Value::Str(Rc::from(line)))
}
