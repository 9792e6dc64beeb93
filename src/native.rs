//! Built‑in functions bound in the global scope of every interpreter.

use log::debug;

use crate::environment::Environment;
use crate::value::{NativeFn, Value};

const NATIVES: &[(&str, usize, NativeFn)] = &[
    ("len", 1, len),
    ("push", 2, push),
    ("pop", 1, pop),
    ("clock", 0, clock),
];

/// Define every built‑in in the global scope of `env`.
pub fn install(env: &mut Environment) {
    for &(name, arity, func) in NATIVES {
        debug!("Defining native function '{}'", name);

        env.define(
            Environment::GLOBAL,
            name,
            Value::NativeFunction { name, arity, func },
        );
    }
}

fn len(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(items) => Ok(Value::Number(items.borrow().len() as f64)),
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(format!("expected an array or string, got {}", other.type_name())),
    }
}

fn push(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            items.push(args[1].clone());

            Ok(Value::Number(items.len() as f64))
        }
        other => Err(format!("expected an array, got {}", other.type_name())),
    }
}

fn pop(args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Array(items) => items
            .borrow_mut()
            .pop()
            .ok_or_else(|| "cannot pop from an empty array".to_string()),
        other => Err(format!("expected an array, got {}", other.type_name())),
    }
}

fn clock(_args: &[Value]) -> Result<Value, String> {
    let now = chrono::Utc::now();

    Ok(Value::Number(now.timestamp_millis() as f64 / 1000.0))
}
