use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::ScopeId;
use crate::stmt::FunctionDecl;

/// Signature of a built‑in function.  Errors are plain messages; the
/// evaluator attaches the call site.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// A user function together with the scope it was declared in.
#[derive(Debug)]
pub struct Closure {
    pub declaration: Rc<FunctionDecl>,
    pub env: ScopeId,
}

impl Closure {
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

type ArrayPtr = *const RefCell<Vec<Value>>;

/// Runtime value.  Arrays and functions are reference types: cloning a
/// `Value` aliases them.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Closure>),
    NativeFunction {
        name: &'static str,
        arity: usize,
        func: NativeFn,
    },
}

impl Value {
    /// Wrap `items` in a freshly allocated array.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Array(_) => "array",
            Value::Function(_) | Value::NativeFunction { .. } => "function",
        }
    }

    /// boolean → itself, number → non‑zero, string/array → non‑empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Function(_) | Value::NativeFunction { .. } => true,
        }
    }

    /// Structural equality.  Values of different runtime types are never
    /// equal; arrays compare by length, then element‑wise.  Arrays that
    /// contain themselves compare equal when their shapes match.
    pub fn equals(&self, other: &Value) -> bool {
        equals_guarded(self, other, &mut Vec::new())
    }

    /// Classify one line of external input: number, then `true`/`false`,
    /// then a bracketed list whose items are classified independently,
    /// else the whole line as a string.
    pub fn from_input(line: &str) -> Value {
        let trimmed = line.trim();

        if let Some(n) = parse_number(trimmed) {
            return Value::Number(n);
        }

        if let Some(b) = parse_bool(trimmed) {
            return Value::Bool(b);
        }

        if let Some(inner) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let inner = inner.trim();

            if inner.is_empty() {
                return Value::array(Vec::new());
            }

            let items = inner
                .split(',')
                .map(str::trim)
                .map(|item| {
                    parse_bool(item)
                        .map(Value::Bool)
                        .or_else(|| parse_number(item).map(Value::Number))
                        .unwrap_or_else(|| Value::String(item.to_string()))
                })
                .collect();

            return Value::array(items);
        }

        Value::String(line.to_string())
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Plain decimal numbers only; `inf`, `NaN` and friends stay strings.
fn parse_number(text: &str) -> Option<f64> {
    let looks_numeric = !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && text.bytes().any(|b| b.is_ascii_digit());

    if !looks_numeric {
        return None;
    }

    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn equals_guarded(a: &Value, b: &Value, visiting: &mut Vec<(ArrayPtr, ArrayPtr)>) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }

            let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
            if visiting.contains(&pair) {
                return true;
            }

            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return false;
            }

            visiting.push(pair);
            let equal = a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| equals_guarded(x, y, visiting));
            visiting.pop();

            equal
        }
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::NativeFunction { name: a, .. }, Value::NativeFunction { name: b, .. }) => a == b,
        _ => false,
    }
}

/// Writes `value`, printing an array already being written as `[...]`.
fn write_guarded(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    open: &mut Vec<ArrayPtr>,
) -> fmt::Result {
    match value {
        Value::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                let mut buf = itoa::Buffer::new();
                f.write_str(buf.format(*n as i64))
            } else {
                write!(f, "{}", n)
            }
        }

        Value::String(s) => f.write_str(s),

        Value::Bool(b) => write!(f, "{}", b),

        Value::Array(items) => {
            let ptr = Rc::as_ptr(items);
            if open.contains(&ptr) {
                return f.write_str("[...]");
            }

            open.push(ptr);
            f.write_str("[")?;

            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }

                write_guarded(f, item, open)?;
            }

            open.pop();
            f.write_str("]")
        }

        Value::Function(closure) => write!(f, "<fn {}>", closure.declaration.name),

        Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_guarded(f, self, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Function(closure) => write!(f, "Function({:?})", closure),
            other => write!(f, "{}({})", other.type_name(), other),
        }
    }
}
