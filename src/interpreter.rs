//! Tree‑walking evaluator.
//!
//! Statements execute for effect and report how control leaves them as a
//! [`Flow`]; `break`, `continue` and `return` travel as data through every
//! block, loop and call site instead of unwinding.  Expressions evaluate to
//! exactly one [`Value`].

use std::borrow::Cow;
use std::io::{self, BufRead, Stdout, StdinLock, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, error, info};
use memchr::memchr;

use crate::environment::{Environment, ScopeId};
use crate::error::{AxError, Result};
use crate::expr::{BinaryOp, CompareOp, Expr, UnaryOp};
use crate::native;
use crate::stmt::{Branches, FunctionDecl, Stmt};
use crate::value::{Closure, Value};

/// Nesting limit for function calls.
pub const MAX_CALL_DEPTH: usize = 200;

/// How control left a statement.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// What `interpret` does when a top‑level statement fails at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorPolicy {
    /// Stop at the first runtime error and return it.
    #[default]
    Halt,

    /// Abandon the failing statement, keep going, report everything at the end.
    #[value(name = "skip")]
    SkipStatement,
}

/// The evaluator.  Output goes to `W`; `input` statements read lines from `R`.
pub struct Interpreter<W: Write = Stdout, R: BufRead = StdinLock<'static>> {
    scopes: Environment,
    environment: ScopeId, // current scope
    output: W,
    input: R,
    policy: ErrorPolicy,
    loop_depth: usize,
    call_depth: usize,
}

impl Interpreter {
    /// Interpreter wired to the process' stdout and stdin.
    pub fn new() -> Self {
        Self::with_io(io::stdout(), io::stdin().lock())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write, R: BufRead> Interpreter<W, R> {
    /// Creates an interpreter over the given sinks and defines the built‑ins.
    pub fn with_io(output: W, input: R) -> Self {
        info!("Initializing Interpreter");

        let mut scopes = Environment::new();
        native::install(&mut scopes);

        Self {
            scopes,
            environment: Environment::GLOBAL,
            output,
            input,
            policy: ErrorPolicy::default(),
            loop_depth: 0,
            call_depth: 0,
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn input_mut(&mut self) -> &mut R {
        &mut self.input
    }

    /// Current value of a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.scopes.get(Environment::GLOBAL, name, 0).ok()
    }

    /// Number of scopes currently allocated, the global one included.
    pub fn live_scopes(&self) -> usize {
        self.scopes.live()
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let mut failures: Vec<AxError> = Vec::new();

        for stmt in statements {
            // A previous failure may have left us anywhere.
            self.environment = Environment::GLOBAL;
            self.loop_depth = 0;
            self.call_depth = 0;

            let outcome = self.execute(stmt);

            // Nothing is mid-evaluation here, so the globals are the only root.
            if self.scopes.needs_collection() {
                self.scopes.collect(&[Environment::GLOBAL]);
            }

            if let Err(e) = outcome {
                match self.policy {
                    ErrorPolicy::Halt => {
                        self.output.flush()?;
                        return Err(e);
                    }
                    ErrorPolicy::SkipStatement => {
                        error!("Skipping statement after runtime error: {}", e);
                        failures.push(e);
                    }
                }
            }
        }

        self.output.flush()?;

        match failures.len() {
            0 => {
                info!("Interpretation completed successfully");
                Ok(())
            }
            1 => Err(failures.remove(0)),
            _ => Err(AxError::Many(failures)),
        }
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                let text = value.to_string();

                self.output.write_all(expand_escapes(&text).as_bytes())?;
                debug!("Printed value: {}", text);

                Ok(Flow::Normal)
            }

            Stmt::Var {
                name,
                initializer,
                ..
            } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Number(0.0),
                };

                self.scopes.define(self.environment, name, value);
                Ok(Flow::Normal)
            }

            Stmt::Input { name, line } => {
                self.output.flush()?;

                let mut raw = String::new();
                self.input.read_line(&mut raw)?;
                let text = raw.trim_end_matches(['\n', '\r']);
                let value = Value::from_input(text);
                debug!("Input line {:?} classified as {}", text, value.type_name());

                if self.scopes.contains(self.environment, name) {
                    self.scopes.assign(self.environment, name, value, *line)?;
                } else {
                    self.scopes.define(self.environment, name, value);
                }

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope = self.scopes.push(self.environment);
                self.execute_block(statements, scope)
            }

            Stmt::Loop {
                var,
                from,
                to,
                step,
                descending,
                body,
                line,
            } => self.execute_loop(var, from, to, step.as_ref(), *descending, body, *line),

            Stmt::Break { line } => {
                if self.loop_depth == 0 {
                    return Err(AxError::LoopControlOutsideLoop {
                        keyword: "break",
                        line: *line,
                    });
                }
                Ok(Flow::Break)
            }

            Stmt::Continue { line } => {
                if self.loop_depth == 0 {
                    return Err(AxError::LoopControlOutsideLoop {
                        keyword: "continue",
                        line: *line,
                    });
                }
                Ok(Flow::Continue)
            }

            Stmt::Compare {
                op,
                left,
                right,
                branches,
                line,
            } => {
                let result = self.compare(*op, left, right, *line)?;
                debug!("{} evaluated to {}", op, result);

                self.dispatch(result, branches)
            }

            Stmt::And {
                left,
                right,
                branches,
            } => {
                if !self.evaluate(left)?.is_truthy() {
                    return self.run_else(branches);
                }
                let result = self.evaluate(right)?.is_truthy();
                self.dispatch(result, branches)
            }

            Stmt::Or {
                left,
                right,
                branches,
            } => {
                if self.evaluate(left)?.is_truthy() {
                    return self.execute(&branches.then_branch);
                }
                let result = self.evaluate(right)?.is_truthy();
                self.dispatch(result, branches)
            }

            Stmt::Not { operand, branches } => {
                let result = !self.evaluate(operand)?.is_truthy();
                self.dispatch(result, branches)
            }

            Stmt::AllOf {
                conditions,
                branches,
            } => {
                for condition in conditions {
                    if !self.evaluate(condition)?.is_truthy() {
                        return self.run_else(branches);
                    }
                }
                self.execute(&branches.then_branch)
            }

            Stmt::AnyOf {
                conditions,
                branches,
            } => {
                for condition in conditions {
                    if self.evaluate(condition)?.is_truthy() {
                        return self.execute(&branches.then_branch);
                    }
                }
                self.run_else(branches)
            }

            Stmt::Function(declaration) => {
                // When defining a function, capture the current environment as the closure.
                self.scopes.capture(self.environment);
                let function = Value::Function(Rc::new(Closure {
                    declaration: Rc::clone(declaration),
                    env: self.environment,
                }));

                self.scopes
                    .define(self.environment, &declaration.name, function);
                info!(
                    "Function '{}' defined with {} parameters",
                    declaration.name,
                    declaration.params.len()
                );

                Ok(Flow::Normal)
            }

            Stmt::Return { value, line } => {
                if self.call_depth == 0 {
                    return Err(AxError::ReturnOutsideFunction { line: *line });
                }

                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Number(0.0),
                };
                debug!("Returning value: {}", value);

                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` in `scope`, stopping at the first non‑normal flow.
    /// On every exit path the previous scope is restored and `scope` is
    /// handed back to the arena.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: ScopeId) -> Result<Flow> {
        let previous = mem::replace(&mut self.environment, scope);

        let mut outcome = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;
        self.scopes.pop(scope);
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_loop(
        &mut self,
        var: &str,
        from: &Expr,
        to: &Expr,
        step: Option<&Expr>,
        descending: bool,
        body: &Stmt,
        line: usize,
    ) -> Result<Flow> {
        let start = self.number(from, "Loop start", line)?;
        let end = self.number(to, "Loop end", line)?;
        let step = match step {
            Some(expr) => self.number(expr, "Loop step", line)?,
            None => 1.0,
        };

        if step == 0.0 {
            return Err(AxError::ZeroStep { line });
        }

        let delta = if descending { -step.abs() } else { step.abs() };
        debug!(
            "Entering loop '{}' from {} to {} by {}",
            var, start, end, delta
        );

        let scope = self.scopes.push(self.environment);
        self.scopes.define(scope, var, Value::Number(start));

        let previous = mem::replace(&mut self.environment, scope);
        self.loop_depth += 1;

        let outcome = self.run_loop(var, end, delta, descending, body, line);

        self.loop_depth -= 1;
        self.environment = previous;
        self.scopes.pop(scope);
        outcome
    }

    fn run_loop(
        &mut self,
        var: &str,
        end: f64,
        delta: f64,
        descending: bool,
        body: &Stmt,
        line: usize,
    ) -> Result<Flow> {
        loop {
            let current = self.number_binding(var, line)?;
            let finished = if descending { current < end } else { current > end };
            if finished {
                break;
            }

            match self.execute(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }

            let current = self.number_binding(var, line)?;
            self.scopes
                .assign(self.environment, var, Value::Number(current + delta), line)?;
        }

        info!("Exited loop '{}'", var);
        Ok(Flow::Normal)
    }

    /// Run `then` when `condition` holds, else walk the `elseif` chain.
    fn dispatch(&mut self, condition: bool, branches: &Branches) -> Result<Flow> {
        if condition {
            self.execute(&branches.then_branch)
        } else {
            self.run_else(branches)
        }
    }

    fn run_else(&mut self, branches: &Branches) -> Result<Flow> {
        for (condition, branch) in &branches.else_ifs {
            if self.evaluate(condition)?.is_truthy() {
                return self.execute(branch);
            }
        }

        match &branches.else_branch {
            Some(branch) => self.execute(branch),
            None => Ok(Flow::Normal),
        }
    }

    // ──────────────────────────── expressions ────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),

            Expr::Str(s) => Ok(Value::String(s.clone())),

            Expr::Bool(b) => Ok(Value::Bool(*b)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable { name, line } => self.scopes.get(self.environment, name, *line),

            Expr::Assign { name, value, line } => {
                let value = self.evaluate(value)?;
                self.scopes
                    .assign(self.environment, name, value.clone(), *line)?;
                Ok(value)
            }

            Expr::Unary { op, right, line } => {
                let right = self.evaluate(right)?;

                match (op, right) {
                    (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Negate, other) => Err(AxError::type_error(
                        *line,
                        format!("Operand of '-' must be a number, got {}.", other.type_name()),
                    )),
                    (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                op,
                right,
                line,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                binary_op(*op, left, right, *line)
            }

            Expr::Compare {
                op,
                left,
                right,
                line,
            } => self.compare(*op, left, right, *line).map(Value::Bool),

            Expr::Array { elements, .. } => {
                let items = self.evaluate_all(elements)?;
                Ok(Value::array(items))
            }

            Expr::FixedArray { size, elements, .. } => {
                let mut items = self.evaluate_all(elements)?;
                items.truncate(*size);
                items.resize(*size, Value::Number(0.0));

                Ok(Value::array(items))
            }

            Expr::Index {
                object,
                index,
                line,
            } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;

                match object {
                    Value::Array(items) => {
                        let items = items.borrow();
                        let i = array_index(&index, items.len(), *line)?;
                        Ok(items[i].clone())
                    }
                    other => Err(AxError::type_error(
                        *line,
                        format!("Only arrays can be indexed, got {}.", other.type_name()),
                    )),
                }
            }

            Expr::IndexAssign {
                object,
                index,
                value,
                line,
            } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                let value = self.evaluate(value)?;

                match object {
                    Value::Array(items) => {
                        let mut items = items.borrow_mut();
                        let i = array_index(&index, items.len(), *line)?;
                        items[i] = value.clone();
                        Ok(value)
                    }
                    _ => Err(AxError::InvalidAssignmentTarget { line: *line }),
                }
            }

            Expr::Call {
                callee,
                arguments,
                line,
            } => {
                let callee = self.evaluate(callee)?;
                let arguments = self.evaluate_all(arguments)?;

                self.call(&callee, arguments, *line)
            }
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.evaluate(expr)).collect()
    }

    fn compare(&mut self, op: CompareOp, left: &Expr, right: &Expr, line: usize) -> Result<bool> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        compare_values(op, &left, &right, line)
    }

    /// Evaluate `expr`, requiring a number; `line` is the enclosing statement's.
    fn number(&mut self, expr: &Expr, what: &str, line: usize) -> Result<f64> {
        match self.evaluate(expr)? {
            Value::Number(n) => Ok(n),
            other => Err(AxError::type_error(
                line,
                format!("{} must be a number, got {}.", what, other.type_name()),
            )),
        }
    }

    fn number_binding(&self, name: &str, line: usize) -> Result<f64> {
        match self.scopes.get(self.environment, name, line)? {
            Value::Number(n) => Ok(n),
            other => Err(AxError::type_error(
                line,
                format!("Loop variable '{}' must stay a number, found {}.", name, other.type_name()),
            )),
        }
    }

    /// Invokes a callable (native or user‑defined function).
    fn call(&mut self, callee: &Value, arguments: Vec<Value>, line: usize) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);
                check_arity(*arity, arguments.len(), line)?;

                func(&arguments).map_err(|message| AxError::Native {
                    name: name.to_string(),
                    message,
                    line,
                })
            }

            Value::Function(closure) => {
                check_arity(closure.arity(), arguments.len(), line)?;

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(AxError::CallDepthExceeded {
                        limit: MAX_CALL_DEPTH,
                        line,
                    });
                }

                self.call_function(&closure.declaration, closure.env, arguments)
            }

            _ => Err(AxError::NotCallable { line }),
        }
    }

    fn call_function(
        &mut self,
        declaration: &FunctionDecl,
        closure: ScopeId,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", declaration.name);

        // Parent is the declaring scope, not the caller's.
        let scope = self.scopes.push(closure);
        for (param, arg) in declaration.params.iter().zip(arguments) {
            self.scopes.define(scope, param, arg);
        }

        self.call_depth += 1;
        let saved_loops = mem::replace(&mut self.loop_depth, 0);

        let outcome = self.execute_block(&declaration.body, scope);

        self.loop_depth = saved_loops;
        self.call_depth -= 1;

        match outcome? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Number(0.0)),
        }
    }
}

/// Apply a binary operator to two evaluated operands.
pub fn binary_op(op: BinaryOp, left: Value, right: Value, line: usize) -> Result<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),
            (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Array(a), Value::Array(b)) => {
                let mut items: Vec<Value> = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Value::array(items))
            }
            (a, b) => Err(mismatch(op, &a, &b, line)),
        },

        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => {
            let (a, b) = match (left, right) {
                (Value::Number(a), Value::Number(b)) => (a, b),
                (a, b) => return Err(mismatch(op, &a, &b, line)),
            };

            match op {
                BinaryOp::Subtract => Ok(Value::Number(a - b)),
                BinaryOp::Multiply => Ok(Value::Number(a * b)),
                BinaryOp::Divide if b == 0.0 => Err(AxError::DivisionByZero { line }),
                BinaryOp::Divide => Ok(Value::Number(a / b)),
                BinaryOp::Modulo if b == 0.0 => Err(AxError::ModuloByZero { line }),
                _ => Ok(Value::Number(a % b)),
            }
        }

        BinaryOp::Equal => compare_values(CompareOp::Eq, &left, &right, line).map(Value::Bool),
        BinaryOp::NotEqual => {
            compare_values(CompareOp::NotEq, &left, &right, line).map(Value::Bool)
        }
        BinaryOp::Greater => compare_values(CompareOp::Gt, &left, &right, line).map(Value::Bool),
        BinaryOp::GreaterEqual => {
            compare_values(CompareOp::Ge, &left, &right, line).map(Value::Bool)
        }
        BinaryOp::Less => compare_values(CompareOp::Lt, &left, &right, line).map(Value::Bool),
        BinaryOp::LessEqual => compare_values(CompareOp::Le, &left, &right, line).map(Value::Bool),
    }
}

/// Apply an equality or relational test.  Ordering is defined for
/// number/number and string/string pairs only.
pub fn compare_values(op: CompareOp, left: &Value, right: &Value, line: usize) -> Result<bool> {
    let ordering = match op {
        CompareOp::Eq => return Ok(left.equals(right)),
        CompareOp::NotEq => return Ok(!left.equals(right)),
        _ => match (left, right) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => return Err(mismatch(op.as_binary(), left, right, line)),
        },
    };

    Ok(ordering.is_some_and(|ordering| match op {
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::NotEq => ordering.is_ne(),
    }))
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value, line: usize) -> AxError {
    AxError::type_error(
        line,
        format!(
            "Unsupported operand types for '{}': {} and {}.",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
    )
}

fn check_arity(expected: usize, got: usize, line: usize) -> Result<()> {
    if expected != got {
        return Err(AxError::ArityMismatch {
            expected,
            got,
            line,
        });
    }

    Ok(())
}

/// Numeric index truncated toward zero and bounds‑checked against `len`.
fn array_index(index: &Value, len: usize, line: usize) -> Result<usize> {
    let raw = match index {
        Value::Number(n) => n.trunc(),
        other => {
            return Err(AxError::type_error(
                line,
                format!("Array index must be a number, got {}.", other.type_name()),
            ))
        }
    };

    if !raw.is_finite() || raw < 0.0 || raw >= len as f64 {
        return Err(AxError::IndexOutOfBounds {
            index: raw,
            len,
            line,
        });
    }

    Ok(raw as usize)
}

/// Expand `\n` and `\t` escapes; everything else passes through untouched.
pub fn expand_escapes(text: &str) -> Cow<'_, str> {
    if memchr(b'\\', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    chars.next();
                    out.push('\n');
                    continue;
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                    continue;
                }
                _ => {}
            }
        }

        out.push(c);
    }

    Cow::Owned(out)
}
