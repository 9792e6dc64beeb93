use std::rc::Rc;

use crate::expr::{CompareOp, Expr};

/// Branch targets shared by every branching statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Branches {
    pub then_branch: Box<Stmt>,

    /// `elseif (cond) stmt` pairs, tried in order.
    pub else_ifs: Vec<(Expr, Stmt)>,

    pub else_branch: Option<Box<Stmt>>,
}

/// A `fun` declaration.  Shared via `Rc` with every function value created
/// from it, so a body stays alive as long as some closure can run it.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    /// `var name (= initializer)?;`
    Var {
        name: String,
        initializer: Option<Expr>,
        line: usize,
    },

    /// `input name;`
    Input {
        name: String,
        line: usize,
    },

    Block(Vec<Stmt>),

    /// `loop var = from (down)? to to (step step)? body`
    Loop {
        var: String,
        from: Expr,
        to: Expr,
        step: Option<Expr>,
        descending: bool,
        body: Box<Stmt>,
        line: usize,
    },

    Break {
        line: usize,
    },

    Continue {
        line: usize,
    },

    /// One of the six comparison statements; `line` is the keyword's.
    Compare {
        op: CompareOp,
        left: Expr,
        right: Expr,
        branches: Branches,
        line: usize,
    },

    /// Two‑operand short‑circuit `and`.
    And {
        left: Expr,
        right: Expr,
        branches: Branches,
    },

    /// Two‑operand short‑circuit `or`.
    Or {
        left: Expr,
        right: Expr,
        branches: Branches,
    },

    /// Runs `then` iff the operand is falsy.
    Not {
        operand: Expr,
        branches: Branches,
    },

    /// `and { p1, p2, … }`: every condition must hold.
    AllOf {
        conditions: Vec<Expr>,
        branches: Branches,
    },

    /// `or { p1, p2, … }`: at least one condition must hold.
    AnyOf {
        conditions: Vec<Expr>,
        branches: Branches,
    },

    Function(Rc<FunctionDecl>),

    Return {
        value: Option<Expr>,
        line: usize,
    },
}
