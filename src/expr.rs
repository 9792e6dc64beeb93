use std::fmt;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Negate,
    /// `!x`
    Not,
}

/// Infix operators of generic expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
        }
    }
}

/// The predicate of a comparison statement (`compeq`, `compneq`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CompareOp {
    /// Source keyword introducing this comparison.
    pub fn keyword(self) -> &'static str {
        match self {
            CompareOp::Eq => "compeq",
            CompareOp::NotEq => "compneq",
            CompareOp::Ge => "compge",
            CompareOp::Le => "comple",
            CompareOp::Gt => "compg",
            CompareOp::Lt => "compl",
        }
    }

    /// The generic operator with the same meaning.
    pub fn as_binary(self) -> BinaryOp {
        match self {
            CompareOp::Eq => BinaryOp::Equal,
            CompareOp::NotEq => BinaryOp::NotEqual,
            CompareOp::Ge => BinaryOp::GreaterEqual,
            CompareOp::Le => BinaryOp::LessEqual,
            CompareOp::Gt => BinaryOp::Greater,
            CompareOp::Lt => BinaryOp::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// **Abstract‑Syntax‑Tree node** for every kind of *expression*.
///
/// Nodes own their data (names are copied out of the tokens) so a parsed
/// program outlives the source buffer it was scanned from.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),

    Str(String),

    Bool(bool),

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Variable {
        name: String,
        line: usize,
    },

    /// `name = value`
    Assign {
        name: String,
        value: Box<Expr>,
        line: usize,
    },

    Unary {
        op: UnaryOp,
        right: Box<Expr>,
        line: usize,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// `compeq(a, b)` and friends used as a predicate.  Kept apart from
    /// [`Expr::Binary`] so comparison statements can fold them.
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },

    /// `[e1, e2, …]`
    Array {
        elements: Vec<Expr>,
        line: usize,
    },

    /// `{ e1, e2, … }` with a declared capacity; padded/truncated at runtime.
    FixedArray {
        size: usize,
        elements: Vec<Expr>,
        line: usize,
    },

    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        line: usize,
    },

    /// `object[index] = value`
    IndexAssign {
        object: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
        line: usize,
    },

    /// `callee(arguments…)`; `line` is that of the closing paren.
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        line: usize,
    },
}
