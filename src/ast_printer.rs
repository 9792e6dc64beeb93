use crate::expr::{Expr, UnaryOp};
use crate::stmt::{Branches, Stmt};
use crate::value::Value;

/// Renders a parsed program in parenthesised prefix form, one top-level
/// statement per line.  Used by the `parse` subcommand.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var {
                name, initializer, ..
            } => match initializer {
                Some(init) => format!("(var {} {})", name, Self::print(init)),
                None => format!("(var {})", name),
            },

            Stmt::Input { name, .. } => format!("(input {})", name),

            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                for stmt in statements {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(stmt));
                }
                s.push(')');
                s
            }

            Stmt::Loop {
                var,
                from,
                to,
                step,
                descending,
                body,
                ..
            } => {
                let mut s = format!(
                    "(loop {} {} {} {}",
                    var,
                    Self::print(from),
                    if *descending { "down" } else { "to" },
                    Self::print(to)
                );
                if let Some(step) = step {
                    s.push_str(" step ");
                    s.push_str(&Self::print(step));
                }
                s.push(' ');
                s.push_str(&Self::print_stmt(body));
                s.push(')');
                s
            }

            Stmt::Break { .. } => "(break)".into(),

            Stmt::Continue { .. } => "(continue)".into(),

            Stmt::Compare {
                op,
                left,
                right,
                branches,
                ..
            } => format!(
                "({} {} {}{})",
                op,
                Self::print(left),
                Self::print(right),
                Self::print_branches(branches)
            ),

            Stmt::And {
                left,
                right,
                branches,
            } => format!(
                "(and {} {}{})",
                Self::print(left),
                Self::print(right),
                Self::print_branches(branches)
            ),

            Stmt::Or {
                left,
                right,
                branches,
            } => format!(
                "(or {} {}{})",
                Self::print(left),
                Self::print(right),
                Self::print_branches(branches)
            ),

            Stmt::Not { operand, branches } => {
                format!("(not {}{})", Self::print(operand), Self::print_branches(branches))
            }

            Stmt::AllOf {
                conditions,
                branches,
            } => format!(
                "(all {}{})",
                Self::join(conditions),
                Self::print_branches(branches)
            ),

            Stmt::AnyOf {
                conditions,
                branches,
            } => format!(
                "(any {}{})",
                Self::join(conditions),
                Self::print_branches(branches)
            ),

            Stmt::Function(decl) => {
                let mut s = format!("(fun {} ({})", decl.name, decl.params.join(" "));
                for stmt in &decl.body {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(stmt));
                }
                s.push(')');
                s
            }

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },
        }
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Number(n) => Value::Number(*n).to_string(),

            Expr::Str(s) => format!("{:?}", s),

            Expr::Bool(b) => b.to_string(),

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { op, right, .. } => {
                let symbol = match op {
                    UnaryOp::Negate => "-",
                    UnaryOp::Not => "!",
                };
                format!("({} {})", symbol, Self::print(right))
            }

            Expr::Binary {
                left, op, right, ..
            } => format!(
                "({} {} {})",
                op.symbol(),
                Self::print(left),
                Self::print(right)
            ),

            Expr::Compare {
                op, left, right, ..
            } => format!("({} {} {})", op, Self::print(left), Self::print(right)),

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.clone(),

            Expr::Assign { name, value, .. } => format!("(= {} {})", name, Self::print(value)),

            // ── arrays ──────────────────────────────────────────────────
            Expr::Array { elements, .. } => format!("[{}]", Self::join(elements)),

            Expr::FixedArray { size, elements, .. } => {
                format!("(array {} [{}])", size, Self::join(elements))
            }

            Expr::Index { object, index, .. } => {
                format!("(index {} {})", Self::print(object), Self::print(index))
            }

            Expr::IndexAssign {
                object,
                index,
                value,
                ..
            } => format!(
                "(= (index {} {}) {})",
                Self::print(object),
                Self::print(index),
                Self::print(value)
            ),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }
        }
    }

    fn join(exprs: &[Expr]) -> String {
        exprs.iter().map(Self::print).collect::<Vec<_>>().join(" ")
    }

    fn print_branches(branches: &Branches) -> String {
        let mut s = format!(" (then {})", Self::print_stmt(&branches.then_branch));

        for (condition, branch) in &branches.else_ifs {
            s.push_str(&format!(
                " (elseif {} {})",
                Self::print(condition),
                Self::print_stmt(branch)
            ));
        }

        if let Some(branch) = &branches.else_branch {
            s.push_str(&format!(" (else {})", Self::print_stmt(branch)));
        }

        s
    }
}
