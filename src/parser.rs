/*!
Recursive‑descent parser for AxScript.

The parser walks a borrowed token slice with one token of lookahead and
produces owned [`Stmt`] nodes.  It is also an [`Iterator`] yielding one
top‑level declaration (or one error) at a time: after an error it discards
tokens up to the next statement boundary and carries on, so one malformed
statement never hides its siblings.

Grammar (condensed)
-------------------

```text
program      → declaration* EOF ;
declaration  → funDecl | varDecl | statement ;
funDecl      → "fun" IDENT "(" parameters? ")" "{" declaration* "}" ;
varDecl      → "var" IDENT ( "[" NUMBER "]" ( "=" "{" arguments? "}" )?
                           | ( "=" expression )? ) ";" ;
statement    → printStmt | inputStmt | loopStmt | breakStmt | continueStmt
             | returnStmt | compStmt | logicStmt | notStmt | block | exprStmt ;
loopStmt     → "loop" IDENT "=" expression "down"? "to" expression
               ( "step" expression )? statement ;
compStmt     → COMP "(" expression "," expression ")"
               ( ( "and" | "or" ) predicate )? statement elseTail ;
logicStmt    → ( "and" | "or" ) ( "(" expression "," expression ")"
                                | "{" predicate ( "," predicate )* "}" )
               statement elseTail ;
notStmt      → "not" "(" expression ")" statement elseTail ;
predicate    → COMP "(" expression "," expression ")"
             | "not" "(" expression ")" | "(" expression ")" ;
elseTail     → ( "elseif" "(" expression ")" statement )* ( "else" statement )? ;
expression   → assignment ;
assignment   → target "=" ( assignment | "{" arguments? "}" ) | equality ;
equality     → comparison ( ( "!=" | "==" ) comparison )* ;
comparison   → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term         → factor ( ( "-" | "+" ) factor )* ;
factor       → unary ( ( "/" | "*" | "%" ) unary )* ;
unary        → ( "!" | "-" ) unary | call ;
call         → primary ( "(" arguments? ")" | "[" expression "]" )* ;
primary      → NUMBER | STRING | "true" | "false" | IDENT
             | "(" expression ")" | "[" arguments? "]" ;
```

The `{ … }` initializer after `=` is only accepted when the target is
`name[N]` with a literal size `N`; it builds a fixed‑size array.
*/

use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::{AxError, Result};
use crate::expr::{BinaryOp, CompareOp, Expr, UnaryOp};
use crate::stmt::{Branches, FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Upper bound on parameters and call arguments.
const MAX_ARGS: usize = 255;

/// Largest declared size of a fixed‑size array.
pub const MAX_ARRAY_SIZE: usize = 1 << 20;

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    current: usize,
    pending: VecDeque<AxError>, // errors recovered from inside blocks
    depth: usize,               // block nesting
}

impl<'t, 'a> Parser<'t, 'a> {
    /// Construct a new parser.  `tokens` should end with an `EOF` token;
    /// a missing one is tolerated.
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            pending: VecDeque::new(),
            depth: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse the whole program, collecting every statement that parsed and
    /// every error that was reported along the way.
    pub fn parse(&mut self) -> (Vec<Stmt>, Vec<AxError>) {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();
        let mut errors: Vec<AxError> = Vec::new();

        for result in self.by_ref() {
            match result {
                Ok(stmt) => statements.push(stmt),
                Err(e) => errors.push(e),
            }
        }

        info!(
            "Parsed {} statements with {} errors",
            statements.len(),
            errors.len()
        );

        (statements, errors)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<Stmt> {
        debug!("Entering declaration at {:?}", self.peek().token_type);

        let result = if self.matches(TokenType::FUN) {
            self.function()
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        if result.is_err() {
            self.synchronize();
        }

        result
    }

    fn function(&mut self) -> Result<Stmt> {
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "Expected function name.")?;
        let (name, line) = (name.lexeme.to_string(), name.line);

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name.")?;

        let mut params: Vec<String> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(AxError::parse(
                        self.peek().line,
                        "Cannot have more than 255 parameters.",
                    ));
                }

                let param = self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?;
                params.push(param.lexeme.to_string());

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters.")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body.")?;
        let body = self.block()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body,
            line,
        })))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "Expected variable name.")?;
        let (name, line) = (name.lexeme.to_string(), name.line);

        let initializer: Option<Expr> = if self.matches(TokenType::LEFT_BRACKET) {
            // var name[N] (= { … })? ;
            let size = self.array_size()?;
            self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after array size.")?;

            let elements = if self.matches(TokenType::EQUAL) {
                self.consume(TokenType::LEFT_BRACE, "Expected '{' to start array initializer.")?;
                self.brace_initializer()?
            } else {
                Vec::new()
            };

            Some(Expr::FixedArray {
                size,
                elements,
                line,
            })
        } else if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration.",
        )?;

        Ok(Stmt::Var {
            name,
            initializer,
            line,
        })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::INPUT) {
            self.input_statement()
        } else if self.matches(TokenType::LOOP) {
            self.loop_statement()
        } else if self.matches(TokenType::BREAK) {
            let line = self.previous().line;
            self.consume(TokenType::SEMICOLON, "Expected ';' after 'break'.")?;
            Ok(Stmt::Break { line })
        } else if self.matches(TokenType::CONTINUE) {
            let line = self.previous().line;
            self.consume(TokenType::SEMICOLON, "Expected ';' after 'continue'.")?;
            Ok(Stmt::Continue { line })
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if let Some(op) = self.match_compare() {
            self.compare_statement(op)
        } else if self.matches(TokenType::AND) {
            self.logic_statement(true)
        } else if self.matches(TokenType::OR) {
            self.logic_statement(false)
        } else if self.matches(TokenType::NOT) {
            self.not_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn input_statement(&mut self) -> Result<Stmt> {
        let name = self.consume(TokenType::IDENTIFIER, "Expected variable name after 'input'.")?;
        let (name, line) = (name.lexeme.to_string(), name.line);

        self.consume(TokenType::SEMICOLON, "Expected ';' after input target.")?;

        Ok(Stmt::Input { name, line })
    }

    fn loop_statement(&mut self) -> Result<Stmt> {
        let var = self.consume(TokenType::IDENTIFIER, "Expected loop variable after 'loop'.")?;
        let (var, line) = (var.lexeme.to_string(), var.line);

        self.consume(TokenType::EQUAL, "Expected '=' after loop variable.")?;
        let from = self.expression()?;

        let descending = self.matches(TokenType::DOWN);
        self.consume(TokenType::TO, "Expected 'to' after loop start.")?;
        let to = self.expression()?;

        let step = if self.matches(TokenType::STEP) {
            Some(self.expression()?)
        } else {
            None
        };

        let body = Box::new(self.statement()?);

        Ok(Stmt::Loop {
            var,
            from,
            to,
            step,
            descending,
            body,
            line,
        })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let line = self.previous().line;
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value.")?;

        Ok(Stmt::Return { value, line })
    }

    /// `COMP (a, b) [and|or predicate] then elseTail`.  A trailing `and`/`or`
    /// folds a second predicate in, producing an AND/OR statement.
    fn compare_statement(&mut self, op: CompareOp) -> Result<Stmt> {
        let keyword_line = self.previous().line;
        let (left, right) = self.operand_pair(op.keyword())?;

        if self.matches(TokenType::AND) || self.matches(TokenType::OR) {
            let is_and = self.previous().token_type == TokenType::AND;
            let line = self.previous().line;
            debug!("Folding second predicate into {} ({})", op, if is_and { "and" } else { "or" });

            let first = Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            };
            let second = self.predicate()?;
            let branches = self.branches()?;

            return Ok(if is_and {
                Stmt::And {
                    left: first,
                    right: second,
                    branches,
                }
            } else {
                Stmt::Or {
                    left: first,
                    right: second,
                    branches,
                }
            });
        }

        let branches = self.branches()?;

        Ok(Stmt::Compare {
            op,
            left,
            right,
            branches,
            line: keyword_line,
        })
    }

    /// Bare `and(a, b)` / `or(a, b)` or the multi‑condition `and { … }` form.
    fn logic_statement(&mut self, is_and: bool) -> Result<Stmt> {
        let keyword = if is_and { "and" } else { "or" };

        if self.matches(TokenType::LEFT_BRACE) {
            let mut conditions: Vec<Expr> = vec![self.predicate()?];

            while self.matches(TokenType::COMMA) {
                if self.check(TokenType::RIGHT_BRACE) {
                    break;
                }
                conditions.push(self.predicate()?);
            }

            self.consume(TokenType::RIGHT_BRACE, "Expected '}' after conditions.")?;
            let branches = self.branches()?;

            return Ok(if is_and {
                Stmt::AllOf {
                    conditions,
                    branches,
                }
            } else {
                Stmt::AnyOf {
                    conditions,
                    branches,
                }
            });
        }

        let (left, right) = self.operand_pair(keyword)?;
        let branches = self.branches()?;

        Ok(if is_and {
            Stmt::And {
                left,
                right,
                branches,
            }
        } else {
            Stmt::Or {
                left,
                right,
                branches,
            }
        })
    }

    fn not_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'not'.")?;
        let operand = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after operand.")?;

        let branches = self.branches()?;

        Ok(Stmt::Not { operand, branches })
    }

    /// A predicate used by folding and by multi‑condition statements.
    fn predicate(&mut self) -> Result<Expr> {
        if let Some(op) = self.match_compare() {
            let line = self.previous().line;
            let (left, right) = self.operand_pair(op.keyword())?;

            return Ok(Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
            });
        }

        if self.matches(TokenType::NOT) {
            let line = self.previous().line;
            self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'not'.")?;
            let operand = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after operand.")?;

            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                right: Box::new(operand),
                line,
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(AxError::parse(self.peek().line, "Expected condition."))
    }

    /// `"(" expression "," expression ")"`
    fn operand_pair(&mut self, keyword: &str) -> Result<(Expr, Expr)> {
        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after '{}'.", keyword),
        )?;
        let left = self.expression()?;
        self.consume(TokenType::COMMA, "Expected ',' between operands.")?;
        let right = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after operands.")?;

        Ok((left, right))
    }

    /// Then‑branch followed by the `elseif` chain and optional `else`.
    fn branches(&mut self) -> Result<Branches> {
        let then_branch = Box::new(self.statement()?);

        let mut else_ifs: Vec<(Expr, Stmt)> = Vec::new();
        while self.matches(TokenType::ELSEIF) {
            self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'elseif'.")?;
            let condition = self.expression()?;
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;

            else_ifs.push((condition, self.statement()?));
        }

        let else_branch = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Branches {
            then_branch,
            else_ifs,
            else_branch,
        })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    /// Statements up to the closing `}`.  A malformed inner statement is
    /// dropped (its error queued) and the rest of the block still parses.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();
        self.depth += 1;

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => self.pending.push_back(e),
            }
        }

        self.depth -= 1;

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block.")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.equality()?;

        if self.matches(TokenType::EQUAL) {
            let line = self.previous().line;

            // name[N] = { … }
            if self.matches(TokenType::LEFT_BRACE) {
                return match expr {
                    Expr::Index { object, index, .. } => match (*object, *index) {
                        (Expr::Variable { name, .. }, Expr::Number(n)) => {
                            let size = literal_size(n, line)?;
                            let elements = self.brace_initializer()?;

                            Ok(Expr::Assign {
                                name,
                                value: Box::new(Expr::FixedArray {
                                    size,
                                    elements,
                                    line,
                                }),
                                line,
                            })
                        }
                        _ => Err(AxError::parse(
                            line,
                            "Array initializer needs a 'name[size]' target with a literal size.",
                        )),
                    },
                    _ => Err(AxError::parse(
                        line,
                        "Array initializer needs a 'name[size]' target.",
                    )),
                };
            }

            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    line,
                }),

                Expr::Index { object, index, .. } => Ok(Expr::IndexAssign {
                    object,
                    index,
                    value: Box::new(value),
                    line,
                }),

                _ => Err(AxError::parse(line, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while let Some(op) = self.match_binary(&[
            (TokenType::BANG_EQUAL, BinaryOp::NotEqual),
            (TokenType::EQUAL_EQUAL, BinaryOp::Equal),
        ]) {
            let line = self.previous().line;
            let right: Expr = self.comparison()?;
            expr = binary(expr, op, right, line);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr = self.term()?;

        while let Some(op) = self.match_binary(&[
            (TokenType::GREATER, BinaryOp::Greater),
            (TokenType::GREATER_EQUAL, BinaryOp::GreaterEqual),
            (TokenType::LESS, BinaryOp::Less),
            (TokenType::LESS_EQUAL, BinaryOp::LessEqual),
        ]) {
            let line = self.previous().line;
            let right: Expr = self.term()?;
            expr = binary(expr, op, right, line);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while let Some(op) = self.match_binary(&[
            (TokenType::MINUS, BinaryOp::Subtract),
            (TokenType::PLUS, BinaryOp::Add),
        ]) {
            let line = self.previous().line;
            let right: Expr = self.factor()?;
            expr = binary(expr, op, right, line);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while let Some(op) = self.match_binary(&[
            (TokenType::STAR, BinaryOp::Multiply),
            (TokenType::SLASH, BinaryOp::Divide),
            (TokenType::PERCENT, BinaryOp::Modulo),
        ]) {
            let line = self.previous().line;
            let right: Expr = self.unary()?;
            expr = binary(expr, op, right, line);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: &Token<'_> = self.previous();
            let op = if operator.token_type == TokenType::BANG {
                UnaryOp::Not
            } else {
                UnaryOp::Negate
            };
            let line = operator.line;
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                op,
                right: Box::new(right),
                line,
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let line = self.previous().line;
                let index: Expr = self.expression()?;
                self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index.")?;

                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let arguments = self.arguments(TokenType::RIGHT_PAREN)?;

        let paren: &Token<'_> =
            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            arguments,
            line: paren.line,
        })
    }

    /// Comma‑separated expressions up to (not including) `close`.
    fn arguments(&mut self, close: TokenType) -> Result<Vec<Expr>> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(close) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    return Err(AxError::parse(
                        self.peek().line,
                        "Cannot have more than 255 arguments.",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        Ok(arguments)
    }

    /// Elements of a `{ … }` initializer; the `{` is already consumed.
    fn brace_initializer(&mut self) -> Result<Vec<Expr>> {
        let elements = self.arguments(TokenType::RIGHT_BRACE)?;
        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after array initializer.")?;

        Ok(elements)
    }

    fn array_size(&mut self) -> Result<usize> {
        let token = self.peek();

        match token.token_type {
            TokenType::NUMBER(n) => {
                self.advance();
                literal_size(n, token.line)
            }
            _ => Err(AxError::parse(token.line, "Array size must be a number literal.")),
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Bool(false));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Bool(true));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Number(n));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Str(s.clone()));
        }

        if self.matches(TokenType::IDENTIFIER) {
            let token = self.previous();

            return Ok(Expr::Variable {
                name: token.lexeme.to_string(),
                line: token.line,
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(TokenType::LEFT_BRACKET) {
            let line = self.previous().line;
            let elements = self.arguments(TokenType::RIGHT_BRACKET)?;
            self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after array elements.")?;

            return Ok(Expr::Array { elements, line });
        }

        Err(AxError::parse(self.peek().line, "Expected expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn match_compare(&mut self) -> Option<CompareOp> {
        let op = match self.peek().token_type {
            TokenType::COMPEQ => CompareOp::Eq,
            TokenType::COMPNEQ => CompareOp::NotEq,
            TokenType::COMPGE => CompareOp::Ge,
            TokenType::COMPLE => CompareOp::Le,
            TokenType::COMPG => CompareOp::Gt,
            TokenType::COMPL => CompareOp::Lt,
            _ => return None,
        };

        self.advance();
        Some(op)
    }

    fn match_binary(&mut self, table: &[(TokenType, BinaryOp)]) -> Option<BinaryOp> {
        for (ttype, op) in table {
            if self.check(ttype.clone()) {
                self.advance();
                return Some(*op);
            }
        }

        None
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'t Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        debug!(
            "consume failed: wanted '{}', found {:?}",
            message,
            self.peek().token_type
        );

        Err(AxError::parse(self.peek().line, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'t Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || matches!(self.peek().token_type, TokenType::EOF)
    }

    /// Current token; the last token stands in once the slice is exhausted.
    #[inline(always)]
    fn peek(&self) -> &'t Token<'a> {
        let idx = self.current.min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    #[inline(always)]
    fn previous(&self) -> &'t Token<'a> {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    /// Inside a block a `}` is left for the block to consume.
    fn synchronize(&mut self) {
        if self.depth > 0 && self.check(TokenType::RIGHT_BRACE) {
            return;
        }

        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::RIGHT_BRACE if self.depth > 0 => return,
                TokenType::FUN
                | TokenType::VAR
                | TokenType::PRINT
                | TokenType::INPUT
                | TokenType::LOOP
                | TokenType::BREAK
                | TokenType::CONTINUE
                | TokenType::RETURN
                | TokenType::COMPEQ
                | TokenType::COMPNEQ
                | TokenType::COMPGE
                | TokenType::COMPLE
                | TokenType::COMPG
                | TokenType::COMPL
                | TokenType::AND
                | TokenType::OR
                | TokenType::NOT => return,
                _ => {}
            }

            self.advance();
        }
    }
}

impl Iterator for Parser<'_, '_> {
    type Item = Result<Stmt>;

    /// Next top‑level declaration, or `None` once `EOF` is reached.
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.pop_front() {
            return Some(Err(e));
        }

        if self.tokens.is_empty() || self.is_at_end() {
            return None;
        }

        Some(self.declaration())
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr, line: usize) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        line,
    }
}

/// Declared capacity of a fixed‑size array: a non‑negative whole number
/// no larger than [`MAX_ARRAY_SIZE`].
fn literal_size(n: f64, line: usize) -> Result<usize> {
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
        return Err(AxError::parse(
            line,
            "Array size must be a non-negative whole number.",
        ));
    }

    if n > MAX_ARRAY_SIZE as f64 {
        return Err(AxError::parse(
            line,
            format!("Array size cannot exceed {}.", MAX_ARRAY_SIZE),
        ));
    }

    Ok(n as usize)
}
