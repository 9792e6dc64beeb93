use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the AxScript scanner.
///
/// Variants without data represent punctuation or keyword tokens.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// '['
    LEFT_BRACKET,

    /// ']'
    RIGHT_BRACKET,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '%'
    PERCENT,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes, escapes untouched)
    STRING(String),

    /// A numeric literal, sign included
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    // ── declaration / control keywords ──────────────────────────────────
    VAR,
    PRINT,
    INPUT,
    ELSE,
    ELSEIF,
    FUN,
    RETURN,
    TRUE,
    FALSE,

    // ── counted loops ───────────────────────────────────────────────────
    LOOP,
    TO,
    STEP,
    DOWN,
    BREAK,
    CONTINUE,

    // ── logic statements ────────────────────────────────────────────────
    AND,
    OR,
    NOT,

    // ── comparison statements ───────────────────────────────────────────
    COMPEQ,
    COMPNEQ,
    COMPGE,
    COMPLE,
    COMPG,
    COMPL,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Upper‑case variant name without any payload.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::PERCENT => "PERCENT",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::VAR => "VAR",
            TokenType::PRINT => "PRINT",
            TokenType::INPUT => "INPUT",
            TokenType::ELSE => "ELSE",
            TokenType::ELSEIF => "ELSEIF",
            TokenType::FUN => "FUN",
            TokenType::RETURN => "RETURN",
            TokenType::TRUE => "TRUE",
            TokenType::FALSE => "FALSE",
            TokenType::LOOP => "LOOP",
            TokenType::TO => "TO",
            TokenType::STEP => "STEP",
            TokenType::DOWN => "DOWN",
            TokenType::BREAK => "BREAK",
            TokenType::CONTINUE => "CONTINUE",
            TokenType::AND => "AND",
            TokenType::OR => "OR",
            TokenType::NOT => "NOT",
            TokenType::COMPEQ => "COMPEQ",
            TokenType::COMPNEQ => "COMPNEQ",
            TokenType::COMPGE => "COMPGE",
            TokenType::COMPLE => "COMPLE",
            TokenType::COMPG => "COMPG",
            TokenType::COMPL => "COMPL",
            TokenType::EOF => "EOF",
        }
    }

    /// Can a token of this kind be the last token of an operand?  Decides
    /// whether a following `-digit` is a subtraction or a negative literal.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenType::NUMBER(_)
                | TokenType::STRING(_)
                | TokenType::IDENTIFIER
                | TokenType::TRUE
                | TokenType::FALSE
                | TokenType::RIGHT_PAREN
                | TokenType::RIGHT_BRACKET
        )
    }
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token, including its type, the original lexeme,
/// and the line number where it was found.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token, literal payload included.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: &'a str,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl<'a> Token<'a> {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new(token_type: TokenType, lexeme: &'a str, line: usize) -> Self {
        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token<'_> {
    /// `TYPE lexeme literal`, with `null` for tokens without a literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant: &'static str = self.token_type.name();

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{} {} {}", variant, self.lexeme, s),
            TokenType::NUMBER(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                // 3 → "3.0", 3.14 → "3.14"
                let mut buf = itoa::Buffer::new();
                write!(f, "{} {} {}.0", variant, self.lexeme, buf.format(*n as i64))
            }
            TokenType::NUMBER(n) => write!(f, "{} {} {}", variant, self.lexeme, n),
            _ => write!(f, "{} {} null", variant, self.lexeme),
        }
    }
}
