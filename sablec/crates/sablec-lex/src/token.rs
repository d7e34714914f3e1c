//! Token definitions.

use sablec_util::Symbol;

/// A single token of the surface language.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// End of a logical line.
    Newline,
    /// Increase in indentation depth.
    Indent,
    /// Decrease in indentation depth.
    Dedent,
    /// End of input (after any trailing `Dedent`s).
    Eof,

    // Keywords
    Def,
    Return,
    If,
    Elif,
    Else,
    While,
    Pass,
    Class,
    True,
    False,
    None,

    // Literals and names
    Ident(Symbol),
    Int(i64),
    Float(f64),
    Str(String),

    // Operators and punctuation
    Plus,
    Minus,
    PlusEq,
    MinusEq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Eq,
    Colon,
    Comma,
    Arrow,
    LParen,
    RParen,

    /// An unrecognized character; reported as a diagnostic.
    Invalid(char),
}

impl Token {
    /// Map an identifier to its keyword token, if it is one.
    pub fn keyword(ident: &str) -> Option<Token> {
        let token = match ident {
            "def" => Token::Def,
            "return" => Token::Return,
            "if" => Token::If,
            "elif" => Token::Elif,
            "else" => Token::Else,
            "while" => Token::While,
            "pass" => Token::Pass,
            "class" => Token::Class,
            "True" => Token::True,
            "False" => Token::False,
            "None" => Token::None,
            _ => return Option::None,
        };
        Some(token)
    }

    /// A short human-readable description, for parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Newline => "newline".into(),
            Token::Indent => "indent".into(),
            Token::Dedent => "dedent".into(),
            Token::Eof => "end of input".into(),
            Token::Ident(sym) => format!("identifier `{}`", sym),
            Token::Int(n) => format!("integer `{}`", n),
            Token::Float(x) => format!("float `{}`", x),
            Token::Str(_) => "string literal".into(),
            Token::Def => "`def`".into(),
            Token::Return => "`return`".into(),
            Token::If => "`if`".into(),
            Token::Elif => "`elif`".into(),
            Token::Else => "`else`".into(),
            Token::While => "`while`".into(),
            Token::Pass => "`pass`".into(),
            Token::Class => "`class`".into(),
            Token::True => "`True`".into(),
            Token::False => "`False`".into(),
            Token::None => "`None`".into(),
            Token::Plus => "`+`".into(),
            Token::Minus => "`-`".into(),
            Token::PlusEq => "`+=`".into(),
            Token::MinusEq => "`-=`".into(),
            Token::EqEq => "`==`".into(),
            Token::NotEq => "`!=`".into(),
            Token::Lt => "`<`".into(),
            Token::Gt => "`>`".into(),
            Token::Eq => "`=`".into(),
            Token::Colon => "`:`".into(),
            Token::Comma => "`,`".into(),
            Token::Arrow => "`->`".into(),
            Token::LParen => "`(`".into(),
            Token::RParen => "`)`".into(),
            Token::Invalid(c) => format!("invalid character `{}`", c),
        }
    }
}
