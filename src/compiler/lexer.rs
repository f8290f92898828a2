//! This lexer tokenizes the source language.
//!
//! Lexemes are separated by the ASCII space character and nothing else.
//! Whitespace at either end of a lexeme is trimmed, so a newline next to a
//! space does not stick to a word, but `dup\tdrop` is still one lexeme.
//! Empty and whitespace-only lexemes are skipped.
use std::fmt;
use regex::Regex;

/// Integer literals: optional sign, decimal digits with single underscores
/// between them.
const INT_PATTERN: &str = r"^[+-]?[0-9]+(?:_[0-9]+)*$";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Colon,
    Semicolon,
    LBrace,
    RBrace,
    If,
    Else,
    Then,
    Int(i64),
    Word,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Colon     => write!(f, "`:`"),
            Kind::Semicolon => write!(f, "`;`"),
            Kind::LBrace    => write!(f, "`{{`"),
            Kind::RBrace    => write!(f, "`}}`"),
            Kind::If        => write!(f, "`if`"),
            Kind::Else      => write!(f, "`else`"),
            Kind::Then      => write!(f, "`then`"),
            Kind::Int(v)    => write!(f, "integer {}", v),
            Kind::Word      => write!(f, "word"),
        }
    }
}

/// A classified lexeme along with the line it appears on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind:   Kind,
    pub lexeme: String,
    pub line:   usize,
}

impl Token {
    pub fn new(kind: Kind, lexeme: &str, line: usize) -> Self {
        Token { kind, lexeme: lexeme.to_owned(), line }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            Kind::Word => write!(f, "word `{}`", self.lexeme.escape_debug()),
            kind => write!(f, "{}", kind),
        }
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    // The pattern is a constant; failing to compile it is a bug.
    let int_re = Regex::new(INT_PATTERN).expect("integer pattern is valid");
    let mut tokens: Vec<Token> = Vec::with_capacity(source.len() / 4);
    let mut line: usize = 1;

    for lexeme in source.split(' ') {
        let start = line;
        line += lexeme.matches('\n').count();

        let text = lexeme.trim();
        if text.is_empty() {
            continue;
        }

        let kind = classify(text, &int_re, start);
        if kind == Kind::Word && has_inner_whitespace(text) {
            warn!("Word `{}` on line {} contains whitespace; only spaces separate words.",
                text.escape_debug(), leading_line(lexeme, start));
        }
        tokens.push(Token::new(kind, text, leading_line(lexeme, start)));
    }

    debug!("Lexed {} token(s) over {} line(s).", tokens.len(), line);
    tokens
}

/// A lexeme such as `"\ndup"` starts on the line after the one its first
/// byte sits on.
fn leading_line(lexeme: &str, line: usize) -> usize {
    let skipped = lexeme.len() - lexeme.trim_start().len();
    line + lexeme[..skipped].matches('\n').count()
}

/// Tabs and newlines do not split lexemes, so they end up inside words.
fn has_inner_whitespace(text: &str) -> bool {
    text.chars().any(char::is_whitespace)
}

fn classify(lexeme: &str, int_re: &Regex, line: usize) -> Kind {
    match lexeme {
        ":" => return Kind::Colon,
        ";" => return Kind::Semicolon,
        "{" => return Kind::LBrace,
        "}" => return Kind::RBrace,
        _ => {},
    }

    if let Some(kw) = tokenize_keyword(lexeme) {
        return kw;
    }

    if int_re.is_match(lexeme) {
        match tokenize_int(lexeme) {
            Some(val) => return Kind::Int(val),
            None => warn!("Integer literal `{}` on line {} is out of range; treating it as a word.",
                lexeme, line),
        }
    }

    Kind::Word
}

fn tokenize_keyword(lexeme: &str) -> Option<Kind> {
    if lexeme.eq_ignore_ascii_case("if") {
        Some(Kind::If)
    } else if lexeme.eq_ignore_ascii_case("else") {
        Some(Kind::Else)
    } else if lexeme.eq_ignore_ascii_case("then") {
        Some(Kind::Then)
    } else {
        None
    }
}

/// Assumes `lexeme` already matched `INT_PATTERN`.
fn tokenize_int(lexeme: &str) -> Option<i64> {
    let digits: String = lexeme.chars().filter(|&c| c != '_').collect();
    digits.parse::<i64>().ok()
}
