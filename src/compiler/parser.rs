//! The Parser module takes a token stream from the lexer and converts it
//! into a list of top-level AST forms.
//!
//! It is a recursive descent parser with one token of lookahead. The
//! token slice is never modified; the parser only moves a cursor forward.
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use super::lexer::{Kind, Token};
use super::ast::*;

/// A token class the parser was looking for.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Expected {
    Colon,
    Semicolon,
    LBrace,
    RBrace,
    If,
    Then,
    ThenOrElse,
    Word,
}

impl Expected {
    fn matches(&self, kind: Kind) -> bool {
        match (self, kind) {
            (Expected::Colon, Kind::Colon)         |
            (Expected::Semicolon, Kind::Semicolon) |
            (Expected::LBrace, Kind::LBrace)       |
            (Expected::RBrace, Kind::RBrace)       |
            (Expected::If, Kind::If)               |
            (Expected::Then, Kind::Then)           |
            (Expected::ThenOrElse, Kind::Then)     |
            (Expected::ThenOrElse, Kind::Else)     |
            (Expected::Word, Kind::Word)           => true,
            _ => false,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expected::Colon      => write!(f, "`:`"),
            Expected::Semicolon  => write!(f, "`;`"),
            Expected::LBrace     => write!(f, "`{{`"),
            Expected::RBrace     => write!(f, "`}}`"),
            Expected::If         => write!(f, "`if`"),
            Expected::Then       => write!(f, "`then`"),
            Expected::ThenOrElse => write!(f, "`then` or `else`"),
            Expected::Word       => write!(f, "a word"),
        }
    }
}

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: Expected,
        found:    Token,
        line:     usize,
    },

    /// Input ran out; `line` is the last line holding a token.
    #[error("line {line}: expected {expected}, found end of input")]
    MissingToken {
        expected: Expected,
        line:     usize,
    },

    #[error("line {line}: word `{name}` is already defined on line {first}")]
    DuplicateWord {
        name:  String,
        first: usize,
        line:  usize,
    },

    #[error("line {line}: `{name}` has the form of a conditional label and cannot be defined")]
    ReservedWord {
        name: String,
        line: usize,
    },

    #[error("line {}: unexpected {} at top level", .found.line, .found)]
    TrailingTokens {
        found: Token,
    },
}

pub struct Parser<'a> {
    tokens:      &'a [Token],
    pos:         usize,
    next_label:  usize,
    definitions: HashMap<String, usize>,
    strict:      bool,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser {
            tokens,
            pos: 0,
            next_label: 0,
            definitions: HashMap::new(),
            strict: false,
        }
    }

    /// Rejects tokens left over after the last top-level form instead of
    /// ignoring them.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Run the parser, consuming itself and returning the top-level forms.
    pub fn run(mut self) -> Result<Vec<Node>, ParseError> {
        let mut forms = Vec::new();

        'mainloop: loop {
            match self.peek_kind() {
                Some(Kind::Colon) => forms.push(self.word_def()?),
                Some(kind) if starts_statement(kind) => forms.push(self.statement()?),
                _ => break 'mainloop,
            }
        }

        if let Some(tok) = self.peek() {
            if self.strict {
                return Err(ParseError::TrailingTokens { found: tok.clone() });
            }
            warn!("Ignoring {} trailing token(s) starting with {} on line {}.",
                self.tokens.len() - self.pos, tok, tok.line);
        }

        debug!("Parsed {} top-level form(s), {} definition(s), {} conditional(s).",
            forms.len(), self.definitions.len(), self.next_label);
        Ok(forms)
    }

    /// `':' WORD Statement* ';'`
    fn word_def(&mut self) -> Result<Node, ParseError> {
        self.expect(Expected::Colon)?;
        let name_tok = self.expect(Expected::Word)?;
        let name = name_tok.lexeme.clone();

        if Label::is_label_name(&name) {
            return Err(ParseError::ReservedWord { name, line: name_tok.line });
        }
        if let Some(&first) = self.definitions.get(&name) {
            return Err(ParseError::DuplicateWord { name, first, line: name_tok.line });
        }
        self.definitions.insert(name.clone(), name_tok.line);

        let body = self.block()?;
        self.expect(Expected::Semicolon)?;
        Ok(Node::WordDef { name, body })
    }

    /// Collects statements for as long as the next token can start one.
    fn block(&mut self) -> Result<Block, ParseError> {
        let mut body = Vec::new();
        while let Some(kind) = self.peek_kind() {
            if !starts_statement(kind) {
                break;
            }
            body.push(self.statement()?);
        }
        Ok(Block(body))
    }

    fn statement(&mut self) -> Result<Node, ParseError> {
        match self.peek_kind() {
            Some(Kind::If) => self.if_stmt(),
            Some(Kind::LBrace) => self.inline(),
            Some(Kind::Int(val)) => {
                self.consume();
                Ok(Node::PushNum(val))
            },
            _ => {
                let tok = self.expect(Expected::Word)?;
                Ok(Node::WordCall(tok.lexeme.clone()))
            },
        }
    }

    /// `'if' Statement* ( 'then' | 'else' Statement* 'then' )`
    fn if_stmt(&mut self) -> Result<Node, ParseError> {
        self.expect(Expected::If)?;
        // Labels are numbered in order of the `if` keyword, so an outer
        // conditional gets a smaller number than the ones nested in it.
        let label = Label(self.next_label);
        self.next_label += 1;

        let body = self.block()?;
        let tok = self.expect(Expected::ThenOrElse)?;
        let else_body = match tok.kind {
            Kind::Else => {
                let else_body = self.block()?;
                self.expect(Expected::Then)?;
                Some(else_body)
            },
            _ => None,
        };

        Ok(Node::If { label, body, else_body })
    }

    /// `'{' RAWTOKEN* '}'`: the lexemes in between are joined verbatim.
    fn inline(&mut self) -> Result<Node, ParseError> {
        self.expect(Expected::LBrace)?;
        let mut raw: Vec<&str> = Vec::new();
        loop {
            match self.peek_kind() {
                Some(Kind::RBrace) => break,
                Some(_) => {
                    if let Some(tok) = self.consume() {
                        raw.push(&tok.lexeme);
                    }
                },
                // Let expect() report the missing brace.
                None => break,
            }
        }
        self.expect(Expected::RBrace)?;
        Ok(Node::InlineAsm(raw.join(" ")))
    }

    /// Consumes the next token if it is of the expected class.
    fn expect(&mut self, expected: Expected) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(tok) if expected.matches(tok.kind) => {
                self.pos += 1;
                Ok(tok)
            },
            Some(tok) => Err(ParseError::UnexpectedToken {
                expected,
                found: tok.clone(),
                line: tok.line,
            }),
            None => Err(ParseError::MissingToken {
                expected,
                line: self.tokens.last().map_or(1, |t| t.line),
            }),
        }
    }

    #[inline]
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    #[inline]
    fn peek_kind(&self) -> Option<Kind> {
        self.peek().map(|t| t.kind)
    }

    /// Returns the next token and advances past it.
    /// Returns None if no tokens are left.
    #[inline]
    fn consume(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

fn starts_statement(kind: Kind) -> bool {
    matches!(kind, Kind::If | Kind::Word | Kind::Int(_) | Kind::LBrace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::lexer::tokenize;

    fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
        Parser::new(&tokenize(source)).run()
    }

    fn words(names: &[&str]) -> Block {
        Block(names.iter().map(|n| Node::WordCall(n.to_string())).collect())
    }

    #[test]
    fn test_statements() {
        assert_eq!(parse("42 dup -1"), Ok(vec![
            Node::PushNum(42),
            Node::WordCall("dup".to_owned()),
            Node::PushNum(-1),
        ]));
        assert_eq!(parse(""), Ok(vec![]));
    }

    #[test]
    fn test_word_def() {
        assert_eq!(parse(": square dup mul ;"), Ok(vec![
            Node::WordDef { name: "square".to_owned(), body: words(&["dup", "mul"]) },
        ]));
        assert_eq!(parse(": nothing ;"), Ok(vec![
            Node::WordDef { name: "nothing".to_owned(), body: Block::default() },
        ]));
    }

    #[test]
    fn test_interleaved_forms() {
        let forms = parse("1 : a 2 ; b : c ; 3").unwrap();
        let defs: Vec<bool> = forms.iter().map(|f| f.is_definition()).collect();
        assert_eq!(defs, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_if() {
        assert_eq!(parse("if 1 then"), Ok(vec![Node::If {
            label: Label(0),
            body: Block(vec![Node::PushNum(1)]),
            else_body: None,
        }]));
        assert_eq!(parse("IF 1 ELSE 2 THEN"), Ok(vec![Node::If {
            label: Label(0),
            body: Block(vec![Node::PushNum(1)]),
            else_body: Some(Block(vec![Node::PushNum(2)])),
        }]));
        assert_eq!(parse("if else then"), Ok(vec![Node::If {
            label: Label(0),
            body: Block::default(),
            else_body: Some(Block::default()),
        }]));
    }

    #[test]
    fn test_labels_unique() {
        let forms = parse("if if then then : f if then ; if else if then then").unwrap();
        let mut labels = Vec::new();
        fn collect(node: &Node, labels: &mut Vec<usize>) {
            match node {
                Node::If { label, body, else_body } => {
                    labels.push(label.0);
                    body.nodes().iter().for_each(|n| collect(n, labels));
                    if let Some(e) = else_body {
                        e.nodes().iter().for_each(|n| collect(n, labels));
                    }
                },
                Node::WordDef { body, .. } | Node::Block(body) =>
                    body.nodes().iter().for_each(|n| collect(n, labels)),
                _ => {},
            }
        }
        forms.iter().for_each(|f| collect(f, &mut labels));
        assert_eq!(labels, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_inline() {
        assert_eq!(parse("{ LDA #$01 }"), Ok(vec![Node::InlineAsm("LDA #$01".to_owned())]));
        // Keywords and punctuation are not interpreted inside braces.
        assert_eq!(parse("{ if : 007 { ; }"), Ok(vec![Node::InlineAsm("if : 007 { ;".to_owned())]));
        assert_eq!(parse("{ }"), Ok(vec![Node::InlineAsm(String::new())]));
    }

    #[test]
    fn test_missing_semicolon() {
        match parse(": foo") {
            Err(ParseError::MissingToken { expected: Expected::Semicolon, .. }) => {},
            other => panic!("unexpected result {:?}", other),
        }
        let err = parse(": foo").unwrap_err();
        assert!(err.to_string().contains("expected `;`"));
    }

    #[test]
    fn test_errors() {
        match parse(": 1 ;") {
            Err(ParseError::UnexpectedToken { expected: Expected::Word, found: tok, .. }) =>
                assert_eq!(tok.kind, Kind::Int(1)),
            other => panic!("unexpected result {:?}", other),
        }
        match parse("if 1") {
            Err(ParseError::MissingToken { expected: Expected::ThenOrElse, .. }) => {},
            other => panic!("unexpected result {:?}", other),
        }
        match parse("if 1 else 2 ;") {
            Err(ParseError::UnexpectedToken { expected: Expected::Then, .. }) => {},
            other => panic!("unexpected result {:?}", other),
        }
        match parse("{ NOP") {
            Err(ParseError::MissingToken { expected: Expected::RBrace, .. }) => {},
            other => panic!("unexpected result {:?}", other),
        }
        // Definitions do not nest.
        match parse(": a : b ; ;") {
            Err(ParseError::UnexpectedToken { expected: Expected::Semicolon, found: tok, .. }) =>
                assert_eq!(tok.kind, Kind::Colon),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_error_line() {
        match parse("1 \n2 \n: foo \nbar") {
            Err(ParseError::MissingToken { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_word() {
        assert_eq!(parse(": a ; \n: a 1 ;"), Err(ParseError::DuplicateWord {
            name: "a".to_owned(),
            first: 1,
            line: 2,
        }));
    }

    #[test]
    fn test_label_shaped_definition() {
        assert_eq!(parse(": L0_then ; if then"), Err(ParseError::ReservedWord {
            name: "L0_then".to_owned(),
            line: 1,
        }));
        // Calls and near misses are left alone.
        assert!(parse("L0_then").is_ok());
        assert!(parse(": L_then ; : L0_end ; : l0_if ;").is_ok());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(parse(": 1 ;").unwrap_err().to_string(), "line 1: expected a word, found integer 1");
        assert_eq!(parse("if").unwrap_err().to_string(), "line 1: expected `then` or `else`, found end of input");
        assert_eq!(parse(": a ; : a ;").unwrap_err().to_string(), "line 1: word `a` is already defined on line 1");
        let tokens = tokenize("1 }");
        assert_eq!(Parser::new(&tokens).strict(true).run().unwrap_err().to_string(),
            "line 1: unexpected `}` at top level");
    }

    #[test]
    fn test_trailing_tokens() {
        assert_eq!(parse("1 2 ; 3"), Ok(vec![Node::PushNum(1), Node::PushNum(2)]));
        assert_eq!(parse("then"), Ok(vec![]));

        let tokens = tokenize("1 2 ; 3");
        match Parser::new(&tokens).strict(true).run() {
            Err(ParseError::TrailingTokens { found }) => assert_eq!(found.kind, Kind::Semicolon),
            other => panic!("unexpected result {:?}", other),
        }
        let tokens = tokenize("1 2");
        assert!(Parser::new(&tokens).strict(true).run().is_ok());
    }
}
