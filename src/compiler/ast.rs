//! This AST describes a parsed source file.
//!
//! A program is a flat list of top-level forms. Subroutine definitions
//! may appear anywhere at the top level but never nest; everything else is
//! entry code and runs in source order.
//!
//! The language has no comments. Example source file:
//!
//! ```forth
//! : square dup mul ; 3 square if 1 else 2 then { LDA #$FF }
//! ```
//!
//! Here `square` is a definition (label, body, RTS), `3 square` pushes 3
//! and calls it, the conditional pops a value and branches on zero, and
//! the braces hold raw assembly emitted verbatim.

use std::fmt;

/// Identifies the labels emitted for one conditional.
/// Handed out in increasing order by the parser, so no two conditionals
/// in a program share one.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Label(pub usize);

impl Label {
    /// Prefix shared by the `if`, `else` and `then` labels of a conditional.
    pub fn mangle(&self) -> String {
        format!("L{}_", self.0)
    }

    pub fn if_label(&self) -> String {
        format!("{}if", self.mangle())
    }

    pub fn else_label(&self) -> String {
        format!("{}else", self.mangle())
    }

    pub fn then_label(&self) -> String {
        format!("{}then", self.mangle())
    }

    /// True for names of the form `L<digits>_if`, `_else` or `_then`,
    /// which a definition must not take.
    pub fn is_label_name(name: &str) -> bool {
        let rest = match name.strip_prefix('L') {
            Some(rest) => rest,
            None => return false,
        };
        match rest.split_once('_') {
            Some((digits, suffix)) =>
                !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
                    && matches!(suffix, "if" | "else" | "then"),
            None => false,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Block(pub Vec<Node>);

impl Block {
    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    PushNum(i64),
    WordCall(String),
    InlineAsm(String),
    Block(Block),
    If {
        label:     Label,
        body:      Block,
        else_body: Option<Block>,
    },
    WordDef {
        name: String,
        body: Block,
    },
}

impl Node {
    pub fn is_definition(&self) -> bool {
        matches!(self, Node::WordDef { .. })
    }
}

// Nodes print back as source text.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::PushNum(v)     => write!(f, "{}", v),
            Node::WordCall(name) => write!(f, "{}", name),
            Node::InlineAsm(asm) if asm.is_empty() => write!(f, "{{ }}"),
            Node::InlineAsm(asm) => write!(f, "{{ {} }}", asm),
            Node::Block(block)   => write!(f, "{}", block),
            Node::If { body, else_body: None, .. } => {
                write!(f, "if ")?;
                write_body(f, body)?;
                write!(f, "then")
            },
            Node::If { body, else_body: Some(else_body), .. } => {
                write!(f, "if ")?;
                write_body(f, body)?;
                write!(f, "else ")?;
                write_body(f, else_body)?;
                write!(f, "then")
            },
            Node::WordDef { name, body } => {
                write!(f, ": {} ", name)?;
                write_body(f, body)?;
                write!(f, ";")
            },
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let words: Vec<String> = self.0.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", words.join(" "))
    }
}

/// Writes a block followed by a separating space, or nothing if empty.
fn write_body(f: &mut fmt::Formatter, body: &Block) -> fmt::Result {
    if body.is_empty() {
        Ok(())
    } else {
        write!(f, "{} ", body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let l = Label(7);
        assert_eq!(l.if_label(), "L7_if");
        assert_eq!(l.else_label(), "L7_else");
        assert_eq!(l.then_label(), "L7_then");
        assert_ne!(Label(1).then_label(), Label(11).then_label());
    }

    #[test]
    fn test_is_label_name() {
        for n in &[0, 7, 123] {
            let l = Label(*n);
            assert!(Label::is_label_name(&l.if_label()));
            assert!(Label::is_label_name(&l.else_label()));
            assert!(Label::is_label_name(&l.then_label()));
        }
        assert!(!Label::is_label_name("L_if"));
        assert!(!Label::is_label_name("L1x_if"));
        assert!(!Label::is_label_name("L1_ifs"));
        assert!(!Label::is_label_name("l1_if"));
        assert!(!Label::is_label_name("square"));
    }

    #[test]
    fn test_display() {
        let def = Node::WordDef {
            name: "square".to_owned(),
            body: Block(vec![
                Node::WordCall("dup".to_owned()),
                Node::WordCall("mul".to_owned()),
            ]),
        };
        assert_eq!(def.to_string(), ": square dup mul ;");

        let cond = Node::If {
            label: Label(0),
            body: Block(vec![Node::PushNum(1)]),
            else_body: Some(Block(vec![Node::InlineAsm("NOP".to_owned())])),
        };
        assert_eq!(cond.to_string(), "if 1 else { NOP } then");

        let empty = Node::If { label: Label(0), body: Block::default(), else_body: None };
        assert_eq!(empty.to_string(), "if then");
        assert_eq!(Node::InlineAsm(String::new()).to_string(), "{ }");
    }

    #[test]
    fn test_is_definition() {
        assert!(Node::WordDef { name: "x".to_owned(), body: Block::default() }.is_definition());
        assert!(!Node::WordCall("x".to_owned()).is_definition());
        assert!(!Node::Block(Block::default()).is_definition());
    }
}
