//! Lowers AST nodes into subroutine-threaded assembly.
//!
//! Every node compiles to a tree of [`Fragment`]s whose shape follows the
//! shape of the AST. [`flatten`] turns that tree into the ordered list of
//! lines that ends up in the output.
//!
//! Output conventions for the target:
//!
//! ```nasm
//!         push #42        ; literal onto the data stack
//!         jsr dup         ; word call
//! square:                 ; definition label, body, then RTS
//!         RTS
//!         PLA             ; conditionals pop their flag...
//!         CMP #0          ; ...and branch on zero
//! ```
use std::fmt;
use super::ast::*;

/// One line of assembly output.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Line {
    /// `name:`, not indented.
    Label(String),
    /// A tab-indented mnemonic with an optional operand.
    Op(&'static str, Option<String>),
    /// Inline assembly, tab-indented and otherwise untouched.
    Raw(String),
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Line::Label(name)               => writeln!(f, "{}:", name),
            Line::Op(mnemonic, None)        => writeln!(f, "\t{}", mnemonic),
            Line::Op(mnemonic, Some(arg))   => writeln!(f, "\t{} {}", mnemonic, arg),
            Line::Raw(text)                 => writeln!(f, "\t{}", text),
        }
    }
}

impl Line {
    fn op(mnemonic: &'static str, operand: impl Into<String>) -> Self {
        Line::Op(mnemonic, Some(operand.into()))
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Fragment {
    Line(Line),
    Seq(Vec<Fragment>),
}

impl From<Line> for Fragment {
    fn from(line: Line) -> Self {
        Fragment::Line(line)
    }
}

impl Node {
    /// Generates the assembly for this node and everything under it.
    pub fn compile(&self) -> Fragment {
        match self {
            Node::PushNum(v)      => Line::op("push", format!("#{}", v)).into(),
            Node::WordCall(name)  => Line::op("jsr", name.as_str()).into(),
            Node::InlineAsm(text) => Line::Raw(text.clone()).into(),
            Node::Block(block)    => block.compile(),
            Node::WordDef { name, body } => Fragment::Seq(vec![
                Line::Label(name.clone()).into(),
                body.compile(),
                Line::Op("RTS", None).into(),
            ]),
            Node::If { label, body, else_body: None } => Fragment::Seq(vec![
                Line::Op("PLA", None).into(),
                Line::op("CMP", "#0").into(),
                Line::op("BNE", label.if_label()).into(),
                Line::op("JMP", label.then_label()).into(),
                Line::Label(label.if_label()).into(),
                body.compile(),
                Line::Label(label.then_label()).into(),
            ]),
            Node::If { label, body, else_body: Some(else_body) } => Fragment::Seq(vec![
                Line::Op("PLA", None).into(),
                Line::op("CMP", "#0").into(),
                Line::op("BNE", label.if_label()).into(),
                Line::op("BEQ", label.else_label()).into(),
                // Unreachable after BNE/BEQ; kept as a safety net.
                Line::op("JMP", label.then_label()).into(),
                Line::Label(label.if_label()).into(),
                body.compile(),
                // The if body must not run into the else body.
                Line::op("JMP", label.then_label()).into(),
                Line::Label(label.else_label()).into(),
                else_body.compile(),
                Line::Label(label.then_label()).into(),
            ]),
        }
    }
}

impl Block {
    pub fn compile(&self) -> Fragment {
        Fragment::Seq(self.nodes().iter().map(Node::compile).collect())
    }
}

/// Collects the lines of a fragment tree in order.
///
/// Walks the tree with an explicit stack rather than recursion, so this
/// pass does not add to the stack depth used by parsing and generation.
pub fn flatten(fragment: &Fragment) -> Vec<&Line> {
    let mut lines = Vec::new();
    let mut stack = vec![fragment];

    while let Some(frag) = stack.pop() {
        match frag {
            Fragment::Line(line) => lines.push(line),
            // Pushed in reverse so the first child is popped first.
            Fragment::Seq(children) => stack.extend(children.iter().rev()),
        }
    }

    lines
}

/// Renders a list of lines into one text blob.
pub fn render<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = &'a Line>,
{
    lines.into_iter().map(|l| l.to_string()).collect()
}
