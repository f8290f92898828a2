//! The Compiler module is in charge of taking a source file and
//! producing the assembly text for it.
//!
//! It does this by implementing a space-delimited tokenizer, a
//! recursive descent parser with one token of lookahead, and a code
//! generator that emits a few lines of assembly per AST node.

pub mod ast;
pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod template;

use thiserror::Error;
use ast::Node;
use codegen::{flatten, render};
use parser::{ParseError, Parser};
use template::{Template, TemplateError};

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Options {
    /// Reject tokens that follow the last top-level form.
    pub strict: bool,
}

/// Generated code, split into the two template sections.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Sections {
    pub code:        String,
    pub subroutines: String,
}

/// Lexes and parses a whole source file.
pub fn parse(source: &str, options: Options) -> Result<Vec<Node>, ParseError> {
    let tokens = lexer::tokenize(source);
    Parser::new(&tokens).strict(options.strict).run()
}

/// Generates both sections from the top-level forms.
/// Definitions go to the subroutine section and everything else to the
/// entry code, each keeping its source order.
pub fn generate(forms: &[Node]) -> Sections {
    let (defs, code): (Vec<&Node>, Vec<&Node>) = forms.iter().partition(|f| f.is_definition());
    info!("Generating {} entry form(s) and {} subroutine(s).", code.len(), defs.len());

    Sections {
        code: generate_section(&code),
        subroutines: generate_section(&defs),
    }
}

fn generate_section(forms: &[&Node]) -> String {
    let fragments: Vec<_> = forms.iter().map(|f| f.compile()).collect();
    render(fragments.iter().flat_map(flatten))
}

/// Compiles `source` and splices the result into `template`.
pub fn compile(source: &str, template: &str, options: Options) -> Result<String, CompileError> {
    // Check the template first so a bad one is reported even for
    // programs that would also fail to parse.
    let template = Template::new(template.to_owned())?;
    let forms = parse(source, options)?;
    let sections = generate(&forms);
    Ok(template.fill(&sections.code, &sections.subroutines))
}
