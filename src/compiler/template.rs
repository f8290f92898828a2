//! Splices generated code into an assembly template.
//!
//! The template is ordinary assembly source holding two markers: `;cd`
//! where the entry code goes and `;sr` where the subroutines go. Both are
//! assembler comments, so an unfilled template still assembles.
use thiserror::Error;

pub const CODE_MARKER: &str = ";cd";
pub const SUBROUTINE_MARKER: &str = ";sr";

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum TemplateError {
    #[error("template has no `{0}` marker")]
    MissingMarker(&'static str),

    #[error("template has more than one `{0}` marker")]
    RepeatedMarker(&'static str),
}

pub struct Template {
    text: String,
    code: usize,
    subroutines: usize,
}

impl Template {
    /// Checks that each marker appears exactly once and remembers where.
    pub fn new(text: String) -> Result<Self, TemplateError> {
        let code = find_once(&text, CODE_MARKER)?;
        let subroutines = find_once(&text, SUBROUTINE_MARKER)?;
        Ok(Template { text, code, subroutines })
    }

    /// Replaces both markers. Marker positions come from the template
    /// alone, so markers inside the generated text are left alone.
    pub fn fill(&self, code: &str, subroutines: &str) -> String {
        let mut splices = [
            (self.code, CODE_MARKER.len(), code),
            (self.subroutines, SUBROUTINE_MARKER.len(), subroutines),
        ];
        splices.sort_by_key(|&(at, _, _)| at);

        let mut out = String::with_capacity(self.text.len() + code.len() + subroutines.len());
        let mut cursor = 0;
        for &(at, len, replacement) in splices.iter() {
            out.push_str(&self.text[cursor..at]);
            out.push_str(replacement);
            cursor = at + len;
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

fn find_once(text: &str, marker: &'static str) -> Result<usize, TemplateError> {
    let mut found = text.match_indices(marker).map(|(at, _)| at);
    match (found.next(), found.next()) {
        (Some(at), None) => Ok(at),
        (None, _) => Err(TemplateError::MissingMarker(marker)),
        (Some(_), Some(_)) => Err(TemplateError::RepeatedMarker(marker)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill() {
        let t = Template::new("start:\n;cd\n\tBRK\n;sr\n".to_owned()).unwrap();
        assert_eq!(t.fill("\tjsr a\n", "a:\n\tRTS\n"), "start:\n\tjsr a\n\n\tBRK\na:\n\tRTS\n\n");
    }

    #[test]
    fn test_marker_order() {
        let t = Template::new(";sr|;cd".to_owned()).unwrap();
        assert_eq!(t.fill("CODE", "SUBS"), "SUBS|CODE");
    }

    #[test]
    fn test_generated_markers_untouched() {
        let t = Template::new(";cd ;sr".to_owned()).unwrap();
        assert_eq!(t.fill("\t;sr\n", ""), "\t;sr\n ");
    }

    #[test]
    fn test_empty_sections() {
        let t = Template::new("a;cdb;src".to_owned()).unwrap();
        assert_eq!(t.fill("", ""), "abc");
    }

    #[test]
    fn test_bad_templates() {
        assert_eq!(Template::new(";sr".to_owned()).err(), Some(TemplateError::MissingMarker(CODE_MARKER)));
        assert_eq!(Template::new(";cd".to_owned()).err(), Some(TemplateError::MissingMarker(SUBROUTINE_MARKER)));
        assert_eq!(Template::new(";cd;cd;sr".to_owned()).err(), Some(TemplateError::RepeatedMarker(CODE_MARKER)));
        assert_eq!(Template::new(";cd;sr;sr".to_owned()).err(), Some(TemplateError::RepeatedMarker(SUBROUTINE_MARKER)));
    }
}
