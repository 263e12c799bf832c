//! Named-reference scanning
//!
//! A named reference is a full bracketed span, `[Column Name]`. The name is
//! everything between the brackets and may contain spaces, dots, percent
//! signs and parentheses, but not another bracket. A `[` without a closing
//! `]` is plain text.

use lazy_regex::regex;

/// A piece of a named-reference expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any reference, passed through as-is
    Text(&'a str),
    /// A reference, holding the name without its brackets
    Reference(&'a str),
}

/// Split an expression into text and references, in order
///
/// # Example
/// ```rust
/// use weighbill_formula::{segments, Segment};
///
/// let parts = segments("=[Bags] * 0.02");
/// assert_eq!(parts, vec![
///     Segment::Text("="),
///     Segment::Reference("Bags"),
///     Segment::Text(" * 0.02"),
/// ]);
/// ```
pub fn segments(expression: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;

    for m in regex!(r"\[[^\[\]]+\]").find_iter(expression) {
        if m.start() > last {
            out.push(Segment::Text(&expression[last..m.start()]));
        }
        // Brackets are single-byte, so trimming one byte on each side is safe
        out.push(Segment::Reference(&expression[m.start() + 1..m.end() - 1]));
        last = m.end();
    }
    if last < expression.len() {
        out.push(Segment::Text(&expression[last..]));
    }

    out
}

/// Names referenced by an expression, in order of appearance (with repeats)
pub fn references(expression: &str) -> impl Iterator<Item = &str> {
    segments(expression).into_iter().filter_map(|s| match s {
        Segment::Reference(name) => Some(name),
        Segment::Text(_) => None,
    })
}

/// The expression with references and string-literal contents blanked out
///
/// What remains is the operator, function and number text, with every
/// reference replaced by a single space. Used by the lint to look at the
/// expression's structure without tripping over names like `Moist(%)`.
pub(crate) fn code_text(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut in_string = false;

    for segment in segments(expression) {
        match segment {
            Segment::Reference(_) => out.push(' '),
            Segment::Text(text) => {
                for c in text.chars() {
                    if c == '"' {
                        in_string = !in_string;
                        out.push('"');
                    } else if in_string {
                        out.push(' ');
                    } else {
                        out.push(c);
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_with_punctuation() {
        let names: Vec<_> =
            references("=[Kanda Wt with Bardana(Qtl)] - [Moist(%)] * [Bill No.]").collect();
        assert_eq!(names, vec!["Kanda Wt with Bardana(Qtl)", "Moist(%)", "Bill No."]);
    }

    #[test]
    fn test_unterminated_bracket_is_text() {
        assert_eq!(
            segments("=[Bags] + [Oops"),
            vec![
                Segment::Text("="),
                Segment::Reference("Bags"),
                Segment::Text(" + [Oops"),
            ]
        );
    }

    #[test]
    fn test_nested_bracket_takes_inner_span() {
        assert_eq!(
            segments("[[Bags]]"),
            vec![
                Segment::Text("["),
                Segment::Reference("Bags"),
                Segment::Text("]"),
            ]
        );
        assert_eq!(segments("[]"), vec![Segment::Text("[]")]);
    }

    #[test]
    fn test_code_text_blanks_references_and_strings() {
        assert_eq!(code_text(r#"=IF([Moist(%)]>1,"a(b",0)"#), r#"=IF( >1,"   ",0)"#);
    }
}
