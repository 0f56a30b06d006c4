// Result shape flags and classification by leading query keyword.
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Shape(u8);

impl Shape {
    pub const UNKNOWN: Shape = Shape(0);
    pub const BINDINGS: Shape = Shape(1);
    pub const BOOLEAN: Shape = Shape(1 << 1);
    pub const GRAPH: Shape = Shape(1 << 2);
    pub const SYNTAX: Shape = Shape(1 << 3);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Shape) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Shape {
    type Output = Shape;

    fn bitor(self, rhs: Shape) -> Shape {
        Shape(self.0 | rhs.0)
    }
}

impl BitOrAssign for Shape {
    fn bitor_assign(&mut self, rhs: Shape) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("unknown");
        }
        let names = [
            (Shape::BINDINGS, "bindings"),
            (Shape::BOOLEAN, "boolean"),
            (Shape::GRAPH, "graph"),
            (Shape::SYNTAX, "syntax"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

const KEYWORDS: [(&str, Shape); 4] = [
    ("SELECT", Shape::BINDINGS),
    ("ASK", Shape::BOOLEAN),
    ("CONSTRUCT", Shape(Shape::GRAPH.0 | Shape::BINDINGS.0)),
    ("DESCRIBE", Shape(Shape::GRAPH.0 | Shape::BINDINGS.0)),
];

/// Shape implied by the first keyword of `text`, or `UNKNOWN` when the text
/// does not start with a known query form.
pub fn classify(text: &str) -> Shape {
    KEYWORDS
        .iter()
        .filter(|(keyword, _)| expect_keyword(keyword, text).is_some())
        .max_by_key(|(keyword, _)| keyword.len())
        .map(|(_, shape)| *shape)
        .unwrap_or(Shape::UNKNOWN)
}

/// Matches `keyword` case-insensitively after leading whitespace. The keyword
/// must be followed by whitespace or the end of text; returns the remainder
/// with that whitespace skipped.
fn expect_keyword<'t>(keyword: &str, text: &'t str) -> Option<&'t str> {
    let source = text.trim_start();
    let head = source.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &source[keyword.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}
