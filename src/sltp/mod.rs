//! Lossless codec for Lua table literals.
//!
//! [`decode`] turns text into an ordered [`LuaTable`] plus a [`Qualifier`]: a side channel
//! recording everything the tree does not (whitespace, comments, key spelling, number and
//! string literal text, separators). [`encode`] walks the tree and reuses that formatting
//! wherever the tree still holds the decoded value, so `encode(decode(t)) == t` for any
//! accepted `t`. New or changed values are written in a canonical style that re-decodes to
//! the same tree.
//!
//! Accepted grammar:
//!
//! ```text
//! document := trivia [ name trivia "=" trivia ] table trivia
//! table    := "{" { trivia field trivia ( "," | ";" ) } [ trivia field trivia ] trivia "}"
//! field    := "[" trivia ( string | integer ) trivia "]" trivia "=" trivia value
//!           | name trivia "=" trivia value
//!           | value
//! value    := "nil" | "true" | "false" | number | string | table
//! trivia   := { whitespace | "--" comment-to-end-of-line }
//! ```

mod parse;
mod write;

use crate::value::{LuaKey, LuaTable, LuaValue};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Decode a Lua table literal document.
///
/// ```
/// use mizkit::sltp;
///
/// let text = "{a=1, b={1,2,3}, c=\"x\"}";
/// let (tree, qualifier) = sltp::decode(text).unwrap();
/// assert_eq!(tree.len(), 3);
/// assert_eq!(sltp::encode(&tree, &qualifier).unwrap(), text);
/// ```
pub fn decode(text: &str) -> Result<(LuaTable, Qualifier), ParseError> {
    parse::Parser::new(text).document()
}

/// Encode a tree, reusing the formatting captured in `qualifier` where it still applies.
pub fn encode(tree: &LuaTable, qualifier: &Qualifier) -> Result<String, EncodeError> {
    write::Writer::new().document(tree, qualifier)
}

/// Formatting side channel for one decoded document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Qualifier {
    lead: String,
    assignment: Option<Assignment>,
    root: Option<TableFormat>,
    trail: String,
}

impl Qualifier {
    /// Qualifier for a new bare table document, written canonically.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Qualifier for a new `name = { ... }` document, written canonically.
    pub fn named(name: &str) -> Self {
        Self {
            lead: String::new(),
            assignment: Some(Assignment {
                name: name.to_string(),
                pre_eq: " ".to_string(),
                post_eq: " \n".to_string(),
            }),
            root: None,
            trail: "\n".to_string(),
        }
    }

    /// The name the root table is assigned to (`mission` in `mission = {...}`), if any.
    pub fn name(&self) -> Option<&str> {
        self.assignment.as_ref().map(|a| a.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Assignment {
    name: String,
    pre_eq: String,
    post_eq: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct TableFormat {
    entries: HashMap<LuaKey, EntryFormat>,
    /// Trivia between the last entry and the closing brace.
    tail: String,
}

#[derive(Debug, Clone, PartialEq)]
struct EntryFormat {
    lead: String,
    key: KeyStyle,
    value: ValueFormat,
    pre_sep: String,
    sep: Option<char>,
}

#[derive(Debug, Clone, PartialEq)]
enum KeyStyle {
    Positional,
    Bare { pre_eq: String, post_eq: String },
    /// `raw` is everything between the brackets, inner trivia included.
    Bracketed {
        raw: String,
        pre_eq: String,
        post_eq: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum ValueFormat {
    Scalar { raw: String, value: LuaValue },
    Table(TableFormat),
}

/// A syntax error, with the byte offset and 1-based line/column where it was detected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    offset: usize,
    line: usize,
    column: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    fn at(src: &str, offset: usize, kind: ParseErrorKind) -> Self {
        let before = &src[..offset.min(src.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
            + 1;
        Self {
            offset,
            line,
            column,
            kind,
        }
    }

    /// Byte offset into the decoded text.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("unexpected character {found:?}, expected {expected}")]
    UnexpectedChar { found: char, expected: &'static str },

    #[error("unterminated string")]
    UnterminatedString,

    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(String),

    #[error("invalid number literal `{0}`")]
    InvalidNumber(String),

    #[error("unsupported identifier `{0}`")]
    UnexpectedIdentifier(String),

    #[error("duplicate key {0}")]
    DuplicateKey(LuaKey),

    #[error("trailing input after the root table")]
    TrailingInput,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("cannot write non-finite number {value} at `{path}`")]
    NonFinite { path: String, value: f64 },
}

struct KeyPath<'a>(&'a [&'a LuaKey]);

impl fmt::Display for KeyPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            match key {
                LuaKey::Int(_) => write!(f, "{key}")?,
                LuaKey::Str(_) if i == 0 => write!(f, "{key}")?,
                LuaKey::Str(_) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ParseErrorKind, Qualifier, decode, encode};
    use crate::value::{KeyRef, LuaKey, LuaValue};
    use pretty_assertions::assert_eq;

    fn roundtrip(text: &str) {
        let (tree, qual) = decode(text).unwrap();
        assert_eq!(encode(&tree, &qual).unwrap(), text);
    }

    #[test]
    fn decodes_ordered_keys_and_positional_sequence() {
        let text = "{a=1, b={1,2,3}, c=\"x\"}";
        let (tree, _) = decode(text).unwrap();
        let keys: Vec<_> = tree.keys().cloned().collect();
        assert_eq!(keys, vec![LuaKey::from("a"), LuaKey::from("b"), LuaKey::from("c")]);

        let b = tree.get(&KeyRef::Str("b")).and_then(LuaValue::as_table).unwrap();
        let seq: Vec<_> = b.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(
            seq,
            vec![
                (LuaKey::Int(1), LuaValue::from(1_i64)),
                (LuaKey::Int(2), LuaValue::from(2_i64)),
                (LuaKey::Int(3), LuaValue::from(3_i64)),
            ]
        );
        roundtrip(text);
    }

    #[test]
    fn roundtrips_host_style_document() {
        roundtrip(
            "mission = \n{\n    [\"date\"] = \n    {\n        [\"Day\"] = 1,\n        [\"Year\"] = 2011,\n    }, -- end of [\"date\"]\n    [\"start_time\"] = 43200,\n    [\"ratio\"] = 0.011111111111111,\n} -- end of mission\n",
        );
    }

    #[test]
    fn roundtrips_whitespace_quotes_and_separators() {
        roundtrip("{ 'single' ; \"double\" , [ 'k' ]=  1.0 ; x = -2e+03 , [ -4 ] = nil, }");
        roundtrip("\r\n{\r\n\t[1] = true,\r\n\t[2] = false\r\n}\r\n");
        roundtrip("{}");
        roundtrip("{ }");
        roundtrip("{{{{}}}}");
    }

    #[test]
    fn deep_nesting_decodes_and_encodes() {
        let depth = 1000;
        let text = format!("{}{}", "{".repeat(depth), "}".repeat(depth));
        roundtrip(&text);

        let (tree, _) = decode(&text).unwrap();
        let mut levels = 1;
        let mut current = &tree;
        while let Some(inner) = current.get(&KeyRef::Int(1)).and_then(LuaValue::as_table) {
            current = inner;
            levels += 1;
        }
        assert_eq!(levels, depth);

        let canonical = encode(&tree, &Qualifier::bare()).unwrap();
        let (again, _) = decode(&canonical).unwrap();
        assert_eq!(encode(&again, &Qualifier::bare()).unwrap(), canonical);

        let err = decode(&"{".repeat(depth)).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedEof { .. }), "{err}");
    }

    #[test]
    fn roundtrips_escapes_verbatim() {
        let text = "{ [\"s\"] = \"a \\\"b\\\" 'c'\\\nnext\\tline\\065\\x41\" }";
        roundtrip(text);
        let (tree, _) = decode(text).unwrap();
        assert_eq!(
            tree.get(&KeyRef::Str("s")).and_then(LuaValue::as_str),
            Some("a \"b\" 'c'\nnext\tlineAA")
        );
    }

    #[test]
    fn integer_and_float_literals_stay_distinct() {
        let (tree, qual) = decode("{1, 1.0, 1e0, 0x10}").unwrap();
        assert_eq!(tree.get(&KeyRef::Int(1)), Some(&LuaValue::from(1_i64)));
        assert_eq!(tree.get(&KeyRef::Int(2)), Some(&LuaValue::from(1.0_f64)));
        assert_eq!(tree.get(&KeyRef::Int(3)), Some(&LuaValue::from(1.0_f64)));
        assert_eq!(tree.get(&KeyRef::Int(4)), Some(&LuaValue::from(16_i64)));
        assert_eq!(encode(&tree, &qual).unwrap(), "{1, 1.0, 1e0, 0x10}");
    }

    #[test]
    fn mixed_keys_keep_first_appearance_order() {
        let (tree, _) = decode("{ \"a\", x = 1, \"b\", [10] = 2 }").unwrap();
        let keys: Vec<_> = tree.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![LuaKey::Int(1), LuaKey::from("x"), LuaKey::Int(2), LuaKey::Int(10)]
        );
    }

    #[test]
    fn mutated_values_are_written_canonically() {
        let text = "{\n    [\"a\"] = 1,\n    [\"b\"] = \"x\"\n}";
        let (mut tree, qual) = decode(text).unwrap();
        *tree.get_mut(&KeyRef::Str("a")).unwrap() = LuaValue::from(2.5_f64);
        tree.insert(LuaKey::from("c"), LuaValue::from("line\nbreak"));

        let out = encode(&tree, &qual).unwrap();
        assert_eq!(
            out,
            "{\n    [\"a\"] = 2.5,\n    [\"b\"] = \"x\",\n    [\"c\"] = \"line\\\nbreak\",\n}"
        );
        let (again, _) = decode(&out).unwrap();
        assert_eq!(again, tree);
    }

    #[test]
    fn removed_positional_entries_fall_back_to_brackets() {
        let (mut tree, qual) = decode("{10, 20, 30}").unwrap();
        tree.shift_remove(&KeyRef::Int(1));
        let out = encode(&tree, &qual).unwrap();
        let (again, _) = decode(&out).unwrap();
        assert_eq!(again, tree);
    }

    #[test]
    fn named_qualifier_writes_assignment() {
        let (tree, _) = decode("{a = 1}").unwrap();
        let out = encode(&tree, &Qualifier::named("dictionary")).unwrap();
        assert_eq!(out, "dictionary = \n{\n    [\"a\"] = 1,\n}\n");
        let (again, qual) = decode(&out).unwrap();
        assert_eq!(again, tree);
        assert_eq!(qual.name(), Some("dictionary"));
    }

    #[test]
    fn non_finite_floats_are_refused() {
        let mut tree = crate::value::LuaTable::new();
        tree.insert(LuaKey::from("x"), LuaValue::from(f64::INFINITY));
        assert!(encode(&tree, &Qualifier::bare()).is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        let cases: &[(&str, fn(&ParseErrorKind) -> bool)] = &[
            ("{a = 1", |k| matches!(k, ParseErrorKind::UnexpectedEof { .. })),
            ("{a = 1}}", |k| matches!(k, ParseErrorKind::TrailingInput)),
            ("{a = \"x}", |k| matches!(k, ParseErrorKind::UnterminatedString)),
            ("{a = 1.2.3}", |k| matches!(k, ParseErrorKind::InvalidNumber(_))),
            ("{a = 1e}", |k| matches!(k, ParseErrorKind::InvalidNumber(_))),
            ("{a = 12abc}", |k| matches!(k, ParseErrorKind::InvalidNumber(_))),
            ("{a = foo}", |k| matches!(k, ParseErrorKind::UnexpectedIdentifier(_))),
            ("{a = 1, a = 2}", |k| matches!(k, ParseErrorKind::DuplicateKey(_))),
            ("{\"x\", [1] = 2}", |k| matches!(k, ParseErrorKind::DuplicateKey(_))),
            ("{[1.5] = 2}", |k| matches!(k, ParseErrorKind::InvalidNumber(_))),
            ("{a = \"\\q\"}", |k| matches!(k, ParseErrorKind::InvalidEscape(_))),
            ("{a = 1 b = 2}", |k| matches!(k, ParseErrorKind::UnexpectedChar { .. })),
            ("", |k| matches!(k, ParseErrorKind::UnexpectedEof { .. })),
        ];
        for (text, check) in cases {
            let err = decode(text).unwrap_err();
            assert!(check(err.kind()), "{text:?} gave {err}");
        }
    }

    #[test]
    fn parse_error_reports_line_and_column() {
        let err = decode("{\n  a = 1,\n  b = ?\n}").unwrap_err();
        assert_eq!(err.line(), 3);
        assert_eq!(err.column(), 7);
        assert_eq!(err.offset(), 17);
    }
}
